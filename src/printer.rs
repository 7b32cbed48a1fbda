// ABOUTME: Pretty-printer producing the verbose-mode AST dump

use crate::ast::{Func, Node};

/// Walks a `Node` tree back into source form, two-space indenting the bodies
/// of `if`/`while`/`func`/`map` the way the original language's `Printer`
/// visitor does. Semantically trivial (spec.md), but its indentation scheme
/// is carried over exactly since `--verbose` output is meant to read like
/// the source it came from.
#[derive(Default)]
pub struct Printer {
    indent: String,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn print(&mut self, node: &Node) -> String {
        match node {
            Node::Int(n) => n.to_string(),
            Node::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
            Node::Str(s) => format!("\"{s}\""),
            Node::Nil => "nil".to_string(),
            Node::Var(name) => name.clone(),

            Node::Let(name, expr) => format!("(let {name} {})", self.print(expr)),
            Node::Mut(name, expr) => format!("(mut {name} {})", self.print(expr)),
            Node::Set(name, expr) => format!("(set {name} {})", self.print(expr)),

            Node::If(cond, first, second) => {
                let cond = self.print(cond);
                let outer = self.push_indent();
                let tbranch = self.print(first);
                let fbranch = self.print(second);
                self.pop_indent(outer.clone());
                format!("(if {cond}\n{outer}  {tbranch}\n{outer}  {fbranch}\n{outer})")
            }
            Node::While(cond, body) => {
                let cond = self.print(cond);
                let outer = self.push_indent();
                let body = self.print(body);
                self.pop_indent(outer.clone());
                format!("(while {cond}\n{outer}  {body}\n{outer})")
            }
            Node::Seq(items) => items
                .iter()
                .map(|n| self.print(n))
                .collect::<Vec<_>>()
                .join(&format!(";\n{}", self.indent)),

            Node::Not(arg) => format!("!{}", self.print(arg)),
            Node::Head(arg) => format!("(head {})", self.print(arg)),
            Node::Tail(arg) => format!("(tail {})", self.print(arg)),
            Node::Print(arg) => format!("(print {})", self.print(arg)),

            Node::Add(a, b) => self.binop("+", a, b),
            Node::Sub(a, b) => self.binop("-", a, b),
            Node::Mul(a, b) => self.binop("*", a, b),
            Node::Div(a, b) => self.binop("/", a, b),
            Node::And(a, b) => self.binop("&&", a, b),
            Node::Or(a, b) => self.binop("||", a, b),
            Node::Eq(a, b) => self.binop("==", a, b),
            Node::NotEq(a, b) => self.binop("!=", a, b),
            Node::Lt(a, b) => self.binop("<", a, b),
            Node::Lte(a, b) => self.binop("<=", a, b),
            Node::Gt(a, b) => self.binop(">", a, b),
            Node::Gte(a, b) => self.binop(">=", a, b),

            Node::List(items) => {
                let elements = items
                    .iter()
                    .map(|n| self.print(n))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("[{elements}]")
            }
            Node::Map(pairs) => {
                if pairs.is_empty() {
                    return "{}".to_string();
                }
                let outer = self.push_indent();
                let mappings: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("{}:{}", self.print(k), self.print(v)))
                    .collect();
                let joined = mappings.join(&format!("\n{}", self.indent));
                self.pop_indent(outer.clone());
                format!("{{\n{outer}  {joined}\n{outer}}}")
            }
            Node::Push(head, tail) => format!("(push {} {})", self.print(head), self.print(tail)),
            Node::Get(a, k) => format!("(get {} {})", self.print(a), self.print(k)),
            Node::Put(a, k, v) => {
                format!("(put {} {} {})", self.print(a), self.print(k), self.print(v))
            }

            Node::Func(func) => self.print_func(func),
            Node::Call(callee, args) => {
                let args = if args.is_empty() {
                    String::new()
                } else {
                    format!(
                        " {}",
                        args.iter()
                            .map(|a| self.print(a))
                            .collect::<Vec<_>>()
                            .join(" ")
                    )
                };
                format!("(call {}{args})", self.print(callee))
            }
        }
    }

    fn binop(&mut self, op: &str, a: &Node, b: &Node) -> String {
        format!("({op} {} {})", self.print(a), self.print(b))
    }

    fn print_func(&mut self, func: &Func) -> String {
        let params = if func.params.is_empty() {
            String::new()
        } else {
            format!(" {}", func.params.join(" "))
        };
        let outer = self.push_indent();
        let body = self.print(&func.body);
        self.pop_indent(outer.clone());
        format!("(func {}{params}:\n{outer}  {body}\n{outer})", func.name)
    }

    fn push_indent(&mut self) -> String {
        let outer = self.indent.clone();
        self.indent = format!("{outer}  ");
        outer
    }

    fn pop_indent(&mut self, outer: String) {
        self.indent = outer;
    }
}

/// Convenience entry point for a one-off print, used by the `--verbose` driver path.
pub fn print_node(node: &Node) -> String {
    Printer::new().print(node)
}
