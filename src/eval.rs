// ABOUTME: Tree-walking evaluator: walks the AST against an explicit call stack of frames

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::ast::{self, Node};
use crate::env::{Binding, DeclKind, Environment, Frame, Scope};
use crate::error::EvalError;
use crate::value::{Closure, Value};

/// Walks an AST against an explicit call stack. The bottom frame
/// (`func: None`) is never popped — it's the top-level scope a script runs
/// in.
pub struct Evaluator {
    stack: Vec<Frame>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator {
            stack: vec![Frame::root()],
        }
    }

    fn current_frame(&self) -> &Frame {
        self.stack.last().expect("stack must never be empty")
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        self.stack.last_mut().expect("stack must never be empty")
    }

    fn read(&self, name: &str) -> Option<&Binding> {
        self.current_frame().read(name)
    }

    fn write(&mut self, name: &str, binding: Binding) -> Result<(), EvalError> {
        self.current_frame_mut().write(name, binding)
    }

    pub fn eval(&mut self, node: &Node) -> Result<Value, EvalError> {
        match node {
            Node::Int(n) => Ok(Value::Int(*n)),
            Node::Bool(b) => Ok(Value::Bool(*b)),
            Node::Str(s) => Ok(Value::Str(unescape_str(s)?)),
            Node::Nil => Ok(Value::Nil),

            Node::Var(name) => self.eval_var(name),
            Node::Let(name, expr) => self.eval_let(name, expr),
            Node::Mut(name, expr) => self.eval_mut(name, expr),
            Node::Set(name, expr) => self.eval_set(name, expr),

            Node::If(cond, then, otherwise) => {
                if as_bool(&self.eval(cond)?, "if")? {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Node::While(cond, body) => {
                let mut out = Value::Bool(false);
                while as_bool(&self.eval(cond)?, "while")? {
                    out = self.eval(body)?;
                }
                Ok(out)
            }
            Node::Seq(parts) => {
                let mut out = Value::Nil;
                for part in parts {
                    out = self.eval(part)?;
                }
                Ok(out)
            }

            Node::Not(arg) => {
                let v = self.eval(arg)?;
                Ok(Value::Bool(!as_bool(&v, "!")?))
            }
            Node::Head(arg) => self.eval_head(arg),
            Node::Tail(arg) => self.eval_tail(arg),
            Node::Print(arg) => {
                let v = self.eval(arg)?;
                println!("{v}");
                Ok(Value::Nil)
            }

            Node::Add(a, b) => self.eval_int_binop(a, b, "+", |x, y| Ok(x + y)),
            Node::Sub(a, b) => self.eval_int_binop(a, b, "-", |x, y| Ok(x - y)),
            Node::Mul(a, b) => self.eval_int_binop(a, b, "*", |x, y| Ok(x * y)),
            Node::Div(a, b) => self.eval_int_binop(a, b, "/", |x, y| {
                if y == 0 {
                    Err(EvalError::TypeError {
                        context: "/".to_string(),
                        expected: "non-zero divisor".to_string(),
                        actual: "0".to_string(),
                    })
                } else {
                    Ok(x / y)
                }
            }),
            Node::Lt(a, b) => self.eval_int_cmp(a, b, "<", |x, y| x < y),
            Node::Lte(a, b) => self.eval_int_cmp(a, b, "<=", |x, y| x <= y),
            Node::Gt(a, b) => self.eval_int_cmp(a, b, ">", |x, y| x > y),
            Node::Gte(a, b) => self.eval_int_cmp(a, b, ">=", |x, y| x >= y),
            Node::Eq(a, b) => {
                let (va, vb) = (self.eval(a)?, self.eval(b)?);
                Ok(Value::Bool(va == vb))
            }
            Node::NotEq(a, b) => {
                let (va, vb) = (self.eval(a)?, self.eval(b)?);
                Ok(Value::Bool(va != vb))
            }
            Node::And(a, b) => {
                // Both operands always evaluated: this language's And/Or are
                // not short-circuit.
                let (va, vb) = (self.eval(a)?, self.eval(b)?);
                Ok(Value::Bool(as_bool(&va, "&&")? && as_bool(&vb, "&&")?))
            }
            Node::Or(a, b) => {
                let (va, vb) = (self.eval(a)?, self.eval(b)?);
                Ok(Value::Bool(as_bool(&va, "||")? || as_bool(&vb, "||")?))
            }

            Node::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval(item)?);
                }
                Ok(Value::List(out))
            }
            Node::Map(pairs) => self.eval_map(pairs),
            Node::Push(head, tail) => self.eval_push(head, tail),
            Node::Get(container, key) => self.eval_get(container, key),
            Node::Put(container, key, value) => self.eval_put(container, key, value),

            Node::Func(func) => self.eval_func(func),
            Node::Call(callee, args) => self.eval_call(callee, args),
        }
    }

    fn eval_var(&self, name: &str) -> Result<Value, EvalError> {
        match self.read(name) {
            Some(binding) => Ok(binding.value.clone()),
            None => Err(EvalError::NameError(name.to_string())),
        }
    }

    fn eval_let(&mut self, name: &str, expr: &Node) -> Result<Value, EvalError> {
        let val = self.eval(expr)?;
        self.write(name, Binding::new(Scope::Local, DeclKind::Let, val.clone()))?;
        Ok(val)
    }

    fn eval_mut(&mut self, name: &str, expr: &Node) -> Result<Value, EvalError> {
        let val = self.eval(expr)?;
        self.write(name, Binding::new(Scope::Local, DeclKind::Mut, val.clone()))?;
        Ok(val)
    }

    /// `set` rebinds an existing name in place and, when the binding it just
    /// rebound is `Inherited`, propagates the new value up the dynamic call
    /// stack as long as each ancestor frame's running closure is the
    /// lexical parent of the one below it.
    fn eval_set(&mut self, name: &str, expr: &Node) -> Result<Value, EvalError> {
        let scope = match self.read(name) {
            Some(binding) => binding.scope,
            None => return Err(EvalError::NameError(name.to_string())),
        };
        let val = self.eval(expr)?;
        self.write(name, Binding::new(scope, DeclKind::None, val.clone()))?;

        if scope != Scope::Inherited {
            return Ok(val);
        }

        let mut func = self.current_frame().func.clone();
        let mut idx = self.stack.len().checked_sub(2);
        let mut propagating_scope = scope;

        while propagating_scope == Scope::Inherited {
            let (Some(f), Some(i)) = (func.as_ref(), idx) else {
                break;
            };
            let ancestor_func = self.stack[i].func.clone();
            if !closures_match(&f.lexical_parent, &ancestor_func) {
                break;
            }
            let next_lexical_parent = f.lexical_parent.clone();
            let ancestor_binding = match self.stack[i].env.get_mut(name) {
                Some(b) => b,
                None => break,
            };
            ancestor_binding.value = val.clone();
            propagating_scope = ancestor_binding.scope;
            func = next_lexical_parent;
            idx = i.checked_sub(1);
        }

        Ok(val)
    }

    fn eval_head(&mut self, arg: &Node) -> Result<Value, EvalError> {
        let list = as_list(&self.eval(arg)?, "head")?;
        list.first()
            .cloned()
            .ok_or_else(|| EvalError::KeyError("head of empty list".to_string()))
    }

    fn eval_tail(&mut self, arg: &Node) -> Result<Value, EvalError> {
        let list = as_list(&self.eval(arg)?, "tail")?;
        if list.is_empty() {
            return Err(EvalError::KeyError("tail of empty list".to_string()));
        }
        Ok(Value::List(list[1..].to_vec()))
    }

    fn eval_push(&mut self, head: &Node, tail: &Node) -> Result<Value, EvalError> {
        let head_val = self.eval(head)?;
        let tail_list = as_list(&self.eval(tail)?, "push")?;
        let mut out = Vec::with_capacity(tail_list.len() + 1);
        out.push(head_val);
        out.extend(tail_list);
        Ok(Value::List(out))
    }

    fn eval_map(&mut self, pairs: &[(Node, Node)]) -> Result<Value, EvalError> {
        let mut map = BTreeMap::new();
        for (k, v) in pairs {
            let key_val = self.eval(k)?;
            let key = key_val
                .as_map_key()
                .ok_or_else(|| EvalError::type_error("map key", "Int, Bool, or Str", &key_val))?;
            let value = self.eval(v)?;
            // Leftmost occurrence of a duplicate key wins.
            map.entry(key).or_insert(value);
        }
        Ok(Value::Map(Rc::new(RefCell::new(map))))
    }

    fn eval_get(&mut self, container: &Node, key: &Node) -> Result<Value, EvalError> {
        let container_val = self.eval(container)?;
        let map = as_map(&container_val, "get")?;
        let key_val = self.eval(key)?;
        let key = key_val
            .as_map_key()
            .ok_or_else(|| EvalError::type_error("map key", "Int, Bool, or Str", &key_val))?;
        map.borrow()
            .get(&key)
            .cloned()
            .ok_or_else(|| EvalError::KeyError(format!("key not found: {key}")))
    }

    fn eval_put(&mut self, container: &Node, key: &Node, value: &Node) -> Result<Value, EvalError> {
        let container_val = self.eval(container)?;
        let map = as_map(&container_val, "put")?;
        let key_val = self.eval(key)?;
        let key = key_val
            .as_map_key()
            .ok_or_else(|| EvalError::type_error("map key", "Int, Bool, or Str", &key_val))?;
        let value = self.eval(value)?;
        map.borrow_mut().insert(key, value);
        Ok(container_val)
    }

    /// Building a closure snapshots the current frame's bindings, re-tagged
    /// `Inherited`, and also writes the closure's own name into the
    /// *defining* frame so the function can be referenced (and call itself
    /// recursively) by name.
    fn eval_func(&mut self, func: &ast::Func) -> Result<Value, EvalError> {
        let lexical_parent = self.current_frame().func.clone();
        let mut env = Environment::new();
        for (name, binding) in self.current_frame().env.iter() {
            env.insert(
                name.clone(),
                Binding::new(Scope::Inherited, binding.decl, binding.value.clone()),
            );
        }

        // The closure needs to exist before it can bind its own name inside
        // its captured env, so build it once, then rebuild with the
        // self-binding added.
        let closure = Rc::new(Closure {
            name: func.name.clone(),
            params: func.params.clone(),
            body: (*func.body).clone(),
            lexical_parent,
            env,
        });
        let closure = self_bind(closure);

        let self_binding = Binding::new(
            Scope::Inherited,
            DeclKind::Let,
            Value::Closure(closure.clone()),
        );
        self.write(&func.name, self_binding)?;
        Ok(Value::Closure(closure))
    }

    fn eval_call(&mut self, callee: &Node, args: &[Node]) -> Result<Value, EvalError> {
        let callee_val = self.eval(callee)?;
        let closure = match &callee_val {
            Value::Closure(c) => c.clone(),
            other => {
                return Err(EvalError::type_error("call", "Closure", other));
            }
        };

        if closure.params.len() < args.len() {
            return Err(EvalError::ArityError {
                expected: closure.params.len(),
                actual: args.len(),
            });
        }

        let mut arg_vals = Vec::with_capacity(args.len());
        for a in args {
            arg_vals.push(self.eval(a)?);
        }

        if closure.params.len() == args.len() {
            let mut env = Environment::new();
            for (name, binding) in closure.env.iter() {
                let mut b = binding.clone();
                b.is_self = false;
                env.insert(name.clone(), b);
            }
            for (name, val) in closure.params.iter().zip(arg_vals.into_iter()) {
                env.insert(name.clone(), Binding::new(Scope::Param, DeclKind::Let, val));
            }
            let mut self_binding = Binding::new(
                Scope::Inherited,
                DeclKind::Let,
                Value::Closure(closure.clone()),
            );
            self_binding.is_self = true;
            env.insert(closure.name.clone(), self_binding);

            self.stack.push(Frame::new(Some(closure.clone()), env));
            let result = self.eval(&closure.body);
            self.stack.pop();
            result
        } else {
            let remaining_params = closure.params[args.len()..].to_vec();
            let mut env = Environment::new();
            for (name, binding) in closure.env.iter() {
                let mut b = binding.clone();
                b.is_self = false;
                env.insert(name.clone(), b);
            }
            for (name, val) in closure.params.iter().zip(arg_vals.into_iter()) {
                env.insert(name.clone(), Binding::new(Scope::Param, DeclKind::Let, val));
            }
            let partial = Rc::new(Closure {
                name: closure.name.clone(),
                params: remaining_params,
                body: closure.body.clone(),
                lexical_parent: closure.lexical_parent.clone(),
                env,
            });
            Ok(Value::Closure(partial))
        }
    }
}

/// Rebuilds `closure` with its own self-binding inserted into its captured
/// env, working around the chicken-and-egg problem of a closure needing to
/// reference itself.
fn self_bind(closure: Rc<Closure>) -> Rc<Closure> {
    let mut env = closure.env.clone();
    env.insert(
        closure.name.clone(),
        Binding::new(Scope::Inherited, DeclKind::Let, Value::Closure(closure.clone())),
    );
    Rc::new(Closure {
        name: closure.name.clone(),
        params: closure.params.clone(),
        body: closure.body.clone(),
        lexical_parent: closure.lexical_parent.clone(),
        env,
    })
}

fn closures_match(a: &Option<Rc<Closure>>, b: &Option<Rc<Closure>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

fn as_bool(v: &Value, context: &str) -> Result<bool, EvalError> {
    match v {
        Value::Bool(b) => Ok(*b),
        other => Err(EvalError::type_error(context, "Bool", other)),
    }
}

fn as_list(v: &Value, context: &str) -> Result<Vec<Value>, EvalError> {
    match v {
        Value::List(items) => Ok(items.clone()),
        other => Err(EvalError::type_error(context, "List", other)),
    }
}

fn as_map(
    v: &Value,
    context: &str,
) -> Result<Rc<RefCell<BTreeMap<crate::value::MapKey, Value>>>, EvalError> {
    match v {
        Value::Map(m) => Ok(m.clone()),
        other => Err(EvalError::type_error(context, "Map", other)),
    }
}

impl Evaluator {
    fn eval_int_binop(
        &mut self,
        a: &Node,
        b: &Node,
        context: &str,
        f: impl FnOnce(i64, i64) -> Result<i64, EvalError>,
    ) -> Result<Value, EvalError> {
        let va = self.eval(a)?;
        let vb = self.eval(b)?;
        let x = as_int(&va, context)?;
        let y = as_int(&vb, context)?;
        Ok(Value::Int(f(x, y)?))
    }

    fn eval_int_cmp(
        &mut self,
        a: &Node,
        b: &Node,
        context: &str,
        f: impl FnOnce(i64, i64) -> bool,
    ) -> Result<Value, EvalError> {
        let va = self.eval(a)?;
        let vb = self.eval(b)?;
        let x = as_int(&va, context)?;
        let y = as_int(&vb, context)?;
        Ok(Value::Bool(f(x, y)))
    }
}

fn as_int(v: &Value, context: &str) -> Result<i64, EvalError> {
    match v {
        Value::Int(n) => Ok(*n),
        other => Err(EvalError::type_error(context, "Int", other)),
    }
}

/// Unescapes the backslash sequences a string literal's raw payload may
/// carry (the lexer preserves them verbatim). Mirrors the handful of
/// escapes a JSON string allows, since that's what the language's string
/// literal grammar borrows from.
fn unescape_str(raw: &str) -> Result<String, EvalError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some(other) => {
                return Err(EvalError::TypeError {
                    context: "string literal".to_string(),
                    expected: "valid escape sequence".to_string(),
                    actual: format!("\\{other}"),
                })
            }
            None => {
                return Err(EvalError::TypeError {
                    context: "string literal".to_string(),
                    expected: "valid escape sequence".to_string(),
                    actual: "\\<eof>".to_string(),
                })
            }
        }
    }
    Ok(out)
}
