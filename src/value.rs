// ABOUTME: Runtime value types produced and consumed by the evaluator

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::ast;
use crate::env::Environment;

/// A map key, restricted to the literal-valued runtime types. Deriving `Ord`
/// gives map printing a stable, deterministic order across invocations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Int(n) => write!(f, "{n}"),
            MapKey::Bool(b) => write!(f, "{b}"),
            MapKey::Str(s) => write!(f, "{s}"),
        }
    }
}

/// A function value, built once by `Func` evaluation (or by partial
/// application of another `Closure`). `lexical_parent` is the closure that
/// was executing when this one was defined — it drives set-propagation, not
/// a name-lookup chain.
#[derive(Debug)]
pub struct Closure {
    pub name: String,
    pub params: Vec<String>,
    pub body: ast::Node,
    pub lexical_parent: Option<Rc<Closure>>,
    pub env: Environment,
}

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
    Nil,
    List(Vec<Value>),
    /// Genuinely shared and mutable: `Put` mutates through every alias,
    /// unlike `List`, where `push`/`head`/`tail` always return a fresh list.
    Map(Rc<RefCell<BTreeMap<MapKey, Value>>>),
    Closure(Rc<Closure>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Bool(_) => "Bool",
            Value::Str(_) => "Str",
            Value::Nil => "Nil",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Closure(_) => "Closure",
        }
    }

    /// Converts a literal-valued runtime value into a map key, if possible.
    pub fn as_map_key(&self) -> Option<MapKey> {
        match self {
            Value::Int(n) => Some(MapKey::Int(*n)),
            Value::Bool(b) => Some(MapKey::Bool(*b)),
            Value::Str(s) => Some(MapKey::Str(s.clone())),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render(self, ""))
    }
}

/// Renders a value the same way `printer::Printer` renders the AST it was
/// built from: space-separated list elements, two-space-indented map
/// entries, nested strings quoted. Runtime `List`/`Map` values aren't AST
/// nodes in this crate (see DESIGN.md's AST/runtime split), so this can't
/// just call into `printer::Printer` directly — it mirrors the same
/// indentation scheme independently, grounded in the same source
/// (`Printer.visit_list`/`visit_map`/`visit_str` in `simple_lang.py`).
fn render(value: &Value, indent: &str) -> String {
    match value {
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
        Value::Str(s) => s.clone(),
        Value::Nil => "nil".to_string(),
        Value::List(items) => {
            let elements = items
                .iter()
                .map(|v| render_nested(v, indent))
                .collect::<Vec<_>>()
                .join(" ");
            format!("[{elements}]")
        }
        Value::Map(map) => {
            let map = map.borrow();
            if map.is_empty() {
                return "{}".to_string();
            }
            let inner = format!("{indent}  ");
            let mappings: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}:{}", render_key(k), render_nested(v, &inner)))
                .collect();
            let joined = mappings.join(&format!("\n{inner}"));
            format!("{{\n{inner}{joined}\n{indent}}}")
        }
        Value::Closure(c) => format!("<func {}/{}>", c.name, c.params.len()),
    }
}

/// A value nested inside a list or map renders its strings quoted, matching
/// `Printer.visit_str`; only the outermost value prints a bare string.
fn render_nested(value: &Value, indent: &str) -> String {
    match value {
        Value::Str(s) => format!("\"{s}\""),
        other => render(other, indent),
    }
}

fn render_key(key: &MapKey) -> String {
    match key {
        MapKey::Str(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}
