// ABOUTME: Bindings, frames, and the flat-frame environment model the evaluator reads and writes

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::EvalError;
use crate::value::{Closure, Value};

/// Where a binding came from: a function's own parameter, a `let`/`mut`
/// declared in the current frame, or snapshotted from an enclosing lexical
/// scope at closure-construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Param,
    Local,
    Inherited,
}

/// How a binding was declared. `None` marks a binding produced by `set`,
/// which carries no declaration of its own — it just changes a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Let,
    Mut,
    None,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub scope: Scope,
    pub decl: DeclKind,
    /// True only for a closure's binding of its own name within the frame
    /// created to run its own body — blocks a function from rebinding itself
    /// mid-call.
    pub is_self: bool,
    pub value: Value,
}

impl Binding {
    pub fn new(scope: Scope, decl: DeclKind, value: Value) -> Self {
        Binding {
            scope,
            decl,
            is_self: false,
            value,
        }
    }
}

pub type Environment = HashMap<String, Binding>;

/// One activation on the evaluator's explicit call stack. `func` is the
/// closure whose body is executing in this frame, or `None` for the bottom
/// (top-level) frame.
#[derive(Debug)]
pub struct Frame {
    pub func: Option<Rc<Closure>>,
    pub env: Environment,
}

impl Frame {
    pub fn new(func: Option<Rc<Closure>>, env: Environment) -> Self {
        Frame { func, env }
    }

    pub fn root() -> Self {
        Frame::new(None, Environment::new())
    }

    /// Looks up `name` in this frame only — the flat-frame model never walks
    /// a parent chain. Closures make outer names visible by snapshotting
    /// them into their own `env` at construction time, tagged `Inherited`.
    pub fn read(&self, name: &str) -> Option<&Binding> {
        self.env.get(name)
    }

    /// Applies the mutability rules: whether `binding` may replace whatever
    /// is already bound to `name` in this frame.
    pub fn write(&mut self, name: &str, binding: Binding) -> Result<(), EvalError> {
        let current = match self.env.get(name) {
            None => {
                self.env.insert(name.to_string(), binding);
                return Ok(());
            }
            Some(b) => b,
        };

        match current.scope {
            Scope::Local => {
                if matches!(binding.decl, DeclKind::Let | DeclKind::Mut) {
                    return Err(EvalError::BindError(format!(
                        "re-declaration of {name} inside local scope"
                    )));
                }
                if current.decl == DeclKind::Let {
                    return Err(EvalError::BindError(format!(
                        "cannot rebind non-mutable {name}"
                    )));
                }
                self.env.insert(name.to_string(), binding);
                Ok(())
            }
            Scope::Inherited => {
                if current.is_self {
                    return Err(EvalError::BindError(format!(
                        "re-binding of current function {name}"
                    )));
                }
                if matches!(binding.decl, DeclKind::Let | DeclKind::Mut) {
                    self.env.insert(name.to_string(), binding);
                    return Ok(());
                }
                if current.decl == DeclKind::Let {
                    return Err(EvalError::BindError(format!(
                        "cannot rebind non-mutable {name}"
                    )));
                }
                self.env.insert(name.to_string(), binding);
                Ok(())
            }
            Scope::Param => {
                if matches!(binding.decl, DeclKind::Let | DeclKind::Mut) {
                    return Err(EvalError::BindError(format!(
                        "re-declaration of param {name}"
                    )));
                }
                Err(EvalError::BindError(format!("cannot set parameter {name}")))
            }
        }
    }
}
