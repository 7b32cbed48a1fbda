// ABOUTME: Library module exposing internal components for testing and driving the interpreter

pub mod ast;
pub mod config;
pub mod env;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod token;
pub mod value;

use error::InterpretError;
use eval::Evaluator;
use value::Value;

/// Runs one top-level expression end to end: lex, parse, optionally
/// pretty-print the AST, then evaluate it against a fresh environment stack.
///
/// A source containing no expression (blank, or comments-only) evaluates to
/// `Value::Nil`.
pub fn interpret(source: &str, verbose: bool) -> Result<Value, InterpretError> {
    let tokens = lexer::tokenize(source)?;
    let ast = parser::parse(&tokens)?;

    let Some(node) = ast else {
        return Ok(Value::Nil);
    };

    if verbose {
        println!("{}", printer::print_node(&node));
    }

    let mut evaluator = Evaluator::new();
    let value = evaluator.eval(&node)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpret_empty_source_is_nil() {
        assert_eq!(interpret("", false).unwrap(), Value::Nil);
        assert_eq!(interpret("   ", false).unwrap(), Value::Nil);
    }

    #[test]
    fn test_interpret_simple_expression() {
        assert_eq!(interpret("(+ 1 2)", false).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_interpret_verbose_does_not_change_result() {
        assert_eq!(interpret("(+ 1 2)", true).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_interpret_propagates_lex_error() {
        assert!(matches!(
            interpret("(+ 1 2x)", false),
            Err(InterpretError::Lex(_))
        ));
    }

    #[test]
    fn test_interpret_propagates_parse_error() {
        assert!(matches!(
            interpret("(+ 1 2) 3", false),
            Err(InterpretError::Parse(_))
        ));
    }

    #[test]
    fn test_interpret_propagates_eval_error() {
        assert!(matches!(
            interpret("(+ 1 True)", false),
            Err(InterpretError::Eval(_))
        ));
    }
}
