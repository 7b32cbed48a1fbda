// ABOUTME: End-to-end tests exercising the public `interpret` entry point

use prefix_lang::error::{EvalError, InterpretError};
use prefix_lang::value::Value;
use prefix_lang::{interpret, lexer, parser, printer};

fn run(src: &str) -> Value {
    interpret(src, false).unwrap_or_else(|e| panic!("expected success for {src:?}, got {e}"))
}

// --- spec.md §8 concrete scenarios ---------------------------------------

#[test]
fn scenario_1_arithmetic() {
    assert_eq!(run("(+ 2 (* 3 4))"), Value::Int(14));
}

#[test]
fn scenario_2_while_loop_counts_to_three() {
    let src = "(mut x 0); (while (< x 3) (set x (+ x 1))); x";
    assert_eq!(run(src), Value::Int(3));
}

#[test]
fn scenario_3_recursive_factorial() {
    let src = "(let f (func f n: (if (== n 0) 1 (* n (call f (- n 1)))))); (call f 5)";
    assert_eq!(run(src), Value::Int(120));
}

#[test]
fn scenario_4_partial_application_of_add() {
    let src = "(let add (func add a b: (+ a b))); \
               (let inc (call add 1)); \
               (call inc 41)";
    assert_eq!(run(src), Value::Int(42));
}

#[test]
fn scenario_5_map_put_then_get() {
    let src = "(let m {\"a\": 1}); (put m \"b\" 2); (get m \"b\")";
    assert_eq!(run(src), Value::Int(2));
}

#[test]
fn scenario_6_set_on_let_binding_is_bind_error() {
    let src = "(let x 1); (set x 2)";
    match interpret(src, false) {
        Err(InterpretError::Eval(EvalError::BindError(msg))) => {
            assert!(msg.contains("non-mutable"), "unexpected message: {msg}");
        }
        other => panic!("expected BindError, got {other:?}"),
    }
}

#[test]
fn scenario_7_head_of_empty_list_is_key_error() {
    match interpret("(head [])", false) {
        Err(InterpretError::Eval(EvalError::KeyError(_))) => {}
        other => panic!("expected KeyError, got {other:?}"),
    }
}

// --- universal invariants -------------------------------------------------

#[test]
fn invariant_tokenizer_is_deterministic() {
    let src = "(let f (func f a b: (+ a (* b 2)))); (call f 3 4)";
    assert_eq!(lexer::tokenize(src), lexer::tokenize(src));
}

#[test]
fn invariant_parse_then_print_then_parse_is_semantically_stable() {
    let src = "(let f (func f n: (if (== n 0) 1 (* n (call f (- n 1)))))); (call f 5)";
    let original = run(src);

    let tokens = lexer::tokenize(src).unwrap();
    let ast = parser::parse(&tokens).unwrap().unwrap();
    let printed = printer::print_node(&ast);

    let reparsed_tokens = lexer::tokenize(&printed).unwrap();
    let reparsed_ast = parser::parse(&reparsed_tokens).unwrap().unwrap();

    let mut evaluator = prefix_lang::eval::Evaluator::new();
    let roundtripped = evaluator.eval(&reparsed_ast).unwrap();

    assert_eq!(original, roundtripped);
}

#[test]
fn invariant_evaluation_is_deterministic_across_independent_evaluators() {
    let src = "(mut x 0); (while (< x 5) (set x (+ x 1))); (* x x)";
    let tokens = lexer::tokenize(src).unwrap();
    let ast = parser::parse(&tokens).unwrap().unwrap();

    let mut first = prefix_lang::eval::Evaluator::new();
    let mut second = prefix_lang::eval::Evaluator::new();

    assert_eq!(first.eval(&ast).unwrap(), second.eval(&ast).unwrap());
}

#[test]
fn invariant_let_bound_names_cannot_be_reassigned() {
    let src = "(let x 1); (set x 2)";
    assert!(matches!(
        interpret(src, false),
        Err(InterpretError::Eval(EvalError::BindError(_)))
    ));
}

#[test]
fn invariant_mut_bound_names_can_be_reassigned() {
    let src = "(mut x 0); (set x 1); x";
    assert_eq!(run(src), Value::Int(1));
}

#[test]
fn invariant_partial_application_then_full_call_matches_direct_call() {
    let src = "(call (call (func f a b: (+ a b)) 2) 3)";
    assert_eq!(run(src), Value::Int(5));
}

#[test]
fn invariant_closure_capture_of_a_shared_map_accumulates_across_calls() {
    // `bump`'s captured `m` is the same `Rc<RefCell<..>>` the outer scope
    // holds, so `put` inside the closure is visible both to a later call of
    // the same closure and to the outer binding once the call returns.
    let src = "(let m {\"count\": 0}); \
               (let bump (func bump: (put m \"count\" (+ (get m \"count\") 1)))); \
               (call bump); \
               (call bump); \
               (get m \"count\")";
    assert_eq!(run(src), Value::Int(2));
}

// --- additional coverage ---------------------------------------------------

#[test]
fn list_operations_compose() {
    let src = "(head (tail (push 0 [1 2 3])))";
    assert_eq!(run(src), Value::Int(1));
}

#[test]
fn string_values_round_trip_through_print() {
    assert_eq!(run("\"hello\""), Value::Str("hello".to_string()));
}

#[test]
fn list_display_is_prefix_notation_not_comma_joined() {
    let list = run("[1 2 3]");
    assert_eq!(list.to_string(), "[1 2 3]");
}

#[test]
fn map_display_is_prefix_notation_indented_not_comma_joined() {
    let map = run("{\"a\": 1 \"b\": 2}");
    assert_eq!(map.to_string(), "{\n  \"a\":1\n  \"b\":2\n}");
}

#[test]
fn nested_string_in_list_display_is_quoted() {
    let list = run("[\"a\" \"b\"]");
    assert_eq!(list.to_string(), "[\"a\" \"b\"]");
}

#[test]
fn print_of_a_list_value_succeeds_and_returns_nil() {
    // `print` writes to stdout via the same `Display` impl exercised above;
    // this only checks it runs end to end through the `(print ...)` form.
    assert_eq!(run("(print [1 2 3])"), Value::Nil);
}

#[test]
fn and_or_are_eager_not_short_circuit() {
    // `(|| True (head []))` must evaluate both operands, raising KeyError
    // rather than short-circuiting on the already-true left operand.
    assert!(matches!(
        interpret("(|| True (head []))", false),
        Err(InterpretError::Eval(EvalError::KeyError(_)))
    ));
}

#[test]
fn too_many_call_arguments_is_arity_error() {
    let src = "(let id (func id a: a)); (call id 1 2)";
    assert!(matches!(
        interpret(src, false),
        Err(InterpretError::Eval(EvalError::ArityError { .. }))
    ));
}
