// ABOUTME: Configuration and constants for the interpreter
// This module contains version info and REPL banner text

pub const VERSION: &str = "1.0.0";
pub const WELCOME_MESSAGE: &str = "simple-lang Interpreter v1.0";
pub const WELCOME_SUBTITLE: &str = "A prefix-notation expression language in Rust";

pub const HELP_TEXT: &str = r#"
Type any expression to evaluate it. Use Ctrl-D to exit.
Every form is a parenthesized prefix expression, e.g. (+ 1 2), (if True 1 2).
"#;
