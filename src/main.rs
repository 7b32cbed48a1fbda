use clap::Parser;
use prefix_lang::config::{HELP_TEXT, VERSION, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use prefix_lang::error::InterpretError;
use prefix_lang::eval::Evaluator;
use prefix_lang::{interpret, lexer, parser, printer};
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::path::PathBuf;

/// Interpreter for a small prefix-notation, dynamically-typed expression language
#[derive(Parser, Debug)]
#[command(name = "prefix-lang")]
#[command(version = VERSION)]
#[command(about = "A prefix-notation, dynamically-typed expression language interpreter")]
struct CliArgs {
    /// Script file to execute (optional; if not provided, starts a REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Print the parsed AST before evaluating
    #[arg(long = "verbose", short = 'v')]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    if let Some(script_path) = args.script {
        run_script(&script_path, args.verbose)?;
        return Ok(());
    }

    run_repl(args.verbose)
}

/// Runs a whole script file as the single top-level expression the driver
/// contract expects (spec.md §6: the parser fails if tokens remain after
/// one top-level expression, so a script is one big expression — typically
/// a `;`-chained sequence).
fn run_script(path: &PathBuf, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read script file {}: {e}", path.display()))?;

    match interpret(&source, verbose) {
        Ok(value) => {
            println!("{value}");
            Ok(())
        }
        Err(e) => Err(format!("{e}").into()),
    }
}

/// Interactive mode: one top-level expression per line, evaluated against a
/// persistent `Evaluator` so `let`/`mut`/`func` bindings survive across
/// lines. This is a thin convenience over `interpret`'s pipeline stages; it
/// has no bearing on the evaluator's own semantics.
fn run_repl(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl = DefaultEditor::with_config(config)?;

    let history_file = ".prefix_lang_history";
    let _ = rl.load_history(history_file);

    println!("{WELCOME_MESSAGE}");
    println!("{WELCOME_SUBTITLE}");
    println!("{HELP_TEXT}");

    let mut evaluator = Evaluator::new();

    loop {
        let readline = rl.readline("> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }

                match run_line(&line, verbose, &mut evaluator) {
                    Ok(Some(value)) => println!("=> {value}"),
                    Ok(None) => {}
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\ngoodbye");
                break;
            }
            Err(err) => {
                eprintln!("error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}

fn run_line(
    line: &str,
    verbose: bool,
    evaluator: &mut Evaluator,
) -> Result<Option<prefix_lang::value::Value>, InterpretError> {
    let tokens = lexer::tokenize(line)?;
    let Some(node) = parser::parse(&tokens)? else {
        return Ok(None);
    };

    if verbose {
        println!("{}", printer::print_node(&node));
    }

    Ok(Some(evaluator.eval(&node)?))
}
