//! `jive` command line driver.
//!
//! ```text
//! jive [--stdlib PATH] [--all-forms] SCRIPT   # load the stdlib unit, then the script
//! jive                                        # interactive REPL
//! ```

use std::process;

use jive::ast::Value;
use jive::bundle::{BundleRegistry, math_bundle};
use jive::evaluator::create_root_scope;
use jive::{Config, Error, Interpreter, Scope};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// The standard library unit loaded before every script
const PRELUDE: &str = include_str!("../stdlib/prelude.ji");

const USAGE: &str = "usage: jive [--stdlib PATH] [--all-forms] [SCRIPT]";

#[derive(Debug, Default)]
struct Options {
    stdlib: Option<String>,
    all_forms: bool,
    script: Option<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options, String> {
    let mut options = Options::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--stdlib" => {
                let path = args.next().ok_or("--stdlib needs a path")?;
                options.stdlib = Some(path);
            }
            "--all-forms" => options.all_forms = true,
            "-h" | "--help" => return Err(USAGE.to_owned()),
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            _ if options.script.is_some() => return Err("only one script may be given".to_owned()),
            script => options.script = Some(script.to_owned()),
        }
    }
    Ok(options)
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    // Only initialize if RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn interpreter() -> Interpreter {
    let mut bundles = BundleRegistry::new();
    bundles.register("math", math_bundle());
    Interpreter::with_config(Config::from_env()).with_bundles(bundles)
}

fn main() {
    init_tracing();

    let options = match parse_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };

    let interpreter = interpreter();
    let scope = create_root_scope();

    let result = load_stdlib(&interpreter, &scope, &options).and_then(|()| match &options.script {
        Some(path) => run_script(&interpreter, &scope, &options, path),
        None => run_repl(&interpreter, &scope),
    });

    if let Err(message) = result {
        eprintln!("{message}");
        process::exit(1);
    }
}

fn load(interpreter: &Interpreter, scope: &Scope, text: &str, all_forms: bool) -> Result<Value, Error> {
    if all_forms {
        interpreter.run(text, scope)
    } else {
        interpreter.load_unit(text, scope)
    }
}

fn load_stdlib(interpreter: &Interpreter, scope: &Scope, options: &Options) -> Result<(), String> {
    let text = match &options.stdlib {
        Some(path) => std::fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?,
        None => PRELUDE.to_owned(),
    };
    load(interpreter, scope, &text, options.all_forms).map_err(|e| format!("stdlib: {e}"))?;
    Ok(())
}

fn run_script(
    interpreter: &Interpreter,
    scope: &Scope,
    options: &Options,
    path: &str,
) -> Result<(), String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
    let value = load(interpreter, scope, &text, options.all_forms).map_err(|e| format!("{path}: {e}"))?;
    if !matches!(value, Value::Unspecified) {
        println!("{value}");
    }
    Ok(())
}

fn run_repl(interpreter: &Interpreter, scope: &Scope) -> Result<(), String> {
    println!("Jive interpreter");
    println!("Enter expressions like: (+ 1 2)");
    println!("Type :help for more commands, or Ctrl+C to exit.");
    println!();

    let mut rl = DefaultEditor::new().map_err(|e| format!("could not initialize REPL: {e}"))?;

    loop {
        match rl.readline("jive> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":env" => {
                        print_scope(scope);
                        continue;
                    }
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                match interpreter.run(line, scope) {
                    // Don't print Unspecified values (e.g., from define)
                    Ok(Value::Unspecified) => {}
                    Ok(value) => println!("{value}"),
                    Err(e) => println!("Error: {e}"),
                }
            }

            Err(ReadlineError::Eof | ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => return Err(format!("REPL error: {err}")),
        }
    }
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  :help      - Show this help message");
    println!("  :env       - Show current bindings");
    println!("  :quit      - Exit the interpreter");
    println!("  Ctrl+C     - Exit the interpreter");
    println!();
    println!("Special forms: quote, if, set!, define, lambda, begin");
    println!("Bundle import: (`math (sqrt 2))");
    println!();
    println!("Examples:");
    println!("  (define square (lambda (x) (* x x)))");
    println!("  (square 12)");
    println!("  (cons 1 (quote (2 3)))");
}

fn print_scope(scope: &Scope) {
    let bindings = scope.get_all_bindings();

    let (primitives, user_defined): (Vec<_>, Vec<_>) = bindings
        .into_iter()
        .partition(|(_, value)| matches!(value, Value::Primitive(_)));

    println!("Primitives ({}):", primitives.len());
    let mut col = 0;
    for (name, _) in &primitives {
        print!("  {name:<10}");
        col += 1;
        if col % 6 == 0 {
            println!();
        }
    }
    if col % 6 != 0 {
        println!();
    }
    println!();

    println!("Values ({}):", user_defined.len());
    for (name, value) in user_defined {
        println!("  {name} = {value}");
    }
}
