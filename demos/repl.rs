//! Interactive read-eval-print loop over a single interpreter.
//!
//! Run with: cargo run --example repl

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use slisp::evaluator::Interpreter;
use slisp::reader;

fn main() {
    println!("slisp - a small dynamically scoped Lisp");
    println!("Enter S-expressions like: (+ 1 2)");
    println!("Ctrl-C or Ctrl-D to exit.");
    println!();

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("Could not initialize line editor: {err}");
            return;
        }
    };

    let mut interp = Interpreter::new();

    loop {
        match rl.readline("slisp> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                let expr = match reader::read(line) {
                    Ok(expr) => expr,
                    Err(err) => {
                        println!("Read error: {err}");
                        continue;
                    }
                };

                match interp.eval(&expr) {
                    Ok(result) => match result.sexpr() {
                        Ok(text) => println!("{text}"),
                        Err(err) => println!("Error: {err}"),
                    },
                    Err(err) => println!("Error: {err}"),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Input error: {err}");
                break;
            }
        }
    }
}
