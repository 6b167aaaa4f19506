use std::fs;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::interpreter::environment::{Env, Environment};
use crate::interpreter::value::Value;
use crate::interpreter::eval_program;
use crate::parser;

const PROMPT: &str = ">> ";

/// Indentation contract: every four-space run becomes one tab before the
/// lexer sees the text. No other whitespace is touched.
fn normalize_indentation(source: &str) -> String {
    source.replace("    ", "\t")
}

/// Interactive loop: one line at a time against a persistent environment.
/// Parse errors are printed tab-prefixed and the session continues.
pub fn start_interactive() -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let env: Env = Environment::new();

    loop {
        write!(stdout, "{PROMPT}")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }

        let source = normalize_indentation(&line);
        match parser::parse_source(&source) {
            Ok(program) => {
                if let Some(value) = eval_program(&program, &env) {
                    writeln!(stdout, "{}", value.inspect())?;
                }
            }
            Err(errors) => {
                for error in errors {
                    writeln!(stdout, "\t{error}")?;
                }
            }
        }
    }
}

/// Runs a whole source file. A failed read is fatal; parse errors terminate
/// the run with every accumulated message.
pub fn run_file(path: &str) -> Result<()> {
    let source = fs::read_to_string(path).with_context(|| format!("Reading {path}"))?;
    let source = normalize_indentation(&source);

    let program = match parser::parse_source(&source) {
        Ok(program) => program,
        Err(errors) => {
            let rendered = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            anyhow::bail!("{rendered}");
        }
    };

    let env: Env = Environment::new();
    if let Some(value) = eval_program(&program, &env)
        && !matches!(value, Value::Null)
    {
        println!("{}", value.inspect());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_four_space_runs_to_tabs() {
        assert_eq!(normalize_indentation("    x = 1"), "\tx = 1");
        assert_eq!(normalize_indentation("        x = 1"), "\t\tx = 1");
        assert_eq!(normalize_indentation("x = 1"), "x = 1");
        assert_eq!(normalize_indentation("x =  1"), "x =  1");
    }
}
