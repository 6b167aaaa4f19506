use anyhow::{Result, bail};

use pylite::repl;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let mut input_path: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--file" | "-f" => {
                input_path = Some(
                    args.next()
                        .ok_or_else(|| anyhow::anyhow!("Missing path after {arg}"))?,
                );
            }
            _ => bail!("Unknown argument '{arg}'"),
        }
    }

    match input_path {
        Some(path) => repl::run_file(&path),
        None => {
            println!("Welcome to the pylite programming language!");
            repl::start_interactive()
        }
    }
}
