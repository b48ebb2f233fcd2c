use std::fs::File;
use std::io;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};

fn main() -> Result<ExitCode> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input_path = args.next();
    if args.next().is_some() {
        bail!("Only one input file is supported");
    }

    let stdout = io::stdout();
    let mut output = stdout.lock();

    let ok = match input_path {
        Some(path) => {
            let file = File::open(&path).with_context(|| format!("Opening {path}"))?;
            rill::interpret(file, &mut output)
        }
        None => rill::interpret(io::stdin().lock(), &mut output),
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
