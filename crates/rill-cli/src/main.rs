use std::{
    env, fs,
    io::{self, BufRead, Write},
    process::ExitCode,
};

use rill::{ReplError, ReplSession, Runner, StdPrint};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    match args.len() {
        1 => repl(),
        2 => run_file(&args[1]),
        _ => {
            eprintln!("Usage: rill [script]");
            ExitCode::from(64)
        }
    }
}

fn run_file(file_path: &str) -> ExitCode {
    let source = match read_file(file_path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let runner = match Runner::compile(&source) {
        Ok(runner) => runner,
        Err(diagnostics) => {
            for diagnostic in diagnostics {
                eprintln!("{diagnostic}");
            }
            return ExitCode::from(65);
        }
    };
    match runner.run(&mut StdPrint) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(70)
        }
    }
}

fn repl() -> ExitCode {
    let mut session = ReplSession::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let Some(line) = lines.next() else {
            // EOF ends the session cleanly
            println!();
            return ExitCode::SUCCESS;
        };
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                eprintln!("error reading input: {err}");
                return ExitCode::FAILURE;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        // errors keep the session alive; globals defined so far persist
        match session.execute(&line, &mut StdPrint) {
            Ok(()) => {}
            Err(ReplError::Compile(diagnostics)) => {
                for diagnostic in diagnostics {
                    eprintln!("{diagnostic}");
                }
            }
            Err(ReplError::Runtime(err)) => eprintln!("{err}"),
        }
    }
}

fn read_file(file_path: &str) -> Result<String, String> {
    match fs::metadata(file_path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("{file_path} is not a file"));
            }
        }
        Err(err) => {
            return Err(format!("cannot read {file_path}: {err}"));
        }
    }
    fs::read_to_string(file_path).map_err(|err| format!("cannot read {file_path}: {err}"))
}
