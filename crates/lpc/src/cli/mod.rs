pub mod exit;
pub mod logging;
pub mod output;

use clap::Parser;

use crate::cli::exit::{CliResult, USAGE};

/// Parse arguments, reporting usage errors with the `USAGE` exit code.
///
/// `--help` and `--version` still exit successfully.
pub fn parse_args<P: Parser>() -> P {
    match P::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let _ = err.print();
            std::process::exit(USAGE);
        }
    }
}

/// Terminate the process with the outcome of a command.
pub fn exit_with(result: CliResult<i32>) -> ! {
    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
