use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use lpc::cli::exit::{io_error, CliResult, SUCCESS};
use lpc::cli::logging::{init_logging, LogArgs};
use lpc::cli::{exit_with, parse_args};
use lpc::frame::frame;
use lpc::program::{Sink, StagedFile};

#[derive(Parser, Debug)]
#[command(
    name = "slipframe",
    version,
    about = "Frame each line of a text file as one SLIP packet"
)]
struct Cli {
    /// Text file to read.
    input: PathBuf,

    /// Framed file to write.
    output: PathBuf,

    #[command(flatten)]
    log: LogArgs,
}

fn main() {
    let cli: Cli = parse_args();
    init_logging(&cli.log);
    exit_with(convert(&cli));
}

fn convert(cli: &Cli) -> CliResult<i32> {
    let input = cli.input.display().to_string();
    let output = cli.output.display().to_string();
    let text = std::fs::read(&cli.input).map_err(|err| io_error(&format!("reading {input}"), err))?;

    let mut framed = Vec::with_capacity(text.len() + text.len() / 8);
    let mut lines = 0usize;
    for line in text.split_inclusive(|b| *b == b'\n') {
        framed.extend_from_slice(&frame(line));
        lines += 1;
    }

    let write_context = format!("writing {output}");
    let mut sink = StagedFile::create(&cli.output).map_err(|err| io_error(&write_context, err))?;
    sink.write_all(&framed)
        .map_err(|err| io_error(&write_context, err))?;
    Box::new(sink)
        .commit()
        .map_err(|err| io_error(&write_context, err))?;

    tracing::info!(lines, bytes = framed.len(), output = %output, "framed");
    Ok(SUCCESS)
}
