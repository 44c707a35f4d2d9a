use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::Parser;
use lpc::cli::exit::{decode_error, frame_error, io_error, CliResult, SUCCESS};
use lpc::cli::logging::{init_logging, LogArgs};
use lpc::cli::output::{print_packets, OutputFormat, PacketRow};
use lpc::cli::{exit_with, parse_args};
use lpc::frame::FrameReader;
use lpc::packet::decode_command;

#[derive(Parser, Debug)]
#[command(name = "lpdump", version, about = "Decode a packet file")]
struct Cli {
    /// Packet file to decode.
    file: PathBuf,

    /// Output format (default: table on a terminal, json otherwise).
    #[arg(long, value_name = "FORMAT")]
    format: Option<OutputFormat>,

    #[command(flatten)]
    log: LogArgs,
}

fn main() {
    let cli: Cli = parse_args();
    init_logging(&cli.log);
    exit_with(dump(&cli));
}

fn dump(cli: &Cli) -> CliResult<i32> {
    let name = cli.file.display().to_string();
    let file = File::open(&cli.file).map_err(|err| io_error(&format!("opening {name}"), err))?;

    let mut rows = Vec::new();
    for (index, frame) in FrameReader::new(BufReader::new(file)).enumerate() {
        let payload = frame.map_err(|err| frame_error(&format!("{name}: packet {index}"), err))?;
        let command = decode_command(&payload)
            .map_err(|err| decode_error(&format!("{name}: packet {index}"), err))?;
        tracing::trace!(index, command = command.name(), "decoded");
        rows.push(PacketRow::new(index, &payload, command));
    }
    tracing::debug!(packets = rows.len(), file = %name, "decoded packet file");

    print_packets(
        &rows,
        cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
    );
    Ok(SUCCESS)
}
