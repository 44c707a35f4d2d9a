use std::path::PathBuf;

use clap::Parser;
use lpc::cli::exit::{io_error, program_error, script_error, CliResult, SUCCESS};
use lpc::cli::logging::{init_logging, LogArgs};
use lpc::cli::{exit_with, parse_args};
use lpc::program::{Program, ProgramConfig};
use lpc::script::{run_script, ScriptLimits};

#[derive(Parser, Debug)]
#[command(
    name = "lpcompile",
    version,
    about = "Compile a show script into a packet file"
)]
struct Cli {
    /// Show script to compile.
    script: PathBuf,

    /// Directory the packet file is written to.
    #[arg(long, value_name = "DIR", env = "LPC_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Initial seed for the script's random source.
    #[arg(long, env = "LPC_SEED", default_value_t = 0)]
    seed: u64,

    /// Maximum evaluation steps before the script is aborted.
    #[arg(long, value_name = "N", default_value_t = ScriptLimits::default().max_steps)]
    max_steps: u64,

    #[command(flatten)]
    log: LogArgs,
}

fn main() {
    let cli: Cli = parse_args();
    init_logging(&cli.log);
    exit_with(compile(&cli));
}

fn compile(cli: &Cli) -> CliResult<i32> {
    let script_name = cli.script.display().to_string();
    let source = std::fs::read_to_string(&cli.script)
        .map_err(|err| io_error(&format!("reading {script_name}"), err))?;

    let config = ProgramConfig {
        output_dir: cli.out_dir.clone(),
        seed: cli.seed,
        ..ProgramConfig::default()
    };
    let limits = ScriptLimits {
        max_steps: cli.max_steps,
        ..ScriptLimits::default()
    };

    let mut program = Program::new(config);
    let stats =
        run_script(&source, &mut program, &limits).map_err(|err| script_error(&script_name, err))?;
    let summary = program
        .finish()
        .map_err(|err| program_error(&script_name, err))?;

    tracing::info!(
        script = %script_name,
        steps = stats.steps,
        packets = summary.packets,
        bytes = summary.bytes,
        "compiled"
    );
    Ok(SUCCESS)
}
