use std::fmt;
use std::io;

use lpc_frame::FrameError;
use lpc_packet::DecodeError;
use lpc_program::ProgramError;
use lpc_script::ScriptError;

// Exit codes follow sysexits.h.
pub const SUCCESS: i32 = 0;
pub const USAGE: i32 = 64;
pub const DATA_INVALID: i32 = 65;
pub const IO_ERROR: i32 = 74;
pub const PERMISSION_DENIED: i32 = 77;
pub const CONFIG: i32 = 78;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn io_code(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        _ => IO_ERROR,
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(io_code(&err), format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn decode_error(context: &str, err: DecodeError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

fn program_code(err: &ProgramError) -> i32 {
    match err {
        err if err.is_configuration() => CONFIG,
        ProgramError::Io { source, .. } | ProgramError::Frame(FrameError::Io(source)) => {
            io_code(source)
        }
        _ => DATA_INVALID,
    }
}

pub fn program_error(context: &str, err: ProgramError) -> CliError {
    CliError::new(program_code(&err), format!("{context}: {err}"))
}

pub fn script_error(context: &str, err: ScriptError) -> CliError {
    let code = err.program_error().map_or(DATA_INVALID, program_code);
    CliError::new(code, format!("{context}:{err}"))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use lpc_packet::{EncodeError, MetaCommand};
    use lpc_script::Pos;

    use super::*;

    #[test]
    fn program_errors_map_to_exit_classes() {
        assert_eq!(program_error("x", ProgramError::NoOutput).code, CONFIG);
        assert_eq!(
            program_error("x", ProgramError::OutputAlreadySet("A.PKT".into())).code,
            CONFIG
        );
        let encode: EncodeError = MetaCommand::wait_for_tick(70_000).unwrap_err();
        assert_eq!(program_error("x", encode.into()).code, DATA_INVALID);

        let denied = ProgramError::Io {
            path: PathBuf::from("/ro/A.PKT"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(program_error("x", denied).code, PERMISSION_DENIED);
        let full = ProgramError::Io {
            path: PathBuf::from("/full/A.PKT"),
            source: io::Error::other("disk full"),
        };
        assert_eq!(program_error("x", full).code, IO_ERROR);
    }

    #[test]
    fn script_errors_keep_position_in_message() {
        let err = ScriptError::Runtime {
            pos: Pos::new(3, 7),
            message: "division by zero".into(),
        };
        let cli = script_error("show.lps", err);
        assert_eq!(cli.code, DATA_INVALID);
        assert_eq!(cli.message, "show.lps:3:7: division by zero");

        let err = ScriptError::Program {
            pos: Pos::new(1, 1),
            source: ProgramError::NoOutput,
        };
        assert_eq!(script_error("show.lps", err).code, CONFIG);
    }
}
