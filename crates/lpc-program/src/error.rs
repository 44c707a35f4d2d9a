use std::path::PathBuf;

use lpc_frame::FrameError;
use lpc_packet::EncodeError;

/// Errors that can occur while compiling a program.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// A packet was emitted before an output was designated.
    #[error("no output designated; set the output before emitting packets")]
    NoOutput,

    /// The output was designated a second time.
    #[error("output already designated: {0}")]
    OutputAlreadySet(String),

    /// The output name is not a bare file name.
    #[error("invalid output name {name:?}: {reason}")]
    InvalidOutputName { name: String, reason: &'static str },

    /// A field does not fit its declared width.
    #[error("encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// The framer rejected a packet.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Creating, writing or committing the output failed.
    #[error("output I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A random draw was requested from an empty range.
    #[error("random range is empty ({lo}..{hi})")]
    EmptyRandomRange { lo: i64, hi: i64 },
}

impl ProgramError {
    /// True for errors caused by how the output was (or was not) set up.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoOutput | Self::OutputAlreadySet(_) | Self::InvalidOutputName { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ProgramError>;
