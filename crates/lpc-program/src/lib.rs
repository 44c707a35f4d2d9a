//! Streaming packet-file session for pyramid lighting programs.
//!
//! A [`Program`] owns one output sink and a seeded random source. Every
//! emission call validates its command, encodes it, frames it and writes it
//! before returning. File sinks are staged under a temporary name and only
//! renamed into place by [`Program::finish`], so a failed compilation never
//! leaves a truncated artifact behind.

pub mod config;
pub mod error;
pub mod program;
pub mod sink;

pub use config::ProgramConfig;
pub use error::{ProgramError, Result};
pub use program::{Program, ProgramSummary};
pub use sink::{MemorySink, Sink, StagedFile};
