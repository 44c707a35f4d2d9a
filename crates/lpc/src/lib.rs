//! Lighting program compiler for the pyramid LED controllers.
//!
//! Turns an ordered sequence of effect calls into the SLIP-framed binary
//! packet stream the master controller replays to the slave controllers.
//!
//! # Crate Structure
//!
//! - [`frame`]: SLIP byte-stuffing framing
//! - [`packet`]: Entity addressing, command model, packet encoder and decoder
//! - [`program`]: Compilation session writing packets to an output sink
//! - [`script`]: Sandboxed show-script language (behind `script` feature)

/// Re-export frame types.
pub mod frame {
    pub use lpc_frame::*;
}

/// Re-export packet types.
pub mod packet {
    pub use lpc_packet::*;
}

/// Re-export program host types.
pub mod program {
    pub use lpc_program::*;
}

/// Re-export script types (requires `script` feature).
#[cfg(feature = "script")]
pub mod script {
    pub use lpc_script::*;
}

/// Shared plumbing for the command-line tools (requires `cli` feature).
#[cfg(feature = "cli")]
#[doc(hidden)]
pub mod cli;
