//! Command model and packet encoder for the pyramid lighting protocol.
//!
//! The master controller relays packets to slave controllers that drive the
//! pyramid's LED entities (eight diagonal columns and four side panels).
//! Packets fall into three families:
//!
//! - **Slave commands** (`0x00..=0x04`): ambient behavior of whole slaves
//! - **Entity commands** (`0xC0..=0xC7`): pixel content, with a repeat schedule
//! - **Meta commands** (`0xFF` + subcode): consumed by the master, never relayed
//!
//! ```
//! use lpc_packet::{Command, EntityCommand, EntityMask, Rgb, Schedule};
//!
//! let red = Rgb::new(255, 0, 0).unwrap();
//! let cmd = Command::entity(EntityMask::ALL, Schedule::once(0), EntityCommand::fill_rgb(red));
//! assert_eq!(
//!     cmd.encode(),
//!     vec![0xC0, 0xFF, 0xFF, 0x01, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00]
//! );
//! ```

pub mod address;
pub mod codec;
pub mod command;
pub mod constants;
pub mod error;
pub mod field;

pub use address::EntityMask;
pub use codec::{decode_command, encode_command};
pub use command::{Command, EntityCommand, MetaCommand, Rgb, Schedule, SlaveCommand};
pub use constants::*;
pub use error::{DecodeError, EncodeError, Result};
