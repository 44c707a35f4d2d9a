//! Encoding and decoding errors.

use thiserror::Error;

/// A caller-supplied value cannot be represented in the packet layout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A field value exceeds its declared bit width (or is negative).
    #[error("{field} = {value} does not fit a {width}-bit field (0..={})", max_for(*width))]
    FieldOutOfRange {
        /// Field name as it appears in the protocol table.
        field: &'static str,
        /// Declared width in bits.
        width: u32,
        /// Rejected value.
        value: i64,
    },
}

/// A byte sequence is not a valid packet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Zero-length packet.
    #[error("empty packet")]
    Empty,

    /// Unknown command code.
    #[error("unknown command code: 0x{0:02X}")]
    UnknownOpcode(u8),

    /// Unknown meta subcommand.
    #[error("unknown meta command: 0x{0:02X}")]
    UnknownMetaCommand(u8),

    /// Packet length does not match the command's layout.
    #[error("{command} packet must be {expected} bytes, got {actual}")]
    Length {
        /// Command mnemonic.
        command: &'static str,
        /// Expected packet length (or maximum, for comments).
        expected: usize,
        /// Actual packet length.
        actual: usize,
    },

    /// Comment packets always carry the all-call address.
    #[error("comment packet address must be 0xFFFF, got 0x{0:04X}")]
    CommentAddress(u16),
}

pub type Result<T> = std::result::Result<T, EncodeError>;

fn max_for(width: u32) -> u64 {
    (1u64 << width) - 1
}
