//! SLIP byte-stuffing framing for lighting program packet streams.
//!
//! Every packet is wrapped as:
//! - A leading `FEND` (0xC0) delimiter
//! - The payload, with `FEND` escaped as `FESC TFEND` and `FESC` as `FESC TFESC`
//! - A trailing `FEND` delimiter
//!
//! The only unescaped `FEND` bytes on the wire sit at frame boundaries, so a
//! reader can recover packet boundaries from a plain byte stream.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, frame, framed_len, unframe, FrameConfig, DEFAULT_MAX_PAYLOAD,
    FEND, FESC, TFEND, TFESC,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
