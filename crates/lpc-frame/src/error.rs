/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A non-delimiter byte appeared where a frame was expected to start.
    #[error("unexpected byte 0x{0:02X} outside a frame (expected FEND 0xC0)")]
    UnexpectedByte(u8),

    /// `FESC` was followed by something other than `TFEND` or `TFESC`.
    #[error("invalid escape sequence: FESC followed by 0x{0:02X}")]
    InvalidEscape(u8),

    /// `FESC` was the last byte before the closing delimiter.
    #[error("dangling FESC at end of frame")]
    DanglingEscape,

    /// An unescaped `FEND` appeared inside what should be a single frame.
    #[error("unescaped FEND inside frame at offset {offset}")]
    EmbeddedDelimiter { offset: usize },

    /// A single frame is missing its opening or closing delimiter.
    #[error("missing frame delimiter")]
    MissingDelimiter,

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended inside a frame.
    #[error("stream ended inside a frame ({0} bytes buffered)")]
    Truncated(usize),

    /// The sink accepted zero bytes.
    #[error("sink closed (write returned zero bytes)")]
    SinkClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
