use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame delimiter.
pub const FEND: u8 = 0xC0;

/// Escape introducer.
pub const FESC: u8 = 0xDB;

/// Escaped `FEND` (follows `FESC`).
pub const TFEND: u8 = 0xDC;

/// Escaped `FESC` (follows `FESC`).
pub const TFESC: u8 = 0xDD;

/// Default maximum payload size: 1 KiB. Real packets never exceed 15 bytes.
pub const DEFAULT_MAX_PAYLOAD: usize = 1024;

/// Number of bytes `payload` occupies on the wire once framed.
pub fn framed_len(payload: &[u8]) -> usize {
    let escapes = payload.iter().filter(|&&b| b == FEND || b == FESC).count();
    payload.len() + escapes + 2
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────┬──────────────────────────────┬──────┐
/// │ FEND │ payload (FEND → FESC TFEND,  │ FEND │
/// │ 0xC0 │          FESC → FESC TFESC)  │ 0xC0 │
/// └──────┴──────────────────────────────┴──────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(framed_len(payload));
    dst.put_u8(FEND);
    for &byte in payload {
        match byte {
            FEND => dst.put_slice(&[FESC, TFEND]),
            FESC => dst.put_slice(&[FESC, TFESC]),
            other => dst.put_u8(other),
        }
    }
    dst.put_u8(FEND);
}

/// Frame a payload into a fresh buffer.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(framed_len(payload));
    encode_frame(payload, &mut buf);
    buf.to_vec()
}

/// Recover the payload of exactly one complete frame.
///
/// The input must start and end with `FEND` and contain no other unescaped
/// `FEND`.
pub fn unframe(wire: &[u8]) -> Result<Vec<u8>> {
    if wire.len() < 2 || wire[0] != FEND || wire[wire.len() - 1] != FEND {
        return Err(FrameError::MissingDelimiter);
    }
    let body = &wire[1..wire.len() - 1];
    if let Some(pos) = body.iter().position(|&b| b == FEND) {
        return Err(FrameError::EmbeddedDelimiter { offset: pos + 1 });
    }

    let mut out = BytesMut::with_capacity(body.len());
    unescape_into(body, &mut out)?;
    Ok(out.to_vec())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes (both delimiters included) from the
/// buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    if src.is_empty() {
        return Ok(None);
    }

    if src[0] != FEND {
        return Err(FrameError::UnexpectedByte(src[0]));
    }

    let Some(end) = src[1..].iter().position(|&b| b == FEND) else {
        // Escapes shrink on decode, so this is an upper bound on the payload.
        let pending = src.len() - 1 - src[1..].iter().filter(|&&b| b == FESC).count();
        if pending > max_payload {
            return Err(FrameError::PayloadTooLarge {
                size: pending,
                max: max_payload,
            });
        }
        return Ok(None); // Need more data
    };

    let mut payload = BytesMut::with_capacity(end);
    unescape_into(&src[1..1 + end], &mut payload)?;
    if payload.len() > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: max_payload,
        });
    }

    src.advance(end + 2);
    Ok(Some(payload.freeze()))
}

fn unescape_into(body: &[u8], dst: &mut BytesMut) -> Result<()> {
    let mut bytes = body.iter().copied();
    while let Some(byte) = bytes.next() {
        if byte != FESC {
            dst.put_u8(byte);
            continue;
        }
        match bytes.next() {
            Some(TFEND) => dst.put_u8(FEND),
            Some(TFESC) => dst.put_u8(FESC),
            Some(other) => return Err(FrameError::InvalidEscape(other)),
            None => return Err(FrameError::DanglingEscape),
        }
    }
    Ok(())
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 1 KiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_payload_is_wrapped() {
        assert_eq!(frame(&[0x00, 0xFF, 0xFF]), vec![0xC0, 0x00, 0xFF, 0xFF, 0xC0]);
    }

    #[test]
    fn test_fend_and_fesc_are_escaped() {
        assert_eq!(frame(&[0xC0]), vec![0xC0, 0xDB, 0xDC, 0xC0]);
        assert_eq!(frame(&[0xDB]), vec![0xC0, 0xDB, 0xDD, 0xC0]);
        // Already-escaped looking bytes pass through untouched.
        assert_eq!(frame(&[0xDC, 0xDD]), vec![0xC0, 0xDC, 0xDD, 0xC0]);
    }

    #[test]
    fn test_roundtrip_with_delimiters_in_every_position() {
        let specials = [FEND, FESC, TFEND, TFESC, 0x00, 0xFF];
        for len in 0..4usize {
            let total = specials.len().pow(len as u32);
            for mut n in 0..total {
                let mut payload = Vec::with_capacity(len);
                for _ in 0..len {
                    payload.push(specials[n % specials.len()]);
                    n /= specials.len();
                }
                let wire = frame(&payload);
                assert_eq!(wire.len(), framed_len(&payload));
                assert_eq!(unframe(&wire).unwrap(), payload, "payload {payload:02X?}");
            }
        }
    }

    #[test]
    fn test_roundtrip_all_byte_values() {
        let payload: Vec<u8> = (0..=255u8).collect();
        let wire = frame(&payload);
        assert_eq!(wire.len(), 256 + 2 + 2);
        assert_eq!(unframe(&wire).unwrap(), payload);
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(frame(&[]), vec![FEND, FEND]);
        assert!(unframe(&[FEND, FEND]).unwrap().is_empty());
    }

    #[test]
    fn test_unframe_rejects_missing_delimiters() {
        assert!(matches!(unframe(&[]), Err(FrameError::MissingDelimiter)));
        assert!(matches!(unframe(&[FEND]), Err(FrameError::MissingDelimiter)));
        assert!(matches!(
            unframe(&[0x01, FEND]),
            Err(FrameError::MissingDelimiter)
        ));
        assert!(matches!(
            unframe(&[FEND, 0x01]),
            Err(FrameError::MissingDelimiter)
        ));
    }

    #[test]
    fn test_unframe_rejects_embedded_delimiter() {
        let err = unframe(&[FEND, 0x01, FEND, 0x02, FEND]).unwrap_err();
        assert!(matches!(err, FrameError::EmbeddedDelimiter { offset: 2 }));
    }

    #[test]
    fn test_unframe_rejects_bad_escapes() {
        assert!(matches!(
            unframe(&[FEND, FESC, 0x01, FEND]),
            Err(FrameError::InvalidEscape(0x01))
        ));
        assert!(matches!(
            unframe(&[FEND, 0x01, FESC, FEND]),
            Err(FrameError::DanglingEscape)
        ));
    }

    #[test]
    fn test_decode_incomplete_frame() {
        let mut buf = BytesMut::from(&[FEND, 0x01, 0x02][..]);
        assert!(decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().is_none());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_decode_byte_outside_frame() {
        let mut buf = BytesMut::from(&[0x01, FEND][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Err(FrameError::UnexpectedByte(0x01))));
    }

    #[test]
    fn test_decode_payload_too_large() {
        let mut buf = BytesMut::new();
        encode_frame(&[0x11; 32], &mut buf);
        let result = decode_frame(&mut buf, 16);
        assert!(matches!(
            result,
            Err(FrameError::PayloadTooLarge { size: 32, max: 16 })
        ));
    }

    #[test]
    fn test_decode_unterminated_payload_too_large() {
        let mut buf = BytesMut::new();
        buf.put_u8(FEND);
        buf.put_slice(&[0x22; 40]);
        let result = decode_frame(&mut buf, 16);
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = BytesMut::new();
        encode_frame(&[0x00, 0xFF, 0xFF], &mut buf);
        encode_frame(&[0xFF, 0x01, 0x2C, 0x01], &mut buf);
        encode_frame(&[0xC0, 0xDB], &mut buf);

        let f1 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        let f2 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        let f3 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();

        assert_eq!(f1.as_ref(), &[0x00, 0xFF, 0xFF]);
        assert_eq!(f2.as_ref(), &[0xFF, 0x01, 0x2C, 0x01]);
        assert_eq!(f3.as_ref(), &[0xC0, 0xDB]);
        assert!(buf.is_empty());
    }
}
