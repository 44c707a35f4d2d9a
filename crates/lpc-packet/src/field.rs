//! Range checks for fixed-width packet fields.

use crate::error::{EncodeError, Result};

/// Validate a value for an 8-bit field.
pub fn u8_field(field: &'static str, value: i64) -> Result<u8> {
    u8::try_from(value).map_err(|_| EncodeError::FieldOutOfRange {
        field,
        width: 8,
        value,
    })
}

/// Validate a value for a 16-bit field.
pub fn u16_field(field: &'static str, value: i64) -> Result<u16> {
    u16::try_from(value).map_err(|_| EncodeError::FieldOutOfRange {
        field,
        width: 16,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u8_bounds() {
        assert_eq!(u8_field("r", 0), Ok(0));
        assert_eq!(u8_field("r", 255), Ok(255));
        assert_eq!(
            u8_field("r", 256),
            Err(EncodeError::FieldOutOfRange {
                field: "r",
                width: 8,
                value: 256
            })
        );
        assert!(u8_field("r", -1).is_err());
    }

    #[test]
    fn u16_bounds() {
        assert_eq!(u16_field("tick", 65_535), Ok(65_535));
        assert!(u16_field("tick", 65_536).is_err());
        assert!(u16_field("tick", i64::MIN).is_err());
    }
}
