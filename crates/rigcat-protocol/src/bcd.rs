//! Binary-coded decimal helpers shared by every codec
//!
//! A BCD field is a fixed-width run of decimal digits, most significant
//! first. The width comes from the field's largest representable value:
//! `encode(v, 9_999)` always yields 4 digits and `encode(v, 255)` yields 3.
//! Signs are never stored in the digits; callers carry them separately.
//!
//! Digits are packed two per byte (high nibble first) with [`pack`], or
//! byte-reversed for the little-endian CI-V frequency field.

use crate::error::ParseError;

/// Number of decimal digits needed for `max_value`
pub fn digit_width(max_value: i64) -> usize {
    let mut magnitude = max_value.unsigned_abs();
    let mut width = 1;
    while magnitude >= 10 {
        magnitude /= 10;
        width += 1;
    }
    width
}

/// Encode the magnitude of `value` as digits sized for `max_value`
///
/// Fails when the magnitude needs more digits than the field has.
pub fn encode(value: i64, max_value: i64) -> Result<Vec<u8>, ParseError> {
    let width = digit_width(max_value);
    let mut magnitude = value.unsigned_abs();
    let mut digits = vec![0u8; width];
    for slot in digits.iter_mut().rev() {
        *slot = (magnitude % 10) as u8;
        magnitude /= 10;
    }
    if magnitude != 0 {
        return Err(ParseError::BcdOverflow {
            value: value.unsigned_abs(),
            width,
        });
    }
    Ok(digits)
}

/// Weighted sum of most-significant-first digits
pub fn decode(digits: &[u8]) -> u64 {
    digits
        .iter()
        .fold(0u64, |acc, &d| acc * 10 + u64::from(d))
}

/// Pack digit pairs into bytes, high nibble first
///
/// An odd digit count is padded with a leading zero.
pub fn pack(digits: &[u8]) -> Vec<u8> {
    let mut padded = Vec::with_capacity(digits.len() + 1);
    if digits.len() % 2 == 1 {
        padded.push(0);
    }
    padded.extend_from_slice(digits);
    padded
        .chunks(2)
        .map(|pair| pack_pair(pair[0], pair[1]))
        .collect()
}

/// Combine two digits into one byte
pub fn pack_pair(high: u8, low: u8) -> u8 {
    (high << 4) | (low & 0x0F)
}

/// Split packed bytes back into digits, rejecting nibbles above 9
pub fn unpack(bytes: &[u8]) -> Result<Vec<u8>, ParseError> {
    let mut digits = Vec::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        for nibble in [byte >> 4, byte & 0x0F] {
            if nibble > 9 {
                return Err(ParseError::InvalidBcd(byte));
            }
            digits.push(nibble);
        }
    }
    Ok(digits)
}

/// Decode packed big-endian BCD bytes to an integer
pub fn decode_packed(bytes: &[u8]) -> Result<u64, ParseError> {
    unpack(bytes).map(|digits| decode(&digits))
}

/// Decode packed little-endian BCD bytes (least significant pair first)
pub fn decode_packed_le(bytes: &[u8]) -> Result<u64, ParseError> {
    let reversed: Vec<u8> = bytes.iter().rev().copied().collect();
    decode_packed(&reversed)
}

/// Encode `value` as packed little-endian BCD over `len` bytes
pub fn encode_packed_le(value: u64, len: usize) -> Result<Vec<u8>, ParseError> {
    let max = 10i64
        .checked_pow((len * 2) as u32)
        .map(|p| p - 1)
        .unwrap_or(i64::MAX);
    let value = i64::try_from(value).map_err(|_| ParseError::BcdOverflow {
        value,
        width: len * 2,
    })?;
    let mut packed = pack(&encode(value, max)?);
    packed.reverse();
    Ok(packed)
}

/// Render digits as an ASCII string (`[2,0,2,4]` -> `"2024"`)
pub fn to_digit_string(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

/// Parse an all-digit string of exactly `len` characters
pub fn from_digit_string(s: &str, len: usize) -> Result<Vec<u8>, ParseError> {
    if s.len() != len || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidArgument(format!(
            "expected {len} digits, got {s:?}"
        )));
    }
    Ok(s.bytes().map(|b| b - b'0').collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_width() {
        assert_eq!(digit_width(0), 1);
        assert_eq!(digit_width(9), 1);
        assert_eq!(digit_width(255), 3);
        assert_eq!(digit_width(2541), 4);
        assert_eq!(digit_width(-9_999_999), 7);
        assert_eq!(digit_width(99_999_999), 8);
    }

    #[test]
    fn test_encode_is_full_width() {
        assert_eq!(encode(7, 255).unwrap(), vec![0, 0, 7]);
        assert_eq!(encode(0, 9_999).unwrap(), vec![0, 0, 0, 0]);
        assert_eq!(encode(1_447, 2_541).unwrap(), vec![1, 4, 4, 7]);
    }

    #[test]
    fn test_encode_drops_sign() {
        assert_eq!(encode(-600, 9_999).unwrap(), vec![0, 6, 0, 0]);
    }

    #[test]
    fn test_encode_overflow() {
        assert_eq!(
            encode(1_000, 999),
            Err(ParseError::BcdOverflow {
                value: 1_000,
                width: 3
            })
        );
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode(&[0, 7, 0, 7, 4, 0, 0, 0]), 7_074_000);
        assert_eq!(decode(&[]), 0);
    }

    #[test]
    fn test_pack_and_unpack() {
        assert_eq!(pack(&[1, 4, 2, 5, 0, 0, 0, 0]), vec![0x14, 0x25, 0x00, 0x00]);
        assert_eq!(pack(&[2, 5, 5]), vec![0x02, 0x55]);
        assert_eq!(unpack(&[0x14, 0x25]).unwrap(), vec![1, 4, 2, 5]);
        assert_eq!(unpack(&[0x1A]), Err(ParseError::InvalidBcd(0x1A)));
    }

    #[test]
    fn test_packed_little_endian() {
        // 14.250.000 Hz in the CI-V frequency field
        let bytes = encode_packed_le(14_250_000, 5).unwrap();
        assert_eq!(bytes, vec![0x00, 0x00, 0x25, 0x14, 0x00]);
        assert_eq!(decode_packed_le(&bytes).unwrap(), 14_250_000);
    }

    #[test]
    fn test_digit_strings() {
        assert_eq!(to_digit_string(&[2, 0, 2, 4]), "2024");
        assert_eq!(from_digit_string("1230", 4).unwrap(), vec![1, 2, 3, 0]);
        assert!(from_digit_string("12a0", 4).is_err());
        assert!(from_digit_string("123", 4).is_err());
    }
}
