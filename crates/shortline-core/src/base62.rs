//! Base62 encoding of non-negative integers.
//!
//! The alphabet is fixed: digits, then uppercase, then lowercase. Encodings
//! are most significant symbol first and carry no padding, so every value
//! has exactly one representation.

use crate::error::CoreError;

pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const BASE: u64 = 62;

/// Longest encoding of a `u64` (`62^10 < 2^64 < 62^11`).
const MAX_ENCODED_LEN: usize = 11;

/// Encodes `value` in base62. Zero encodes to `"0"`.
pub fn encode(mut value: u64) -> String {
    if value == 0 {
        return (ALPHABET[0] as char).to_string();
    }

    let mut buf = [0_u8; MAX_ENCODED_LEN];
    let mut pos = MAX_ENCODED_LEN;
    while value > 0 {
        pos -= 1;
        buf[pos] = ALPHABET[(value % BASE) as usize];
        value /= BASE;
    }

    // Every byte comes from the ASCII alphabet.
    buf[pos..].iter().map(|&b| b as char).collect()
}

/// Decodes a base62 string produced by [`encode`].
///
/// Rejects empty input, symbols outside the alphabet, redundant leading
/// zeros, and values that overflow a `u64`.
pub fn decode(encoded: &str) -> Result<u64, CoreError> {
    if encoded.is_empty() {
        return Err(CoreError::InvalidShortCode(
            "base62 string cannot be empty".to_string(),
        ));
    }
    if encoded.len() > 1 && encoded.starts_with(ALPHABET[0] as char) {
        return Err(CoreError::InvalidShortCode(format!(
            "base62 string has a leading zero: '{encoded}'"
        )));
    }

    encoded.bytes().try_fold(0_u64, |acc, byte| {
        let digit = symbol_value(byte).ok_or_else(|| {
            CoreError::InvalidShortCode(format!(
                "'{}' is not a base62 symbol in '{encoded}'",
                byte as char
            ))
        })?;
        acc.checked_mul(BASE)
            .and_then(|acc| acc.checked_add(digit))
            .ok_or_else(|| CoreError::InvalidShortCode(format!("base62 value overflows: '{encoded}'")))
    })
}

/// Returns whether `byte` belongs to the alphabet.
pub fn is_symbol(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
}

fn symbol_value(byte: u8) -> Option<u64> {
    let value = match byte {
        b'0'..=b'9' => byte - b'0',
        b'A'..=b'Z' => byte - b'A' + 10,
        b'a'..=b'z' => byte - b'a' + 36,
        _ => return None,
    };
    Some(u64::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_encodes_to_first_symbol() {
        assert_eq!(encode(0), "0");
    }

    #[test]
    fn known_values() {
        assert_eq!(encode(9), "9");
        assert_eq!(encode(10), "A");
        assert_eq!(encode(35), "Z");
        assert_eq!(encode(36), "a");
        assert_eq!(encode(61), "z");
        assert_eq!(encode(62), "10");
        assert_eq!(encode(3843), "zz");
        assert_eq!(encode(3844), "100");
    }

    #[test]
    fn u64_max_uses_eleven_symbols() {
        let encoded = encode(u64::MAX);
        assert_eq!(encoded, "LygHa16AHYF");
        assert_eq!(encoded.len(), MAX_ENCODED_LEN);
    }

    #[test]
    fn symbol_values_follow_alphabet_order() {
        for (index, &byte) in ALPHABET.iter().enumerate() {
            assert_eq!(symbol_value(byte), Some(index as u64));
            assert!(is_symbol(byte));
        }
        assert!(!is_symbol(b'-'));
    }

    #[test]
    fn decode_inverts_encode() {
        let boundaries = [
            0,
            1,
            61,
            62,
            63,
            3843,
            3844,
            u64::from(u32::MAX),
            i64::MAX as u64,
            u64::MAX - 1,
            u64::MAX,
        ];
        for value in boundaries {
            assert_eq!(decode(&encode(value)).unwrap(), value, "value {value}");
        }

        // a multiplicative walk covers every encoded length
        let mut value = 1_u64;
        while let Some(next) = value.checked_mul(7) {
            assert_eq!(decode(&encode(value)).unwrap(), value);
            assert_eq!(decode(&encode(value + 1)).unwrap(), value + 1);
            value = next;
        }
    }

    #[test]
    fn encoding_preserves_order_within_same_length() {
        let a = encode(1_000_000);
        let b = encode(1_000_001);
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }

    #[test]
    fn decode_rejects_empty() {
        assert!(matches!(decode(""), Err(CoreError::InvalidShortCode(_))));
    }

    #[test]
    fn decode_rejects_foreign_symbols() {
        assert!(decode("ab-c").is_err());
        assert!(decode("abc def").is_err());
        assert!(decode("héllo").is_err());
    }

    #[test]
    fn decode_rejects_leading_zero() {
        assert!(decode("0").is_ok());
        assert!(decode("01").is_err());
    }

    #[test]
    fn decode_rejects_overflow() {
        assert!(decode("LygHa16AHYG").is_err());
        assert!(decode("zzzzzzzzzzzz").is_err());
    }
}
