//! Signed base-36 integers as used in tile file and directory names.

use crate::error::MapError;
use crate::types::Result;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Parses a base-36 integer with an optional leading `-`.
/// Only lowercase digits are accepted.
pub fn from_base36(s: &str) -> Result<i32> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if digits.is_empty() {
        return Err(MapError::format(format!("empty base-36 number {:?}", s)));
    }

    let mut value: i64 = 0;
    for c in digits.bytes() {
        let digit = match c {
            b'0'..=b'9' => c - b'0',
            b'a'..=b'z' => c - b'a' + 10,
            _ => {
                return Err(MapError::format(format!(
                    "invalid base-36 digit {:?} in {:?}",
                    c as char, s
                )))
            }
        };
        value = value * 36 + digit as i64;
        if value > i32::MAX as i64 + 1 {
            return Err(MapError::format(format!("base-36 number {:?} overflows", s)));
        }
    }

    let value = if negative { -value } else { value };
    i32::try_from(value).map_err(|_| MapError::format(format!("base-36 number {:?} overflows", s)))
}

/// Formats an integer in base 36 without leading zeros.
pub fn to_base36(n: i32) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut magnitude = (n as i64).unsigned_abs();
    let mut out = Vec::new();
    while magnitude > 0 {
        out.push(DIGITS[(magnitude % 36) as usize]);
        magnitude /= 36;
    }
    if n < 0 {
        out.push(b'-');
    }
    out.iter().rev().map(|&b| b as char).collect()
}

/// Name of the shard directory holding tiles whose coordinate is `coord`.
pub fn shard_dir_name(coord: i32) -> String {
    to_base36(coord.rem_euclid(64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_known_values() {
        assert_eq!(from_base36("0").unwrap(), 0);
        assert_eq!(from_base36("z").unwrap(), 35);
        assert_eq!(from_base36("10").unwrap(), 36);
        assert_eq!(from_base36("-1").unwrap(), -1);
        assert_eq!(from_base36("-13").unwrap(), -39);
        assert_eq!(from_base36("1s").unwrap(), 64);
    }

    #[test]
    fn test_round_trip_normalized() {
        for s in ["0", "1", "a", "-a", "zz", "-zz", "1s", "abc", "-10", "zik0zj"] {
            assert_eq!(to_base36(from_base36(s).unwrap()), s);
        }
        for n in [-100_000, -37, -36, -35, -1, 0, 1, 35, 36, 63, 64, 99_999] {
            assert_eq!(from_base36(&to_base36(n)).unwrap(), n);
        }
    }

    #[test]
    fn test_extreme_values() {
        assert_eq!(from_base36(&to_base36(i32::MAX)).unwrap(), i32::MAX);
        assert_eq!(from_base36(&to_base36(i32::MIN)).unwrap(), i32::MIN);
        assert_matches!(from_base36("zzzzzzzzz"), Err(MapError::FormatError(_)));
    }

    #[test]
    fn test_rejects_invalid_characters() {
        assert_matches!(from_base36(""), Err(MapError::FormatError(_)));
        assert_matches!(from_base36("-"), Err(MapError::FormatError(_)));
        assert_matches!(from_base36("A"), Err(MapError::FormatError(_)));
        assert_matches!(from_base36("1_2"), Err(MapError::FormatError(_)));
        assert_matches!(from_base36("1-2"), Err(MapError::FormatError(_)));
        assert_matches!(from_base36("+5"), Err(MapError::FormatError(_)));
    }

    #[test]
    fn test_shard_dir_name_folds_negative() {
        assert_eq!(shard_dir_name(0), "0");
        assert_eq!(shard_dir_name(63), "1r");
        assert_eq!(shard_dir_name(64), "0");
        assert_eq!(shard_dir_name(-1), "1r");
        assert_eq!(shard_dir_name(-13), "1f");
    }
}
