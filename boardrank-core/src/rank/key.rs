//! Fractional rank keys
//!
//! A [`RankKey`] is a base-62 fraction `0.d1d2d3...` written as its digit
//! string. The alphabet is `0-9A-Za-z`, which is ascending in ASCII, so plain
//! byte-wise string comparison orders keys numerically. Keys never end in
//! `'0'`, which gives every fraction exactly one spelling and guarantees that
//! a key strictly between any two distinct keys always exists.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RankError, RankResult};

/// Digits of the rank alphabet, in ascending order
pub const DIGITS: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Number of digits in the alphabet
pub const BASE: u8 = 62;

/// Key handed out for the first item of an empty partition
pub const MID_KEY: &str = "V";

/// Default practical key length before a partition is rebalanced
pub const DEFAULT_MAX_RANK_LEN: usize = 128;

const MAX_DIGIT: u8 = BASE - 1;

/// Totally ordered, densely insertable sort key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RankKey(String);

impl RankKey {
    /// Parses and validates a key
    ///
    /// # Errors
    ///
    /// Returns [`RankError::InvalidKey`] if the text is empty, contains a
    /// character outside the alphabet, or ends with the zero digit.
    pub fn parse(text: &str) -> RankResult<Self> {
        let invalid = |reason| RankError::InvalidKey {
            key: text.to_string(),
            reason,
        };
        if text.is_empty() {
            return Err(invalid("empty key"));
        }
        if text.bytes().any(|b| digit_value(b).is_none()) {
            return Err(invalid("character outside base-62 alphabet"));
        }
        if text.ends_with('0') {
            return Err(invalid("trailing zero digit"));
        }
        Ok(Self(text.to_string()))
    }

    /// The canonical mid-range key used for an empty partition
    #[must_use]
    pub fn mid() -> Self {
        Self(MID_KEY.to_string())
    }

    /// Returns the key text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of digits in the key
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Generates a key strictly between `lower` and `upper`
    ///
    /// A missing bound stands for the edge of the keyspace. With no bounds
    /// the canonical mid key is returned. The result grows longer than its
    /// neighbours only when they are adjacent at their current precision, and
    /// the computation always terminates.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::OutOfOrder`] if `lower >= upper`.
    pub fn between(lower: Option<&Self>, upper: Option<&Self>) -> RankResult<Self> {
        let digits = match (lower, upper) {
            (None, None) => return Ok(Self::mid()),
            (Some(lo), None) => increment(&to_digits(lo)),
            (None, Some(hi)) => decrement(&to_digits(hi)),
            (Some(lo), Some(hi)) => {
                if lo >= hi {
                    return Err(RankError::OutOfOrder {
                        lower: lo.0.clone(),
                        upper: hi.0.clone(),
                    });
                }
                midpoint(&to_digits(lo), Some(&to_digits(hi)))
            }
        };
        Ok(from_digits(&digits))
    }

    /// Like [`RankKey::between`] but reports exhaustion past `max_len`
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Exhausted`] when the generated key would be
    /// longer than `max_len`, and [`RankError::OutOfOrder`] for bad bounds.
    pub fn between_bounded(
        lower: Option<&Self>,
        upper: Option<&Self>,
        max_len: usize,
    ) -> RankResult<Self> {
        let key = Self::between(lower, upper)?;
        if key.len() > max_len {
            return Err(RankError::Exhausted {
                lower: lower.map(|k| k.0.clone()),
                upper: upper.map(|k| k.0.clone()),
                max_len,
            });
        }
        Ok(key)
    }

    /// Generates `count` evenly spaced, strictly increasing keys
    ///
    /// Uses the narrowest width that fits `count` distinct keys, so the
    /// result leaves room on both sides and between every pair.
    #[must_use]
    pub fn spread(count: usize) -> Vec<Self> {
        if count == 0 {
            return Vec::new();
        }
        let slots = count as u128 + 1;
        let mut width = 1usize;
        let mut span = u128::from(BASE);
        while span < slots {
            width += 1;
            span *= u128::from(BASE);
        }

        (1..slots)
            .map(|j| {
                let mut value = j * span / slots;
                let mut digits = vec![0u8; width];
                for slot in digits.iter_mut().rev() {
                    *slot = (value % u128::from(BASE)) as u8;
                    value /= u128::from(BASE);
                }
                from_digits(&digits)
            })
            .collect()
    }
}

impl fmt::Display for RankKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RankKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RankKey {
    type Error = RankError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RankKey> for String {
    fn from(key: RankKey) -> Self {
        key.0
    }
}

impl std::str::FromStr for RankKey {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Numeric value of a digit character
#[must_use]
pub const fn digit_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'Z' => Some(byte - b'A' + 10),
        b'a'..=b'z' => Some(byte - b'a' + 36),
        _ => None,
    }
}

fn to_digits(key: &RankKey) -> Vec<u8> {
    // Keys are validated on construction.
    key.0.bytes().filter_map(digit_value).collect()
}

fn from_digits(digits: &[u8]) -> RankKey {
    let end = digits.iter().rposition(|&d| d != 0).map_or(0, |i| i + 1);
    let text = digits[..end]
        .iter()
        .map(|&d| char::from(DIGITS[usize::from(d)]))
        .collect();
    RankKey(text)
}

/// Digit-wise midpoint of `a` and `b`, where a missing `b` means 1.0
///
/// `a` may be empty (0.0). Requires `a < b`; `b` has no trailing zeros.
fn midpoint(a: &[u8], b: Option<&[u8]>) -> Vec<u8> {
    let digit_a = |i: usize| a.get(i).copied().unwrap_or(0);

    if let Some(b) = b {
        let shared = b
            .iter()
            .enumerate()
            .take_while(|&(i, &d)| digit_a(i) == d)
            .count();
        if shared > 0 {
            let mut out = b[..shared].to_vec();
            let rest_a = a.get(shared..).unwrap_or(&[]);
            out.extend(midpoint(rest_a, Some(&b[shared..])));
            return out;
        }
    }

    let low = digit_a(0);
    let high = b.map_or(BASE, |b| b[0]);
    if high - low > 1 {
        return vec![(low + high) / 2];
    }

    // Leading digits are adjacent.
    match b {
        Some(b) if b.len() > 1 => vec![b[0]],
        _ => {
            let mut out = vec![low];
            out.extend(midpoint(a.get(1..).unwrap_or(&[]), None));
            out
        }
    }
}

/// Smallest-change key above `key`: bump the first digit that can grow
fn increment(key: &[u8]) -> Vec<u8> {
    match key.iter().position(|&d| d < MAX_DIGIT) {
        Some(i) => {
            let mut out = key[..=i].to_vec();
            out[i] += 1;
            out
        }
        None => midpoint(key, None),
    }
}

/// Smallest-change key below `key`: lower the first digit that can shrink
fn decrement(key: &[u8]) -> Vec<u8> {
    match key.iter().position(|&d| d >= 2) {
        Some(i) => {
            let mut out = key[..=i].to_vec();
            out[i] -= 1;
            out
        }
        None => midpoint(&[], Some(key)),
    }
}
