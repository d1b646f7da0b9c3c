//! Short code encoding.
//!
//! A short code is the owner's tier tag followed by the Hashids encoding of
//! one integer: the decimal concatenation of the tier number and an
//! allocated counter value.
//!
//! ```text
//! tier = std (1), counter = 42  →  value = 142  →  code = "std" + encode(142)
//! ```
//!
//! The encoding is a salted bijection, not a cipher: it hides sequence
//! numbers from casual inspection but is not secure. Uniqueness comes from
//! the allocator handing out distinct counters.

use harsh::Harsh;
use regex::Regex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;
use thiserror::Error;

use crate::domain::tier::Tier;

/// Cheap syntactic pre-check run before decoding.
static SHORT_CODE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(std|pro)[A-Za-z0-9]{1,64}$").expect("short code pattern is valid")
});

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("Invalid encoder settings: {0}")]
    Build(String),
    #[error("Counter {0} does not fit in a short code")]
    Overflow(u64),
}

/// A well-formed short code, taken apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCode {
    pub tier: Tier,
    pub counter: u64,
}

/// Salted Hashids encoder with a minimum output length.
#[derive(Debug, Clone)]
pub struct CodeEncoder {
    harsh: Harsh,
    /// Length of the encoding of `u64::MAX`; no canonical input is longer.
    max_encoded_len: usize,
}

impl CodeEncoder {
    /// # Errors
    ///
    /// Returns [`EncoderError::Build`] if the salt is rejected by Hashids.
    pub fn new(salt: &str, min_length: usize) -> Result<Self, EncoderError> {
        let harsh = Harsh::builder()
            .salt(salt)
            .length(min_length)
            .build()
            .map_err(|e| EncoderError::Build(e.to_string()))?;
        let max_encoded_len = harsh.encode(&[u64::MAX]).len();

        Ok(Self {
            harsh,
            max_encoded_len,
        })
    }

    pub fn encode(&self, value: u64) -> String {
        self.harsh.encode(&[value])
    }

    /// Decodes a string produced by [`Self::encode`].
    ///
    /// Returns an empty vector for anything that is not a canonical encoding
    /// under this salt; never an error and never a panic.
    pub fn decode(&self, input: &str) -> Vec<u64> {
        if input.is_empty() || input.len() > self.max_encoded_len {
            return Vec::new();
        }

        // Hashids arithmetic is unchecked and overflows on some alphabet-only
        // inputs; with overflow checks on that surfaces as a panic.
        let decoded = panic::catch_unwind(AssertUnwindSafe(|| self.harsh.decode(input)));

        match decoded {
            Ok(Ok(values)) if !values.is_empty() && self.harsh.encode(&values) == input => values,
            _ => Vec::new(),
        }
    }

    /// Builds the short code for `counter` issued to a `tier` owner.
    ///
    /// # Errors
    ///
    /// Returns [`EncoderError::Overflow`] if the concatenated value does not fit in `u64`.
    pub fn short_code(&self, tier: Tier, counter: u64) -> Result<String, EncoderError> {
        let value = tagged_value(tier, counter).ok_or(EncoderError::Overflow(counter))?;
        Ok(format!("{}{}", tier.tag(), self.encode(value)))
    }

    /// Validates a short code and recovers its tier and counter.
    ///
    /// Returns `None` unless the tag is a known tier, the remainder decodes
    /// to exactly one integer, and that integer starts with the tag's tier
    /// number.
    pub fn parse_short_code(&self, code: &str) -> Option<ParsedCode> {
        if !SHORT_CODE_REGEX.is_match(code) {
            return None;
        }
        let (tier, encoded) = Tier::split_code(code)?;

        let [value] = self.decode(encoded)[..] else {
            return None;
        };

        let digits = value.to_string();
        let (leading, rest) = digits.split_at(1);
        if leading != tier.number().to_string() || rest.is_empty() {
            return None;
        }

        let counter: u64 = rest.parse().ok()?;
        // "105" would claim counter "05", which no allocation produces.
        (counter.to_string() == rest).then_some(ParsedCode { tier, counter })
    }
}

/// `tier.number()` followed by the decimal digits of `counter`.
fn tagged_value(tier: Tier, counter: u64) -> Option<u64> {
    let digits = counter.checked_ilog10().map_or(1, |d| d + 1);
    10u64
        .checked_pow(digits)?
        .checked_mul(u64::from(tier.number()))?
        .checked_add(counter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encoder() -> CodeEncoder {
        CodeEncoder::new("test-salt", 7).unwrap()
    }

    #[test]
    fn test_encode_respects_min_length() {
        let enc = encoder();
        for n in [0, 1, 9, 10, 12345] {
            assert!(enc.encode(n).len() >= 7, "{} too short", n);
        }
    }

    #[test]
    fn test_encoding_depends_on_salt() {
        let other = CodeEncoder::new("other-salt", 7).unwrap();
        assert_ne!(encoder().encode(42), other.encode(42));
    }

    #[test]
    fn test_malformed_inputs_decode_to_empty() {
        let enc = encoder();
        for input in ["", " ", "abc-def", "héllo", "!!!!!!!", "ab cd"] {
            assert!(enc.decode(input).is_empty(), "{input:?} decoded");
        }
    }

    #[test]
    fn test_overflowing_alphabet_input_decodes_to_empty() {
        let enc = encoder();
        let longest = enc.encode(u64::MAX);
        assert_eq!(enc.decode(&longest), vec![u64::MAX]);
        assert!(enc.decode(&format!("{longest}a")).is_empty());

        for input in ["MvWG56JvJ1d0Y", "zzzzzzzzzzzzzzzz", "ZZZZZZZZZZZZZ9"] {
            assert!(enc.decode(input).is_empty(), "{input:?} decoded");
        }
        assert_eq!(enc.parse_short_code("stdMvWG56JvJ1d0Y"), None);
    }

    #[test]
    fn test_tagged_value_concatenates_digits() {
        assert_eq!(tagged_value(Tier::Standard, 0), Some(10));
        assert_eq!(tagged_value(Tier::Standard, 42), Some(142));
        assert_eq!(tagged_value(Tier::Premium, 1000), Some(21000));
        assert_eq!(tagged_value(Tier::Premium, u64::MAX), None);
    }

    #[test]
    fn test_short_code_round_trip() {
        let enc = encoder();
        let code = enc.short_code(Tier::Standard, 42).unwrap();

        assert!(code.starts_with("std"));
        assert_eq!(enc.decode(&code[3..]), vec![142]);
        assert_eq!(
            enc.parse_short_code(&code),
            Some(ParsedCode {
                tier: Tier::Standard,
                counter: 42
            })
        );
    }

    #[test]
    fn test_parse_rejects_mismatched_tier_digit() {
        let enc = encoder();
        let std_code = enc.short_code(Tier::Standard, 7).unwrap();
        let relabelled = format!("pro{}", &std_code[3..]);
        assert_eq!(enc.parse_short_code(&relabelled), None);
    }

    #[test]
    fn test_parse_rejects_unknown_tag_and_garbage() {
        let enc = encoder();
        let code = enc.short_code(Tier::Premium, 5).unwrap();
        assert_eq!(enc.parse_short_code(&format!("xyz{}", &code[3..])), None);
        assert_eq!(enc.parse_short_code("std"), None);
        assert_eq!(enc.parse_short_code("std!!!"), None);
        assert_eq!(enc.parse_short_code(""), None);
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(n in any::<u64>()) {
            let enc = encoder();
            prop_assert_eq!(enc.decode(&enc.encode(n)), vec![n]);
        }

        #[test]
        fn prop_non_alphabet_input_decodes_to_empty(
            s in "[a-z0-9]{0,8}[-_ !@#.~]{1,3}[a-z0-9]{0,8}"
        ) {
            prop_assert!(encoder().decode(&s).is_empty());
        }

        #[test]
        fn prop_alphabet_input_never_panics(s in "[A-Za-z0-9]{1,16}") {
            let enc = encoder();
            let decoded = enc.decode(&s);
            if let [value] = decoded[..] {
                prop_assert_eq!(enc.encode(value), s.clone());
            }
            for tag in ["std", "pro"] {
                let code = format!("{tag}{s}");
                if let Some(parsed) = enc.parse_short_code(&code) {
                    prop_assert_eq!(enc.short_code(parsed.tier, parsed.counter).unwrap(), code);
                }
            }
        }

        #[test]
        fn prop_short_codes_parse_back(counter in 0u64..1_000_000_000_000, premium in any::<bool>()) {
            let enc = encoder();
            let tier = if premium { Tier::Premium } else { Tier::Standard };
            let code = enc.short_code(tier, counter).unwrap();
            prop_assert_eq!(enc.parse_short_code(&code), Some(ParsedCode { tier, counter }));
        }
    }
}
