//! Subscription tiers and the tag every short code starts with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length in bytes of every tier tag.
pub const TAG_LEN: usize = 3;

/// Subscription tier of the owner who created a short code.
///
/// The tier is encoded twice into each code: as the textual prefix
/// ([`Tier::tag`]) and as the leading decimal digit of the encoded integer
/// ([`Tier::number`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "std")]
    Standard,
    #[serde(rename = "pro")]
    Premium,
}

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::Standard, Tier::Premium];

    pub fn tag(self) -> &'static str {
        match self {
            Tier::Standard => "std",
            Tier::Premium => "pro",
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Tier::Standard => 1,
            Tier::Premium => 2,
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.number() == number)
    }

    /// Splits a short code into its tier and the encoded remainder.
    ///
    /// Returns `None` when the code does not start with a known tag.
    pub fn split_code(code: &str) -> Option<(Tier, &str)> {
        if !code.is_char_boundary(TAG_LEN) {
            return None;
        }
        let (tag, rest) = code.split_at(TAG_LEN);
        Self::from_tag(tag).map(|tier| (tier, rest))
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(&s.to_ascii_lowercase()).ok_or_else(|| format!("unknown tier '{s}'"))
    }
}
