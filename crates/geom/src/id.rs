use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A 128-bit identity of a grid or a shape.
///
/// Identities are usually chosen by remote peers (so that they can address
/// the object later without waiting for a reply) or generated randomly when
/// an object is created locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u128);

impl ObjectId {
    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    /// Creates an identity from its most and least significant halves.
    pub const fn from_halves(msb: u64, lsb: u64) -> Self {
        Self(((msb as u128) << 64) | lsb as u128)
    }

    /// Returns a new random identity.
    pub fn random() -> Self {
        Self(fastrand::u128(..))
    }

    pub const fn as_u128(self) -> u128 {
        self.0
    }

    /// Returns most and least significant 64 bits of the identity.
    pub const fn halves(self) -> (u64, u64) {
        ((self.0 >> 64) as u64, self.0 as u64)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl FromStr for ObjectId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > 32 {
            return Err(IdParseError(s.to_owned()));
        }
        u128::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| IdParseError(s.to_owned()))
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

#[derive(Error, Debug)]
#[error("`{0}` is not a valid object ID")]
pub struct IdParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halves() {
        let id = ObjectId::from_halves(0x0123_4567_89ab_cdef, 0xfedc_ba98_7654_3210);
        assert_eq!(id.as_u128(), 0x0123_4567_89ab_cdef_fedc_ba98_7654_3210);
        assert_eq!(id.halves(), (0x0123_4567_89ab_cdef, 0xfedc_ba98_7654_3210));
    }

    #[test]
    fn test_text() {
        let id = ObjectId::from_u128(0xabc);
        assert_eq!(id.to_string(), "00000000000000000000000000000abc");
        assert_eq!("abc".parse::<ObjectId>().unwrap(), id);
        assert!("".parse::<ObjectId>().is_err());
        assert!("xyz".parse::<ObjectId>().is_err());

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000000000000000000000000abc\"");
        assert_eq!(serde_json::from_str::<ObjectId>(&json).unwrap(), id);
    }
}
