// Fixed-width identifiers rendered as 0x-prefixed hex.
//
// INVARIANTS:
// 1. Parsing accepts exactly the fixed byte width (with or without 0x)
// 2. Display output always round-trips through FromStr
// 3. Serialized form is the hex string, never a raw byte array

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

macro_rules! fixed_hex_type {
    ($name:ident, $len:expr) => {
        impl $name {
            pub const LEN: usize = $len;

            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                $name(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            /// Every byte set to `byte`; handy for fixtures.
            pub const fn repeat_byte(byte: u8) -> Self {
                $name([byte; $len])
            }

            /// Big-endian `value` in the low eight bytes.
            pub fn from_low_u64_be(value: u64) -> Self {
                let mut bytes = [0u8; $len];
                bytes[$len - 8..].copy_from_slice(&value.to_be_bytes());
                $name(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = AddressParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s.strip_prefix("0x").unwrap_or(s);
                let raw = hex::decode(digits)
                    .map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
                let bytes: [u8; $len] = raw.as_slice().try_into().map_err(|_| {
                    AddressParseError::InvalidLength {
                        expected: $len,
                        actual: raw.len(),
                    }
                })?;
                Ok($name(bytes))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Opaque participant identifier: validators, owners, the system caller,
/// reporters and the modules themselves all live in this space.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

/// Chain position anchor attached to a proposed change.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BlockHash([u8; 32]);

fixed_hex_type!(Address, 20);
fixed_hex_type!(BlockHash, 32);

impl Address {
    /// The empty address. Pointing a relay here severs the link.
    pub const ZERO: Address = Address([0u8; 20]);
}

impl BlockHash {
    pub const ZERO: BlockHash = BlockHash([0u8; 32]);
}
