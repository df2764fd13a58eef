//! 32-byte identifiers used across the directory chain.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error parsing a 32-byte identifier from its hex encoding.
#[derive(Debug, thiserror::Error)]
pub enum IdParseError {
    /// Input was not valid hex.
    #[error("invalid hex. {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// Decoded length was not 32 bytes.
    #[error("invalid length. expected 32 bytes, found {0}")]
    InvalidLength(usize),
}

fn parse_32(s: &str) -> Result<[u8; 32], IdParseError> {
    let bytes = hex::decode(s)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| IdParseError::InvalidLength(len))
}

/// A 32-byte identifier: chain ID, KeyMR, entry hash or factoid transaction ID.
///
/// Encoded as lowercase hex wherever it crosses a text boundary.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bytes32([u8; 32]);

impl Bytes32 {
    /// Constructs an identifier from its raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes32({})", hex::encode(self.0))
    }
}

impl FromStr for Bytes32 {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_32(s).map(Self)
    }
}

impl TryFrom<String> for Bytes32 {
    type Error = IdParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Bytes32> for String {
    fn from(id: Bytes32) -> Self {
        id.to_string()
    }
}

/// A 32-byte public-key identifier for a native- or sidechain account.
///
/// Native burn inputs are reinterpreted as sidechain accounts by direct byte
/// copy, so one type serves both sides.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 32]);

impl Address {
    /// Constructs an address from its raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_32(s).map(Self)
    }
}

impl TryFrom<String> for Address {
    type Error = IdParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}
