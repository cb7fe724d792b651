/*!
 * Core Types
 * Identities and operation selectors shared by the registry and its consumers
 */

use super::errors::ParseIdError;
use super::limits::{CLIENT_ID_LEN, SELECTOR_LEN};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Account identity of a caller, as asserted by the execution environment
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ClientId([u8; CLIENT_ID_LEN]);

impl ClientId {
    pub const fn new(bytes: [u8; CLIENT_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; CLIENT_ID_LEN] {
        &self.0
    }
}

impl From<[u8; CLIENT_ID_LEN]> for ClientId {
    fn from(bytes: [u8; CLIENT_ID_LEN]) -> Self {
        Self(bytes)
    }
}

/// Operation selector
///
/// Only equality matters. Selectors for guarded operations are derived from
/// the operation signature with [`OperationId::from_signature`], so two
/// distinct signatures map to distinct selectors with overwhelming
/// probability.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId([u8; SELECTOR_LEN]);

impl OperationId {
    pub const fn new(bytes: [u8; SELECTOR_LEN]) -> Self {
        Self(bytes)
    }

    /// First four bytes of Keccak-256 over the signature text,
    /// e.g. `"changeData(uint256)"`
    pub fn from_signature(signature: &str) -> Self {
        let digest = Keccak256::digest(signature.as_bytes());
        let mut bytes = [0u8; SELECTOR_LEN];
        bytes.copy_from_slice(&digest[..SELECTOR_LEN]);
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; SELECTOR_LEN] {
        &self.0
    }
}

impl From<[u8; SELECTOR_LEN]> for OperationId {
    fn from(bytes: [u8; SELECTOR_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<u32> for OperationId {
    fn from(v: u32) -> Self {
        Self(v.to_be_bytes())
    }
}

/// Parse `0x`-prefixed (or bare) hex into a fixed-width byte array
fn parse_hex<const N: usize>(kind: &'static str, input: &str) -> Result<[u8; N], ParseIdError> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);

    if digits.len() != N * 2 {
        return Err(ParseIdError::InvalidLength {
            kind,
            expected: N * 2,
            actual: digits.len(),
        });
    }

    let mut bytes = [0u8; N];
    hex::decode_to_slice(digits, &mut bytes).map_err(|e| ParseIdError::InvalidHex {
        kind,
        reason: e.to_string(),
    })?;
    Ok(bytes)
}

impl FromStr for ClientId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex::<CLIENT_ID_LEN>("client id", s).map(Self)
    }
}

impl FromStr for OperationId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex::<SELECTOR_LEN>("operation id", s).map(Self)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientId({})", self)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OperationId({})", self)
    }
}

// Both ids travel as hex strings so that logs and exported JSON read the same.

impl Serialize for ClientId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl Serialize for OperationId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

struct HexVisitor<T>(std::marker::PhantomData<T>);

impl<'de, T> Visitor<'de> for HexVisitor<T>
where
    T: FromStr<Err = ParseIdError>,
{
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a 0x-prefixed hex string")
    }

    fn visit_str<E>(self, value: &str) -> Result<T, E>
    where
        E: de::Error,
    {
        value.parse().map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for ClientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(HexVisitor(std::marker::PhantomData))
    }
}

impl<'de> Deserialize<'de> for OperationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(HexVisitor(std::marker::PhantomData))
    }
}
