//! Validator key handles and signatures as produced by the node console.
//!
//! The console never hands out key material; it returns opaque handles
//! (key hashes) and base64 public keys/signatures. These wrappers keep the
//! different strings from being mixed up.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseError;

/// TL constructor id prefixing an exported ed25519 public key.
const ED25519_PUB_PREFIX: [u8; 4] = [0xc6, 0xb4, 0x13, 0x48];

/// The three kinds of per-election key a node needs in order to bid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyType {
    /// Validator signing key, registered as permanent and temporary key.
    Signing,
    /// Public half of the signing key, exported from the node.
    Public,
    /// Network-address (ADNL) key.
    Adnl,
}

impl KeyType {
    pub const ALL: [KeyType; 3] = [KeyType::Signing, KeyType::Public, KeyType::Adnl];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Signing => "signing",
            KeyType::Public => "public",
            KeyType::Adnl => "adnl",
        }
    }

    /// Single-byte tag used in composite storage keys.
    pub fn tag(&self) -> u8 {
        match self {
            KeyType::Signing => 0,
            KeyType::Public => 1,
            KeyType::Adnl => 2,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signing" => Ok(KeyType::Signing),
            "public" => Ok(KeyType::Public),
            "adnl" => Ok(KeyType::Adnl),
            other => Err(ParseError::InvalidKeyType(other.to_string())),
        }
    }
}

/// Opaque key handle string returned by the node console.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyHandle(String);

impl KeyHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex form of an exported public key, as expected by elector get-methods.
    ///
    /// The console exports `base64(c6b41348 || key)`; the TL prefix is dropped.
    pub fn public_key_hex(&self) -> Result<String, ParseError> {
        let bytes = STANDARD
            .decode(self.0.trim())
            .map_err(|e| ParseError::InvalidPublicKey(format!("{}: {e}", self.0)))?;
        let key = bytes
            .strip_prefix(&ED25519_PUB_PREFIX[..])
            .unwrap_or(&bytes[..]);
        if key.len() != 32 {
            return Err(ParseError::InvalidPublicKey(format!(
                "{}: expected 32 key bytes, got {}",
                self.0,
                key.len()
            )));
        }
        Ok(hex::encode(key))
    }
}

impl fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A signature produced by the node console over an election request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(String);

impl Signature {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maximum ratio between this validator's stake and the smallest stake in
/// the elected set. Must be at least 1.0.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct MaxFactor(f64);

impl MaxFactor {
    /// Factor used when none is configured.
    pub const DEFAULT: Self = Self(2.7);

    pub fn new(value: f64) -> Result<Self, ParseError> {
        if !value.is_finite() || value < 1.0 {
            return Err(ParseError::InvalidMaxFactor {
                value: value.to_string(),
                reason: "must be a finite number >= 1.0".to_string(),
            });
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for MaxFactor {
    type Error = ParseError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MaxFactor> for f64 {
    fn from(f: MaxFactor) -> Self {
        f.0
    }
}

impl FromStr for MaxFactor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<f64>().map_err(|e| ParseError::InvalidMaxFactor {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Self::new(value)
    }
}

impl fmt::Display for MaxFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
