//! On-chain account addresses.
//!
//! Two textual forms are accepted:
//! - raw: `<workchain>:<64 hex chars>` (e.g. `-1:3333...3333`)
//! - user-friendly: 48 characters of standard or URL-safe base64 wrapping
//!   `flags | workchain | hash[32] | crc16`.
//!
//! Both unpack to the same [`AccountAddress`]; the raw form is canonical.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseError;

const FRIENDLY_LEN: usize = 48;
const FRIENDLY_BYTES: usize = 36;

/// An unpacked account address: workchain id plus 256-bit account hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountAddress {
    workchain: i32,
    hash: [u8; 32],
}

impl AccountAddress {
    pub const fn new(workchain: i32, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    /// Parse either the raw or the user-friendly form.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let s = s.trim();
        if s.contains(':') {
            Self::parse_raw(s)
        } else {
            Self::parse_friendly(s)
        }
    }

    fn parse_raw(s: &str) -> Result<Self, ParseError> {
        let (wc, hash_hex) = s
            .split_once(':')
            .ok_or_else(|| ParseError::InvalidAddress(s.to_string()))?;
        let workchain = wc
            .parse::<i32>()
            .map_err(|_| ParseError::InvalidAddress(s.to_string()))?;
        let bytes = hex::decode(hash_hex).map_err(|_| ParseError::InvalidAddress(s.to_string()))?;
        let hash: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ParseError::InvalidAddress(s.to_string()))?;
        Ok(Self { workchain, hash })
    }

    fn parse_friendly(s: &str) -> Result<Self, ParseError> {
        if s.len() != FRIENDLY_LEN {
            return Err(ParseError::InvalidAddress(s.to_string()));
        }
        let bytes = if s.contains('-') || s.contains('_') {
            URL_SAFE.decode(s)
        } else {
            STANDARD.decode(s)
        }
        .map_err(|_| ParseError::InvalidAddress(s.to_string()))?;
        if bytes.len() != FRIENDLY_BYTES {
            return Err(ParseError::InvalidAddress(s.to_string()));
        }

        let expected = u16::from_be_bytes([bytes[34], bytes[35]]);
        if crc16_xmodem(&bytes[..34]) != expected {
            return Err(ParseError::ChecksumMismatch(s.to_string()));
        }

        let workchain = bytes[1] as i8 as i32;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);
        Ok(Self { workchain, hash })
    }

    pub fn workchain(&self) -> i32 {
        self.workchain
    }

    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Account hash as lowercase hex, the form elector get-methods take.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

/// CRC16/XMODEM (poly 0x1021, init 0) as used by user-friendly addresses.
fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, hex::encode_upper(self.hash))
    }
}

impl FromStr for AccountAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<AccountAddress> for String {
    fn from(addr: AccountAddress) -> Self {
        addr.to_string()
    }
}
