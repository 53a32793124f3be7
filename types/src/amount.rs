//! Coin amounts.
//!
//! Amounts are fixed-point integers in nanocoins (10^-9 of a coin) to avoid
//! floating-point errors. Display renders whole coins with nine decimals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

use crate::ParseError;

/// Nanocoins per whole coin.
pub const NANOS_PER_COIN: u64 = 1_000_000_000;

/// An amount in nanocoins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Nanotons(u64);

impl Nanotons {
    pub const ZERO: Self = Self(0);

    pub fn new(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Whole coins, saturating at `u64::MAX` nanocoins.
    pub fn from_coins(coins: u64) -> Self {
        Self(coins.saturating_mul(NANOS_PER_COIN))
    }

    pub fn nanos(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Parse a decimal coin string such as `"20000"`, `"1.5"` or `"0.000000001"`.
    pub fn parse_coins(s: &str) -> Result<Self, ParseError> {
        let s = s.trim();
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(ParseError::InvalidAmount(s.to_string()));
        }
        if frac.len() > 9 || !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(ParseError::InvalidAmount(s.to_string()));
        }
        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| ParseError::InvalidAmount(s.to_string()))?
        };
        let frac_nanos: u64 = if frac.is_empty() {
            0
        } else {
            format!("{:0<9}", frac)
                .parse()
                .map_err(|_| ParseError::InvalidAmount(s.to_string()))?
        };
        whole
            .checked_mul(NANOS_PER_COIN)
            .and_then(|n| n.checked_add(frac_nanos))
            .map(Self)
            .ok_or_else(|| ParseError::InvalidAmount(s.to_string()))
    }
}

impl Add for Nanotons {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Nanotons {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Nanotons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:09}",
            self.0 / NANOS_PER_COIN,
            self.0 % NANOS_PER_COIN
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_nine_decimals() {
        assert_eq!(Nanotons::new(5_000_000_000).to_string(), "5.000000000");
        assert_eq!(Nanotons::new(1).to_string(), "0.000000001");
        assert_eq!(Nanotons::from_coins(20_000).to_string(), "20000.000000000");
    }

    #[test]
    fn parse_coins_accepts_fractions() {
        assert_eq!(Nanotons::parse_coins("1.5").unwrap(), Nanotons::new(1_500_000_000));
        assert_eq!(Nanotons::parse_coins("20000").unwrap(), Nanotons::from_coins(20_000));
        assert_eq!(Nanotons::parse_coins(".25").unwrap(), Nanotons::new(250_000_000));
    }

    #[test]
    fn parse_coins_rejects_garbage() {
        assert!(Nanotons::parse_coins("").is_err());
        assert!(Nanotons::parse_coins("1.0000000001").is_err());
        assert!(Nanotons::parse_coins("-3").is_err());
        assert!(Nanotons::parse_coins("99999999999999999999").is_err());
    }
}
