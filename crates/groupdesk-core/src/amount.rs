//! Integer money types.
//!
//! USD amounts are unsigned 256-bit integers in the smallest unit the
//! exchange quotes, so commission arithmetic never touches floating point.
//! Rates are held as basis points (`3000` is 30.00%) and travel on the
//! wire as percentages.

use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use alloy::primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Basis-point denominator.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Unsigned 256-bit USD amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UsdAmount(U256);

impl UsdAmount {
    pub const ZERO: Self = Self(U256::ZERO);

    #[inline]
    pub fn new(value: U256) -> Self {
        Self(value)
    }

    #[inline]
    pub fn from_u64(value: u64) -> Self {
        Self(U256::from(value))
    }

    #[inline]
    pub fn inner(&self) -> U256 {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Addition that pins at `U256::MAX` instead of wrapping.
    #[inline]
    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Integer average; zero when `count` is zero.
    pub fn average(self, count: usize) -> Self {
        if count == 0 {
            return Self::ZERO;
        }
        Self(self.0 / U256::from(count))
    }
}

impl fmt::Display for UsdAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UsdAmount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidAmount(format!(
                "{s:?} is not an unsigned integer"
            )));
        }
        U256::from_str_radix(trimmed, 10)
            .map(Self)
            .map_err(|e| CoreError::InvalidAmount(format!("{s}: {e}")))
    }
}

impl Add for UsdAmount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl AddAssign for UsdAmount {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl std::iter::Sum for UsdAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<u64> for UsdAmount {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl Serialize for UsdAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UsdAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl Visitor<'_> for AmountVisitor {
            type Value = UsdAmount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an unsigned integer or a decimal string of digits")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(UsdAmount::from_u64(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map(UsdAmount::from_u64)
                    .map_err(|_| E::custom("amount must not be negative"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Commission rate in basis points, capped at 100%.
///
/// Serializes as a percentage number (`30.5`) and deserializes from a
/// percentage given as a number or a string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommissionRate(u32);

impl CommissionRate {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(BPS_DENOMINATOR);

    /// Create from basis points. Rejects anything above 10000.
    pub fn from_bps(bps: u32) -> crate::Result<Self> {
        if bps > BPS_DENOMINATOR {
            return Err(CoreError::InvalidCommissionRate(format!(
                "{bps} bps exceeds {BPS_DENOMINATOR}"
            )));
        }
        Ok(Self(bps))
    }

    /// Create from a percentage with at most two decimal places (`30.5` -> 3050 bps).
    pub fn from_percent(percent: Decimal) -> crate::Result<Self> {
        let bps = percent * Decimal::ONE_HUNDRED;
        if bps.is_sign_negative() || bps.fract() != Decimal::ZERO {
            return Err(CoreError::InvalidCommissionRate(format!(
                "{percent}% is not a non-negative basis-point value"
            )));
        }
        let bps = bps
            .to_u32()
            .ok_or_else(|| CoreError::InvalidCommissionRate(format!("{percent}% out of range")))?;
        Self::from_bps(bps)
    }

    #[inline]
    pub fn bps(&self) -> u32 {
        self.0
    }

    /// Rate as a percentage (`3000` -> `30.00`).
    pub fn as_percent(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 2)
    }

    /// `floor(notional * bps / 10000)` without intermediate overflow.
    ///
    /// Splits the notional into quotient and remainder by the denominator so
    /// the only product that could overflow is bounded by `U256::MAX / 10000 * 10000`.
    pub fn apply(&self, notional: UsdAmount) -> UsdAmount {
        let denom = U256::from(BPS_DENOMINATOR);
        let rate = U256::from(self.0);
        let n = notional.inner();
        let whole = (n / denom) * rate;
        let partial = (n % denom) * rate / denom;
        UsdAmount(whole + partial)
    }
}

impl fmt::Display for CommissionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

impl Serialize for CommissionRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let percent = self.as_percent().to_f64().unwrap_or_default();
        serializer.serialize_f64(percent)
    }
}

impl<'de> Deserialize<'de> for CommissionRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PercentVisitor;

        impl<'de> Visitor<'de> for PercentVisitor {
            type Value = CommissionRate;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a commission percentage between 0 and 100")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                CommissionRate::from_percent(Decimal::from(v)).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                CommissionRate::from_percent(Decimal::from(v)).map_err(E::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                // Shortest round-trip text, so 12.25 stays 12.25.
                self.visit_str(&v.to_string())
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                let percent = Decimal::from_str(v.trim())
                    .map_err(|e| E::custom(format!("invalid commission rate {v:?}: {e}")))?;
                CommissionRate::from_percent(percent).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(PercentVisitor)
    }
}
