//! # Money
//!
//! **CRITICAL: NO FLOATING POINT IN MONEY**
//!
//! Money is a count of copper coins. Every percentage that touches a price
//! (reputation discount, aura price modifier, repair discount) is expressed in
//! basis points and evaluated with `u128` intermediates, so two servers always
//! agree on the price of an item down to the last copper.
//!
//! ## Denominations
//!
//! - 1 silver = 100 copper
//! - 1 gold = 100 silver

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

use crate::error::{InventoryError, InventoryResult};

/// 100%, in basis points.
pub const BASIS_POINTS: u32 = 10_000;

/// Copper per silver.
const COPPER_PER_SILVER: u64 = 100;

/// Copper per gold.
const COPPER_PER_GOLD: u64 = 10_000;

/// An amount of money, in copper.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(u64);

impl Money {
    /// No money.
    pub const ZERO: Self = Self(0);

    /// Largest representable amount.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates an amount from copper.
    #[inline]
    #[must_use]
    pub const fn from_copper(copper: u64) -> Self {
        Self(copper)
    }

    /// Creates an amount from gold, silver and copper.
    #[inline]
    #[must_use]
    pub const fn from_coins(gold: u64, silver: u64, copper: u64) -> Self {
        Self(gold * COPPER_PER_GOLD + silver * COPPER_PER_SILVER + copper)
    }

    /// Returns the amount in copper.
    #[inline]
    #[must_use]
    pub const fn copper(self) -> u64 {
        self.0
    }

    /// Returns the whole gold part.
    #[inline]
    #[must_use]
    pub const fn gold(self) -> u64 {
        self.0 / COPPER_PER_GOLD
    }

    /// Returns true for zero.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction.
    #[inline]
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked multiplication by a count.
    #[inline]
    #[must_use]
    pub const fn checked_mul(self, count: u64) -> Option<Self> {
        match self.0.checked_mul(count) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Multiplies by basis points (10000 = 100%), rounding down.
    #[inline]
    #[must_use]
    pub fn mul_bp(self, basis_points: u32) -> Self {
        let scaled = u128::from(self.0) * u128::from(basis_points) / u128::from(BASIS_POINTS);
        Self(u64::try_from(scaled).unwrap_or(u64::MAX))
    }

    /// Subtracts `pct` percent of the amount. Negative values raise the price.
    ///
    /// The removed part is rounded down, matching how aura price
    /// modifiers are applied on retail.
    #[must_use]
    pub fn less_percent(self, pct: i32) -> Self {
        let delta = i128::from(self.0) * i128::from(pct) / 100;
        let result = (i128::from(self.0) - delta).max(0);
        Self(u64::try_from(result).unwrap_or(u64::MAX))
    }

    /// Addition that fails with [`InventoryError::TooMuchGold`] above `cap`.
    pub fn add_capped(self, rhs: Self, cap: Self) -> InventoryResult<Self> {
        match self.checked_add(rhs) {
            Some(total) if total <= cap => Ok(total),
            _ => Err(InventoryError::TooMuchGold),
        }
    }

    /// Subtraction that fails with [`InventoryError::NotEnoughMoney`].
    pub fn pay(self, price: Self) -> InventoryResult<Self> {
        self.checked_sub(price).ok_or(InventoryError::NotEnoughMoney)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl fmt::Debug for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Money({})", self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let silver = (self.0 % COPPER_PER_GOLD) / COPPER_PER_SILVER;
        let copper = self.0 % COPPER_PER_SILVER;
        write!(f, "{}g {silver}s {copper}c", self.gold())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_coins() {
        let value = Money::from_coins(3, 25, 7);
        assert_eq!(value.copper(), 32_507);
        assert_eq!(value.gold(), 3);
        assert_eq!(format!("{value}"), "3g 25s 7c");
    }

    #[test]
    fn test_basis_points() {
        let price = Money::from_copper(1_000);
        assert_eq!(price.mul_bp(9_500).copper(), 950);
        assert_eq!(price.mul_bp(BASIS_POINTS), price);
        assert_eq!(Money::from_copper(3).mul_bp(3_333).copper(), 0);
    }

    #[test]
    fn test_less_percent() {
        let price = Money::from_copper(1_000);
        assert_eq!(price.less_percent(10).copper(), 900);
        assert_eq!(price.less_percent(-20).copper(), 1_200);
        assert_eq!(price.less_percent(150), Money::ZERO);
    }

    #[test]
    fn test_capped_add_and_pay() {
        let cap = Money::from_copper(100);
        assert_eq!(Money::from_copper(60).add_capped(Money::from_copper(40), cap), Ok(cap));
        assert_eq!(
            Money::from_copper(60).add_capped(Money::from_copper(41), cap),
            Err(InventoryError::TooMuchGold)
        );
        assert_eq!(Money::ZERO.pay(Money::from_copper(1)), Err(InventoryError::NotEnoughMoney));
        assert!(Money::MAX.checked_add(Money::from_copper(1)).is_none());
    }
}
