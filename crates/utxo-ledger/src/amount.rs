use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Number of decimal places carried by an [`Amount`].
pub const DECIMAL_PLACES: u32 = 4;

/// Minor units in one whole coin.
pub const MINOR_UNITS_PER_COIN: i64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount {0} has more than 4 decimal places")]
    TooPrecise(Decimal),
    #[error("amount {0} is out of range")]
    OutOfRange(Decimal),
}

/// Fixed-point monetary value, counted in minor units.
///
/// Signed so that a transaction declaring a negative output can still be
/// represented and then rejected by validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub const fn from_minor_units(units: i64) -> Self {
        Self(units)
    }

    /// Whole coins as an amount, or `None` if the minor units overflow `i64`.
    pub const fn from_coins(coins: i64) -> Option<Self> {
        match coins.checked_mul(MINOR_UNITS_PER_COIN) {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn from_decimal(value: Decimal) -> Result<Self, AmountError> {
        let scaled = value
            .checked_mul(Decimal::from(MINOR_UNITS_PER_COIN))
            .ok_or(AmountError::OutOfRange(value))?;

        if !scaled.fract().is_zero() {
            return Err(AmountError::TooPrecise(value));
        }

        scaled
            .to_i64()
            .map(Self)
            .ok_or(AmountError::OutOfRange(value))
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, DECIMAL_PLACES).normalize()
    }

    /// Sums amounts in a wide accumulator so a single transaction can never overflow.
    pub fn total<I: IntoIterator<Item = Self>>(amounts: I) -> i128 {
        amounts.into_iter().map(|a| i128::from(a.0)).sum()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}
