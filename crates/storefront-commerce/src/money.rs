//! Prices in integer cents.
//!
//! The catalog sends decimal amounts; they are rounded to cents when a
//! product is deserialized and never touched as floats again.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "\u{20ac}",
            Currency::GBP => "\u{00a3}",
        }
    }
}

/// An amount of money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Money {
    pub amount_cents: i64,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount_cents: i64, currency: Currency) -> Self {
        Self {
            amount_cents,
            currency,
        }
    }

    /// Round a decimal amount to cents.
    ///
    /// ```
    /// use storefront_commerce::money::{Currency, Money};
    /// assert_eq!(Money::from_decimal(109.95, Currency::USD).amount_cents, 10995);
    /// ```
    pub fn from_decimal(amount: f64, currency: Currency) -> Self {
        Self::new((amount * 100.0).round() as i64, currency)
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    pub fn to_decimal(&self) -> f64 {
        self.amount_cents as f64 / 100.0
    }

    /// `$49.99` style rendering.
    pub fn display(&self) -> String {
        let sign = if self.amount_cents < 0 { "-" } else { "" };
        let cents = self.amount_cents.unsigned_abs();
        format!("{sign}{}{}.{:02}", self.currency.symbol(), cents / 100, cents % 100)
    }

    /// Price of `quantity` units. Saturates instead of overflowing.
    pub fn multiply(&self, quantity: i64) -> Money {
        Money::new(self.amount_cents.saturating_mul(quantity), self.currency)
    }

    /// Sum of two amounts, or `None` across currencies.
    pub fn try_add(&self, other: &Money) -> Option<Money> {
        (self.currency == other.currency).then(|| {
            Money::new(
                self.amount_cents.saturating_add(other.amount_cents),
                self.currency,
            )
        })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Serde adapter for prices the catalog sends as decimal USD.
pub mod usd_decimal {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{Currency, Money};

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(money.to_decimal())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        f64::deserialize(deserializer).map(|amount| Money::from_decimal(amount, Currency::USD))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::new(2230, Currency::USD).display(), "$22.30");
        assert_eq!(Money::new(5, Currency::EUR).to_string(), "\u{20ac}0.05");
        assert_eq!(Money::new(-150, Currency::GBP).display(), "-\u{00a3}1.50");
    }

    #[test]
    fn test_try_add_same_currency_only() {
        let hat = Money::new(500, Currency::USD);
        assert_eq!(
            hat.try_add(&Money::new(1999, Currency::USD)),
            Some(Money::new(2499, Currency::USD))
        );
        assert_eq!(hat.try_add(&Money::new(1, Currency::GBP)), None);
    }

    #[test]
    fn test_multiply() {
        assert_eq!(
            Money::from_decimal(7.95, Currency::USD).multiply(3),
            Money::new(2385, Currency::USD)
        );
        assert_eq!(Money::new(i64::MAX, Currency::USD).multiply(2).amount_cents, i64::MAX);
    }
}
