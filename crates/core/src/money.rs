//! Currency and monetary amount value objects.
//!
//! Amounts are `rust_decimal::Decimal` throughout, never floats: repeated
//! folds over the movement log must not drift. Currency amounts carry at
//! most [`CURRENCY_SCALE`] fraction digits; anything finer is rejected at
//! the boundary instead of being rounded.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Fraction digits carried by every currency amount.
pub const CURRENCY_SCALE: u32 = 2;

/// ISO-4217-style currency code: exactly three ASCII uppercase letters.
///
/// Validated once, at account creation; an account's currency is
/// permanently fixed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: &str) -> LedgerResult<Self> {
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(LedgerError::validation(format!(
                "currency code must be three uppercase ASCII letters, got {code:?}"
            )));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

/// Validate an amount for posting: non-zero, at most [`CURRENCY_SCALE`]
/// fraction digits.
pub fn validate_amount(amount: Decimal) -> LedgerResult<()> {
    if amount.is_zero() {
        return Err(LedgerError::invalid_amount("amount must be non-zero"));
    }
    if amount.normalize().scale() > CURRENCY_SCALE {
        return Err(LedgerError::invalid_amount(format!(
            "amount {amount} carries more than {CURRENCY_SCALE} fraction digits"
        )));
    }
    Ok(())
}

/// Validate an amount that must additionally be strictly positive
/// (payments, transfers).
pub fn validate_positive_amount(amount: Decimal) -> LedgerResult<()> {
    validate_amount(amount)?;
    if amount.is_sign_negative() {
        return Err(LedgerError::invalid_amount("amount must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn accepts_iso_style_codes() {
        assert_eq!(CurrencyCode::new("PLN").unwrap().as_str(), "PLN");
        assert_eq!("EUR".parse::<CurrencyCode>().unwrap().as_str(), "EUR");
    }

    #[test]
    fn rejects_malformed_codes() {
        for bad in ["pln", "PL", "PLNX", "P1N", "zł "] {
            assert!(CurrencyCode::new(bad).is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn zero_amount_is_rejected() {
        let err = validate_amount(Decimal::ZERO).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
    }

    #[test]
    fn sub_cent_precision_is_rejected() {
        assert!(validate_amount(dec!(10.001)).is_err());
        assert!(validate_amount(dec!(10.01)).is_ok());
        // Trailing zeros beyond the scale are not extra precision.
        assert!(validate_amount(dec!(10.0100)).is_ok());
    }

    #[test]
    fn negative_amounts_pass_general_but_not_positive_validation() {
        assert!(validate_amount(dec!(-5.00)).is_ok());
        assert!(validate_positive_amount(dec!(-5.00)).is_err());
        assert!(validate_positive_amount(dec!(5.00)).is_ok());
    }
}
