//! Money

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::iso::{self, Currency};
use thiserror::Error;

/// Currency used by the storefront when none is specified.
pub const DEFAULT_CURRENCY: &Currency = iso::INR;

/// Errors raised while converting between major and minor currency units.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount does not fit into an `i64` count of minor units.
    #[error("amount {0} cannot be represented in minor units")]
    MinorUnitOverflow(Decimal),

    /// The ISO currency code is not known.
    #[error("unknown currency code {0:?}")]
    UnknownCurrency(String),
}

/// Round an amount to the precision of the currency, half away from zero.
///
/// Preview and authoritative totals both go through this function so that
/// the displayed amount and the charged amount are always identical.
pub fn round_to_currency(amount: Decimal, currency: &Currency) -> Decimal {
    amount.round_dp_with_strategy(currency.exponent, RoundingStrategy::MidpointAwayFromZero)
}

/// The smallest chargeable amount in the currency (one minor unit).
pub fn minimum_chargeable(currency: &Currency) -> Decimal {
    Decimal::new(1, currency.exponent)
}

/// Convert a major-unit amount into whole minor units (paise, cents).
///
/// # Errors
///
/// Returns [`MoneyError::MinorUnitOverflow`] when the scaled amount does not fit in an `i64`.
pub fn to_minor_units(amount: Decimal, currency: &Currency) -> Result<i64, MoneyError> {
    let factor = Decimal::from(10_i64.pow(currency.exponent));

    round_to_currency(amount, currency)
        .checked_mul(factor)
        .and_then(|minor| minor.to_i64())
        .ok_or(MoneyError::MinorUnitOverflow(amount))
}

/// Convert whole minor units back into a major-unit amount.
pub fn from_minor_units(minor: i64, currency: &Currency) -> Decimal {
    Decimal::new(minor, currency.exponent)
}

/// Resolve an ISO 4217 alpha code.
///
/// # Errors
///
/// Returns [`MoneyError::UnknownCurrency`] for codes `rusty_money` does not define.
pub fn find_currency(code: &str) -> Result<&'static Currency, MoneyError> {
    iso::find(&code.trim().to_ascii_uppercase())
        .ok_or_else(|| MoneyError::UnknownCurrency(code.to_string()))
}

/// Serde adapter storing a currency by its ISO alpha code.
pub mod currency_code {
    use rusty_money::iso::Currency;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    /// Serialize the currency as its ISO alpha code.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(
        currency: &&'static Currency,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(currency.iso_alpha_code)
    }

    /// Deserialize a currency from its ISO alpha code.
    ///
    /// # Errors
    ///
    /// Fails when the code is not a known currency.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<&'static Currency, D::Error> {
        let code = String::deserialize(deserializer)?;

        super::find_currency(&code).map_err(D::Error::custom)
    }
}
