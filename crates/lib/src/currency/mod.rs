//! Currency conversion over a fixed rate table.
//!
//! Rates are units of each currency per US dollar and never change at
//! runtime. Conversion goes through USD: `amount / rate[from] * rate[to]`,
//! rounded to cents. Access control is the caller's job.

mod errors;

use std::fmt;
use std::str::FromStr;

pub use errors::CurrencyError;

use crate::Result;

/// A supported ISO 4217 currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurrencyCode {
    Usd,
    Eur,
    Gbp,
    Inr,
    Jpy,
    Aud,
    Cad,
    Cny,
    Sgd,
    Aed,
}

impl CurrencyCode {
    /// Every supported currency, in display order.
    pub const ALL: [CurrencyCode; 10] = [
        CurrencyCode::Usd,
        CurrencyCode::Eur,
        CurrencyCode::Gbp,
        CurrencyCode::Inr,
        CurrencyCode::Jpy,
        CurrencyCode::Aud,
        CurrencyCode::Cad,
        CurrencyCode::Cny,
        CurrencyCode::Sgd,
        CurrencyCode::Aed,
    ];

    /// Three-letter uppercase code.
    pub fn as_str(self) -> &'static str {
        match self {
            CurrencyCode::Usd => "USD",
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Gbp => "GBP",
            CurrencyCode::Inr => "INR",
            CurrencyCode::Jpy => "JPY",
            CurrencyCode::Aud => "AUD",
            CurrencyCode::Cad => "CAD",
            CurrencyCode::Cny => "CNY",
            CurrencyCode::Sgd => "SGD",
            CurrencyCode::Aed => "AED",
        }
    }

    /// Units of this currency per one US dollar.
    pub fn rate(self) -> f64 {
        match self {
            CurrencyCode::Usd => 1.00,
            CurrencyCode::Eur => 0.92,
            CurrencyCode::Gbp => 0.78,
            CurrencyCode::Inr => 83.00,
            CurrencyCode::Jpy => 146.00,
            CurrencyCode::Aud => 1.52,
            CurrencyCode::Cad => 1.36,
            CurrencyCode::Cny => 7.25,
            CurrencyCode::Sgd => 1.34,
            CurrencyCode::Aed => 3.67,
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyError;

    /// Only the exact uppercase code is accepted.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        CurrencyCode::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CurrencyError::InvalidCurrency {
                code: s.to_string(),
            })
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convert between two known currencies, rounded to 2 decimal places.
pub fn convert_codes(amount: f64, from: CurrencyCode, to: CurrencyCode) -> f64 {
    round_cents(amount / from.rate() * to.rate())
}

/// Convert `amount` from one currency code to another.
///
/// Fails with [`CurrencyError::InvalidCurrency`] if either code is not in the
/// rate table.
pub fn convert(amount: f64, from: &str, to: &str) -> Result<f64> {
    let from: CurrencyCode = from.parse()?;
    let to: CurrencyCode = to.parse()?;
    Ok(convert_codes(amount, from, to))
}

/// Parse a user-supplied amount.
///
/// Fails with [`CurrencyError::NotANumber`] for anything that is not a finite
/// decimal number.
pub fn parse_amount(input: &str) -> Result<f64> {
    match input.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(amount),
        _ => Err(CurrencyError::NotANumber {
            input: input.to_string(),
        }
        .into()),
    }
}

/// A completed conversion.
///
/// Displays as `"{amount:.2} {from} = {converted:.2} {to}"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub amount: f64,
    pub from: CurrencyCode,
    pub converted: f64,
    pub to: CurrencyCode,
}

impl Conversion {
    pub fn new(amount: f64, from: CurrencyCode, to: CurrencyCode) -> Self {
        Self {
            amount,
            from,
            converted: convert_codes(amount, from, to),
            to,
        }
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} {} = {:.2} {}",
            self.amount, self.from, self.converted, self.to
        )
    }
}
