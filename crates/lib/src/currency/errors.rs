//! Error types for currency conversion
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurrencyError {
    #[error("Invalid currency selected: {code}")]
    InvalidCurrency { code: String },

    #[error("Amount must be a number: {input:?}")]
    NotANumber { input: String },
}

impl From<CurrencyError> for crate::Error {
    fn from(err: CurrencyError) -> Self {
        crate::Error::Currency(err)
    }
}
