//! Application-level errors.

use thiserror::Error;

/// Errors from application setup and the trading loop.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("exchange error: {0}")]
    Exchange(#[from] arb_exchange::ExchangeError),
}

pub type AppResult<T> = Result<T, AppError>;
