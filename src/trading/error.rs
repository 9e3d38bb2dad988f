//! Error taxonomy for trading actions.

use serde_json::Value;
use thiserror::Error;

/// Terminal failure of a single trading action.
///
/// Every variant is converted into a response envelope at the dispatch
/// boundary; nothing here crosses the transport layer as a fault. None of
/// these are retried within an action.
#[derive(Debug, Error)]
pub enum TradeError {
    /// Credential or source-address rejection. Deliberately carries no
    /// information about which check failed.
    #[error("Unauthorized")]
    Auth,

    /// Input failed validation before any exchange write.
    #[error("{0}")]
    Validation(String),

    /// An adapter call failed or the exchange reported a per-order error.
    #[error("{message}")]
    Exchange {
        message: String,
        /// Raw exchange payload, preserved for the envelope detail field.
        detail: Option<Value>,
    },
}

impl TradeError {
    pub fn validation(message: impl Into<String>) -> Self {
        TradeError::Validation(message.into())
    }

    pub fn exchange(message: impl Into<String>) -> Self {
        TradeError::Exchange {
            message: message.into(),
            detail: None,
        }
    }
}

impl From<anyhow::Error> for TradeError {
    /// Adapter transport faults, caught once at the action boundary.
    fn from(err: anyhow::Error) -> Self {
        TradeError::exchange(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, TradeError>;
