//! The uniform response envelope produced by every trading action.

use serde::Serialize;
use serde_json::Value;

use super::Side;

/// Outcome of a trading action.
///
/// `Error` means the action produced no successful side effect; a close-all
/// sweep that landed at least one close reports `Partial` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Partial,
    Error,
}

/// What was submitted on a successful open.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub asset: String,
    pub side: Side,
    pub size: String,
    pub leverage: u32,
    pub usd_value: String,
}

/// Fill information extracted from the exchange response, when present.
#[derive(Debug, Clone, Serialize)]
pub struct FillDetails {
    pub size: String,
    pub average_price: String,
    pub order_id: u64,
}

/// A position closed by a close-all sweep.
#[derive(Debug, Clone, Serialize)]
pub struct ClosedPosition {
    pub asset: String,
    pub size: String,
    pub side: Side,
}

/// A position a close-all sweep could not close, with the raw exchange
/// detail preserved.
#[derive(Debug, Clone, Serialize)]
pub struct FailedPosition {
    pub asset: String,
    pub size: String,
    pub side: Side,
    pub error: Value,
}

/// The sole output contract of the trading core. The transport serializes
/// it verbatim and mirrors `http_status()`.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    pub status: EnvelopeStatus,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<OrderDetails>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled: Option<FillDetails>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_positions: Option<Vec<ClosedPosition>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_positions: Option<Vec<FailedPosition>>,

    /// Raw exchange payload accompanying an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ResponseEnvelope {
    fn new(status: EnvelopeStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
            filled: None,
            closed_positions: None,
            failed_positions: None,
            detail: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(EnvelopeStatus::Success, message)
    }

    pub fn partial(message: impl Into<String>) -> Self {
        Self::new(EnvelopeStatus::Partial, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EnvelopeStatus::Error, message)
    }

    pub fn with_details(mut self, details: OrderDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_filled(mut self, filled: FillDetails) -> Self {
        self.filled = Some(filled);
        self
    }

    pub fn with_close_lists(
        mut self,
        closed: Vec<ClosedPosition>,
        failed: Vec<FailedPosition>,
    ) -> Self {
        self.closed_positions = Some(closed);
        self.failed_positions = Some(failed);
        self
    }

    pub fn with_detail(mut self, detail: Option<Value>) -> Self {
        self.detail = detail;
        self
    }

    pub fn is_error(&self) -> bool {
        self.status == EnvelopeStatus::Error
    }

    /// HTTP status the transport mirrors: any outcome with a side effect
    /// (including partial) is a 200. Authentication failures are mapped to
    /// 403 by the transport itself, before an envelope exists.
    pub fn http_status(&self) -> u16 {
        if self.is_error() {
            400
        } else {
            200
        }
    }
}
