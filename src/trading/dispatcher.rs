//! Maps decoded signals onto trading operations and shapes the envelope.

use tracing::{error, info};

use crate::api::ExchangeApi;
use crate::models::{ResponseEnvelope, Side, TradeAction, TradeSignal};

use super::error::TradeError;
use super::manager::PositionManager;

/// Run one signal to completion.
///
/// This is the outermost core boundary: every failure, including adapter
/// transport faults, is converted into a well-formed envelope here. Nothing
/// propagates to the transport layer.
pub async fn dispatch<E: ExchangeApi>(
    manager: &PositionManager<E>,
    signal: &TradeSignal,
) -> ResponseEnvelope {
    info!(
        action = ?signal.action,
        ticker = %signal.ticker,
        percent = signal.amount_percent,
        "Processing signal"
    );

    let result = match signal.action {
        TradeAction::Long => {
            manager
                .open_position(&signal.ticker, Side::Long, signal.amount_percent)
                .await
        }
        TradeAction::Short => {
            manager
                .open_position(&signal.ticker, Side::Short, signal.amount_percent)
                .await
        }
        TradeAction::Close => manager.close_all_positions().await,
    };

    match result {
        Ok(envelope) => envelope,
        Err(err) => {
            error!(error = %err, "Signal failed");
            envelope_from_error(err)
        }
    }
}

fn envelope_from_error(err: TradeError) -> ResponseEnvelope {
    match err {
        TradeError::Auth => ResponseEnvelope::error("Unauthorized"),
        TradeError::Validation(message) => ResponseEnvelope::error(message),
        TradeError::Exchange { message, detail } => {
            ResponseEnvelope::error(message).with_detail(detail)
        }
    }
}
