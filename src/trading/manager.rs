//! Order orchestration: resolve account state, flip opposite positions,
//! size, submit, and interpret the exchange's nested response.

use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::{ExchangeApi, ExchangeResponse};
use crate::models::{
    ClosedPosition, FailedPosition, FillDetails, OrderDetails, ResponseEnvelope, Side,
};

use super::error::{Result, TradeError};
use super::sizer;

/// Slippage tolerance applied to every market order.
const SLIPPAGE: Decimal = dec!(0.01);

/// Orchestrates the lifecycle of a single trading action against one venue.
///
/// Carries no state between invocations: account and market data are
/// fetched fresh inside every operation, so staleness is bounded by the
/// operation itself.
pub struct PositionManager<E: ExchangeApi> {
    exchange: E,
    address: String,
}

impl<E: ExchangeApi> PositionManager<E> {
    pub fn new(exchange: E, address: String) -> Self {
        Self { exchange, address }
    }

    /// Open a long or short position sized as `percent` of withdrawable
    /// margin at the asset's maximum leverage.
    ///
    /// An existing position in the opposite direction is closed first, and
    /// sizing then runs against the refreshed balance, never the pre-close
    /// snapshot.
    pub async fn open_position(
        &self,
        coin: &str,
        side: Side,
        percent: u32,
    ) -> Result<ResponseEnvelope> {
        let coin = coin.to_uppercase();

        // Validate the request itself before touching the exchange; the
        // leverage update below is already a write.
        if !(1..=100).contains(&percent) {
            return Err(TradeError::validation(format!(
                "Percentage must be between 1 and 100, got {percent}"
            )));
        }

        let meta = self.exchange.meta().await?;
        let (_, asset) = meta
            .find(&coin)
            .ok_or_else(|| TradeError::validation(format!("Asset {coin} not found")))?;
        let max_leverage = asset.max_leverage;

        let state = self.exchange.user_state(&self.address).await?;
        let mut withdrawable = state.withdrawable;
        if withdrawable <= Decimal::ZERO {
            return Err(TradeError::validation(
                "Insufficient balance: no USDC available for trading",
            ));
        }

        let mids = self.exchange.all_mids().await?;
        let price = mids.price(&coin).ok_or_else(|| {
            TradeError::validation(format!("Could not get current price for {coin}"))
        })?;
        if price <= Decimal::ZERO {
            return Err(TradeError::validation(format!(
                "Invalid price (0 or negative) for {coin}"
            )));
        }

        // Failing to confirm the leverage update is not fatal; sizing uses
        // the requested leverage either way.
        match self.exchange.update_leverage(&coin, max_leverage).await {
            Ok(resp) if resp.accepted() => {
                debug!(coin = %coin, leverage = max_leverage, "Leverage set")
            }
            Ok(resp) => {
                warn!(coin = %coin, status = %resp.status, "Leverage update may have failed")
            }
            Err(err) => warn!(coin = %coin, error = %err, "Leverage update failed"),
        }

        if let Some(existing) = state.position(&coin) {
            if existing.side() != side {
                info!(
                    coin = %coin,
                    existing = %existing.side(),
                    requested = %side,
                    "Closing opposite-direction position first"
                );
                self.close_position(&coin).await?;

                withdrawable = self.exchange.user_state(&self.address).await?.withdrawable;
                if withdrawable <= Decimal::ZERO {
                    return Err(TradeError::validation(
                        "Insufficient balance after closing opposite position",
                    ));
                }
            }
        }

        let size = sizer::compute_size(withdrawable, percent, max_leverage, price, &coin)?;

        info!(
            coin = %coin,
            side = %side,
            size = %size,
            leverage = max_leverage,
            "Submitting market order"
        );
        let response = self
            .exchange
            .market_open(&coin, side.is_buy(), size, SLIPPAGE)
            .await?;

        interpret_open(&coin, side, size, max_leverage, price, response)
    }

    /// Close any open position on a single coin.
    ///
    /// A missing position is a successful no-op, so repeated close signals
    /// stay idempotent.
    pub async fn close_position(&self, coin: &str) -> Result<ResponseEnvelope> {
        let coin = coin.to_uppercase();
        let state = self.exchange.user_state(&self.address).await?;

        let Some(position) = state.position(&coin) else {
            info!(coin = %coin, "No open position to close");
            return Ok(ResponseEnvelope::success(format!(
                "No open position found for {coin} to close"
            )));
        };

        debug!(coin = %coin, size = %position.abs_size(), "Closing position");
        let response = self.exchange.market_close(&coin, SLIPPAGE).await?;

        if response.accepted() {
            info!(coin = %coin, "Closed position");
            Ok(ResponseEnvelope::success(format!(
                "Successfully closed {coin} position"
            )))
        } else {
            Err(TradeError::Exchange {
                message: format!("Failed to close {coin} position"),
                detail: serde_json::to_value(&response).ok(),
            })
        }
    }

    /// Close every open position, tolerating partial failure.
    pub async fn close_all_positions(&self) -> Result<ResponseEnvelope> {
        let state = self.exchange.user_state(&self.address).await?;
        let positions = state.open_positions();

        if positions.is_empty() {
            info!("No open positions to close");
            return Ok(ResponseEnvelope::success("No open positions to close")
                .with_close_lists(vec![], vec![]));
        }

        info!(count = positions.len(), "Closing all positions");

        // Per-coin closes are independent; fan out, then aggregate once
        // every outcome is in.
        let results = join_all(
            positions
                .iter()
                .map(|p| self.exchange.market_close(&p.coin, SLIPPAGE)),
        )
        .await;

        let mut closed = Vec::new();
        let mut failed = Vec::new();

        for (position, result) in positions.iter().zip(results) {
            let (asset, size, side) = (
                position.coin.clone(),
                position.abs_size().to_string(),
                position.side(),
            );
            match result {
                Ok(resp) if resp.accepted() => {
                    info!(coin = %asset, "Closed position");
                    closed.push(ClosedPosition { asset, size, side });
                }
                Ok(resp) => {
                    warn!(coin = %asset, status = %resp.status, "Failed to close position");
                    failed.push(FailedPosition {
                        asset,
                        size,
                        side,
                        error: serde_json::to_value(&resp).unwrap_or(Value::Null),
                    });
                }
                Err(err) => {
                    warn!(coin = %asset, error = %err, "Failed to close position");
                    failed.push(FailedPosition {
                        asset,
                        size,
                        side,
                        error: Value::String(format!("{err:#}")),
                    });
                }
            }
        }

        let message = if failed.is_empty() {
            format!("Closed {} positions", closed.len())
        } else {
            format!("Closed {} positions, {} failed", closed.len(), failed.len())
        };

        // Error only when nothing was closed at all; any landed close is a
        // real side effect and must not report as error.
        let envelope = if failed.is_empty() {
            ResponseEnvelope::success(message)
        } else if closed.is_empty() {
            ResponseEnvelope::error(message)
        } else {
            ResponseEnvelope::partial(message)
        };

        Ok(envelope.with_close_lists(closed, failed))
    }
}

/// Map a submission response onto the envelope contract.
///
/// A top-level "ok" is not sufficient: the per-order status list can carry
/// an error of its own.
fn interpret_open(
    coin: &str,
    side: Side,
    size: Decimal,
    leverage: u32,
    price: Decimal,
    response: ExchangeResponse,
) -> Result<ResponseEnvelope> {
    if let Some(error) = response.first_error() {
        let message = format!("Failed to open position: {error}");
        return Err(TradeError::Exchange {
            message,
            detail: serde_json::to_value(&response).ok(),
        });
    }
    if !response.is_ok() {
        return Err(TradeError::Exchange {
            message: format!("Failed to open {side} position for {coin}"),
            detail: serde_json::to_value(&response).ok(),
        });
    }

    let details = OrderDetails {
        asset: coin.to_string(),
        side,
        size: size.to_string(),
        leverage,
        usd_value: (size * price).normalize().to_string(),
    };

    let mut envelope = ResponseEnvelope::success(format!(
        "Successfully opened {side} position for {coin}"
    ))
    .with_details(details);

    if let Some(fill) = response.first_fill() {
        envelope = envelope.with_filled(FillDetails {
            size: fill.total_sz.to_string(),
            average_price: fill.avg_px.to_string(),
            order_id: fill.oid,
        });
    }

    Ok(envelope)
}
