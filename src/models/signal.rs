//! Webhook signal model: the single JSON payload contract.

use serde::{Deserialize, Serialize};

/// Requested trading action from the alerting platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    /// Open (or flip into) a long position
    Long,
    /// Open (or flip into) a short position
    Short,
    /// Close all open positions
    Close,
}

/// Direction of a position or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Whether an order in this direction is a buy.
    pub fn is_buy(&self) -> bool {
        matches!(self, Side::Long)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed TradingView-style webhook payload.
///
/// `ticker` may arrive in any case; asset lookup uppercases it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeSignal {
    pub action: TradeAction,

    #[serde(default)]
    pub ticker: String,

    /// Percentage of withdrawable balance to commit (1-100).
    #[serde(default = "default_percent")]
    pub amount_percent: u32,

    /// Shared webhook secret; checked by the authenticator, never logged.
    #[serde(default)]
    pub password: String,
}

fn default_percent() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let signal: TradeSignal = serde_json::from_str(
            r#"{"action":"long","ticker":"btc","amountPercent":10,"password":"secret"}"#,
        )
        .unwrap();

        assert_eq!(signal.action, TradeAction::Long);
        assert_eq!(signal.ticker, "btc");
        assert_eq!(signal.amount_percent, 10);
        assert_eq!(signal.password, "secret");
    }

    #[test]
    fn test_percent_defaults_to_five() {
        let signal: TradeSignal =
            serde_json::from_str(r#"{"action":"short","ticker":"ETH","password":"x"}"#).unwrap();

        assert_eq!(signal.amount_percent, 5);
    }

    #[test]
    fn test_close_needs_no_ticker() {
        let signal: TradeSignal =
            serde_json::from_str(r#"{"action":"close","password":"x"}"#).unwrap();

        assert_eq!(signal.action, TradeAction::Close);
        assert!(signal.ticker.is_empty());
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let result = serde_json::from_str::<TradeSignal>(r#"{"action":"hodl","password":"x"}"#);
        assert!(result.is_err());
    }
}
