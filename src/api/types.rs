//! Serde types for the Hyperliquid info and exchange endpoints.
//!
//! Everything the venue returns is decoded into typed, tagged structures
//! here, at the adapter boundary, so the trading core never probes nested
//! JSON by key. Numeric fields arrive string-encoded and map onto
//! `Decimal` via the string serde helpers.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Position;

/// One perp asset entry from `meta.universe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMeta {
    pub name: String,

    /// Size precision the venue quotes for this asset.
    #[serde(default)]
    pub sz_decimals: u32,

    #[serde(default = "default_max_leverage")]
    pub max_leverage: u32,
}

// The venue omits maxLeverage for some listings; 10x is its documented floor.
fn default_max_leverage() -> u32 {
    10
}

/// Perp metadata: the tradeable asset universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub universe: Vec<AssetMeta>,
}

impl Meta {
    /// Find an asset by name together with its universe index.
    ///
    /// Order actions address assets by index, so both are resolved at once.
    pub fn find(&self, coin: &str) -> Option<(u32, &AssetMeta)> {
        self.universe
            .iter()
            .enumerate()
            .find(|(_, a)| a.name == coin)
            .map(|(i, a)| (i as u32, a))
    }
}

/// Mid prices keyed by coin symbol, string-encoded by the exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllMids(pub HashMap<String, String>);

impl AllMids {
    /// Resolve a mid price, falling back to a case-insensitive match when
    /// the exact symbol is missing.
    pub fn price(&self, coin: &str) -> Option<Decimal> {
        let raw = self.0.get(coin).or_else(|| {
            self.0
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(coin))
                .map(|(_, v)| v)
        })?;
        raw.parse().ok()
    }
}

/// Account clearinghouse state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    /// Margin available for new positions, in USDC.
    #[serde(with = "rust_decimal::serde::str")]
    pub withdrawable: Decimal,

    #[serde(default)]
    pub asset_positions: Vec<AssetPosition>,
}

/// Wrapper object the exchange puts around each position entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetPosition {
    pub position: PositionData,
}

/// Raw per-coin position state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionData {
    pub coin: String,

    /// Signed size: positive long, negative short.
    #[serde(with = "rust_decimal::serde::str")]
    pub szi: Decimal,

    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub entry_px: Option<Decimal>,
}

impl UserState {
    /// The open position for `coin`, if any.
    pub fn position(&self, coin: &str) -> Option<Position> {
        self.asset_positions
            .iter()
            .map(|ap| &ap.position)
            .find(|p| p.coin == coin && !p.szi.is_zero())
            .map(|p| Position::new(p.coin.clone(), p.szi, p.entry_px))
    }

    /// Every open (non-zero) position.
    pub fn open_positions(&self) -> Vec<Position> {
        self.asset_positions
            .iter()
            .map(|ap| &ap.position)
            .filter(|p| !p.szi.is_zero())
            .map(|p| Position::new(p.coin.clone(), p.szi, p.entry_px))
            .collect()
    }
}

/// Top-level response to an exchange write.
///
/// A `status` of `"ok"` is necessary but not sufficient: the nested
/// per-order status list can still carry an error for the order itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ExchangeResponseBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeResponseBody {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<OrderData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderData {
    #[serde(default)]
    pub statuses: Vec<OrderStatus>,
}

/// Per-order status entry; the exchange tags each entry with a single key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    Filled(FillInfo),
    Resting(RestingInfo),
    Error(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillInfo {
    #[serde(with = "rust_decimal::serde::str")]
    pub total_sz: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub avg_px: Decimal,
    pub oid: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestingInfo {
    pub oid: u64,
}

impl ExchangeResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn statuses(&self) -> &[OrderStatus] {
        self.response
            .as_ref()
            .and_then(|r| r.data.as_ref())
            .map(|d| d.statuses.as_slice())
            .unwrap_or(&[])
    }

    /// First per-order error, if the nested status list carries one.
    pub fn first_error(&self) -> Option<&str> {
        self.statuses().iter().find_map(|s| match s {
            OrderStatus::Error(e) => Some(e.as_str()),
            _ => None,
        })
    }

    /// First fill report, when the exchange returned one. Absence of fill
    /// details does not mean the order failed.
    pub fn first_fill(&self) -> Option<&FillInfo> {
        self.statuses().iter().find_map(|s| match s {
            OrderStatus::Filled(f) => Some(f),
            _ => None,
        })
    }

    /// Whether the write fully succeeded: top-level ok and no per-order
    /// error entry.
    pub fn accepted(&self) -> bool {
        self.is_ok() && self.first_error().is_none()
    }
}

#[cfg(test)]
impl ExchangeResponse {
    /// A bare accepted response with no order data.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            response: None,
        }
    }

    /// Top-level ok carrying a nested per-order error.
    pub fn with_order_error(message: &str) -> Self {
        Self {
            status: "ok".to_string(),
            response: Some(ExchangeResponseBody {
                kind: "order".to_string(),
                data: Some(OrderData {
                    statuses: vec![OrderStatus::Error(message.to_string())],
                }),
            }),
        }
    }

    /// Top-level ok carrying a fill report.
    pub fn with_fill(total_sz: Decimal, avg_px: Decimal, oid: u64) -> Self {
        Self {
            status: "ok".to_string(),
            response: Some(ExchangeResponseBody {
                kind: "order".to_string(),
                data: Some(OrderData {
                    statuses: vec![OrderStatus::Filled(FillInfo {
                        total_sz,
                        avg_px,
                        oid,
                    })],
                }),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_nested_error_defeats_top_level_ok() {
        let resp: ExchangeResponse = serde_json::from_str(
            r#"{
                "status": "ok",
                "response": {
                    "type": "order",
                    "data": {
                        "statuses": [{"error": "Insufficient margin to place order"}]
                    }
                }
            }"#,
        )
        .unwrap();

        assert!(resp.is_ok());
        assert!(!resp.accepted());
        assert_eq!(resp.first_error(), Some("Insufficient margin to place order"));
    }

    #[test]
    fn test_fill_extraction() {
        let resp: ExchangeResponse = serde_json::from_str(
            r#"{
                "status": "ok",
                "response": {
                    "type": "order",
                    "data": {
                        "statuses": [{"filled": {"totalSz": "0.04", "avgPx": "50012.5", "oid": 77738308}}]
                    }
                }
            }"#,
        )
        .unwrap();

        assert!(resp.accepted());
        let fill = resp.first_fill().unwrap();
        assert_eq!(fill.total_sz, dec!(0.04));
        assert_eq!(fill.avg_px, dec!(50012.5));
        assert_eq!(fill.oid, 77738308);
    }

    #[test]
    fn test_missing_fill_is_not_failure() {
        let resp: ExchangeResponse =
            serde_json::from_str(r#"{"status": "ok", "response": {"type": "default"}}"#).unwrap();

        assert!(resp.accepted());
        assert!(resp.first_fill().is_none());
    }

    #[test]
    fn test_user_state_positions() {
        let state: UserState = serde_json::from_str(
            r#"{
                "withdrawable": "1250.75",
                "assetPositions": [
                    {"position": {"coin": "BTC", "szi": "-0.5", "entryPx": "49800.0"}},
                    {"position": {"coin": "ETH", "szi": "0"}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(state.withdrawable, dec!(1250.75));
        let open = state.open_positions();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].coin, "BTC");
        assert_eq!(open[0].size, dec!(-0.5));
        assert_eq!(open[0].side(), crate::models::Side::Short);
        assert!(state.position("ETH").is_none());
        assert!(state.position("BTC").is_some());
    }

    #[test]
    fn test_mid_lookup_is_case_insensitive() {
        let mut mids = HashMap::new();
        mids.insert("BTC".to_string(), "50000".to_string());
        let mids = AllMids(mids);

        assert_eq!(mids.price("BTC"), Some(dec!(50000)));
        assert_eq!(mids.price("btc"), Some(dec!(50000)));
        assert_eq!(mids.price("XRP"), None);
    }

    #[test]
    fn test_meta_find_returns_universe_index() {
        let meta = Meta {
            universe: vec![
                AssetMeta {
                    name: "BTC".to_string(),
                    sz_decimals: 5,
                    max_leverage: 50,
                },
                AssetMeta {
                    name: "ETH".to_string(),
                    sz_decimals: 4,
                    max_leverage: 50,
                },
            ],
        };

        let (index, asset) = meta.find("ETH").unwrap();
        assert_eq!(index, 1);
        assert_eq!(asset.max_leverage, 50);
        assert!(meta.find("DOGE").is_none());
    }
}
