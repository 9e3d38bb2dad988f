//! Hyperliquid API client: account/market reads and signed order writes.
//!
//! Reads go to the `/info` endpoint and are retried on transient transport
//! failures. Writes go to `/exchange` as keccak-signed actions and are never
//! retried; resubmitting a market order is not idempotent.

use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::keccak256;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use super::types::{AllMids, ExchangeResponse, Meta, UserState};

/// API base URLs
pub const MAINNET_API_URL: &str = "https://api.hyperliquid.xyz";
pub const TESTNET_API_URL: &str = "https://api.hyperliquid-testnet.xyz";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The venue surface consumed by the trading core.
///
/// The position manager is generic over this trait so orchestration logic
/// can be exercised against a mock venue.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    /// Perp metadata (the tradeable asset universe).
    async fn meta(&self) -> Result<Meta>;

    /// Clearinghouse state for an account.
    async fn user_state(&self, address: &str) -> Result<UserState>;

    /// Current mid prices for every listed coin.
    async fn all_mids(&self) -> Result<AllMids>;

    /// Set cross leverage for a coin.
    async fn update_leverage(&self, coin: &str, leverage: u32) -> Result<ExchangeResponse>;

    /// Submit a marketable order for `size` units of `coin`.
    async fn market_open(
        &self,
        coin: &str,
        is_buy: bool,
        size: Decimal,
        slippage: Decimal,
    ) -> Result<ExchangeResponse>;

    /// Fully offset the open position on `coin` at market.
    async fn market_close(&self, coin: &str, slippage: Decimal) -> Result<ExchangeResponse>;
}

/// Live client for the Hyperliquid REST API.
pub struct HyperliquidClient {
    http: Client,
    signer: PrivateKeySigner,
    base_url: String,
}

impl HyperliquidClient {
    /// Create a client from a hex private key (with or without 0x prefix).
    pub fn new(private_key: &str, use_mainnet: bool) -> Result<Self> {
        let pk = private_key.strip_prefix("0x").unwrap_or(private_key);
        let signer = PrivateKeySigner::from_str(pk).context("Invalid private key")?;

        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = if use_mainnet {
            MAINNET_API_URL
        } else {
            TESTNET_API_URL
        }
        .to_string();

        Ok(Self {
            http,
            signer,
            base_url,
        })
    }

    /// Override the API base URL (for testing).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// The wallet address derived from the configured key.
    pub fn address(&self) -> String {
        format!("{:?}", self.signer.address())
    }

    /// POST an info query, retrying transient transport failures.
    async fn info_request<T: DeserializeOwned>(&self, body: Value) -> Result<T> {
        let url = format!("{}/info", self.base_url);

        let resp = backoff::future::retry(read_backoff(), || async {
            let resp = self
                .http
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(anyhow!(e)))?;

            if resp.status().is_server_error() {
                return Err(backoff::Error::transient(anyhow!(
                    "Info request failed: {}",
                    resp.status()
                )));
            }
            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                return Err(backoff::Error::permanent(anyhow!(
                    "Info request failed: {} - {}",
                    status,
                    text
                )));
            }
            Ok(resp)
        })
        .await?;

        resp.json().await.context("Failed to parse info response")
    }

    /// POST a signed action to the exchange endpoint.
    async fn exchange_request(&self, action: Value) -> Result<ExchangeResponse> {
        let nonce = Utc::now().timestamp_millis() as u64;
        let signature = self.sign_action(&action, nonce).await?;

        let payload = json!({
            "action": action,
            "nonce": nonce,
            "signature": signature,
        });

        let url = format!("{}/exchange", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Exchange request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Exchange request failed: {} - {}", status, text));
        }

        resp.json()
            .await
            .context("Failed to parse exchange response")
    }

    /// Sign the keccak hash of the serialized action and nonce.
    async fn sign_action(&self, action: &Value, nonce: u64) -> Result<Value> {
        let mut message = serde_json::to_vec(action).context("Failed to serialize action")?;
        message.extend_from_slice(&nonce.to_be_bytes());

        let hash = keccak256(&message);
        let signature = self
            .signer
            .sign_hash(&hash)
            .await
            .context("Failed to sign action")?;

        // Wire format is split r/s/v components, not the packed 65 bytes.
        let bytes = signature.as_bytes();
        Ok(json!({
            "r": format!("0x{}", hex::encode(&bytes[..32])),
            "s": format!("0x{}", hex::encode(&bytes[32..64])),
            "v": bytes[64] as u64,
        }))
    }

    /// Resolve the universe index for a coin; order actions address assets
    /// by index rather than by name.
    async fn asset_index(&self, coin: &str) -> Result<u32> {
        let meta = self.meta().await?;
        meta.find(coin)
            .map(|(index, _)| index)
            .ok_or_else(|| anyhow!("Asset {} not found in universe", coin))
    }

    /// Aggressive IOC limit price for a marketable order.
    async fn market_price(&self, coin: &str, is_buy: bool, slippage: Decimal) -> Result<Decimal> {
        let mids = self.all_mids().await?;
        let mid = mids
            .price(coin)
            .ok_or_else(|| anyhow!("No mid price for {}", coin))?;

        let px = if is_buy {
            mid * (Decimal::ONE + slippage)
        } else {
            mid * (Decimal::ONE - slippage)
        };

        // The venue accepts at most six decimals on perp prices.
        Ok(px.round_dp(6))
    }

    fn order_action(asset: u32, is_buy: bool, px: Decimal, sz: Decimal, reduce_only: bool) -> Value {
        json!({
            "type": "order",
            "orders": [{
                "a": asset,
                "b": is_buy,
                "p": px.to_string(),
                "s": sz.to_string(),
                "r": reduce_only,
                "t": {"limit": {"tif": "Ioc"}},
                "c": format!("0x{:032x}", Uuid::new_v4().as_u128()),
            }],
            "grouping": "na",
        })
    }
}

#[async_trait]
impl ExchangeApi for HyperliquidClient {
    async fn meta(&self) -> Result<Meta> {
        self.info_request(json!({"type": "meta"})).await
    }

    async fn user_state(&self, address: &str) -> Result<UserState> {
        self.info_request(json!({"type": "clearinghouseState", "user": address}))
            .await
    }

    async fn all_mids(&self) -> Result<AllMids> {
        self.info_request(json!({"type": "allMids"})).await
    }

    async fn update_leverage(&self, coin: &str, leverage: u32) -> Result<ExchangeResponse> {
        let asset = self.asset_index(coin).await?;
        debug!(coin = %coin, leverage = leverage, "Updating leverage");

        let action = json!({
            "type": "updateLeverage",
            "asset": asset,
            "isCross": true,
            "leverage": leverage,
        });
        self.exchange_request(action).await
    }

    async fn market_open(
        &self,
        coin: &str,
        is_buy: bool,
        size: Decimal,
        slippage: Decimal,
    ) -> Result<ExchangeResponse> {
        let asset = self.asset_index(coin).await?;
        let px = self.market_price(coin, is_buy, slippage).await?;
        debug!(coin = %coin, is_buy = is_buy, size = %size, px = %px, "Submitting market order");

        self.exchange_request(Self::order_action(asset, is_buy, px, size, false))
            .await
    }

    async fn market_close(&self, coin: &str, slippage: Decimal) -> Result<ExchangeResponse> {
        let state = self.user_state(&self.address()).await?;
        let position = state
            .position(coin)
            .ok_or_else(|| anyhow!("No open position for {}", coin))?;

        // Offset the position: sell a long, buy back a short.
        let is_buy = position.size < Decimal::ZERO;
        let asset = self.asset_index(coin).await?;
        let px = self.market_price(coin, is_buy, slippage).await?;
        debug!(coin = %coin, size = %position.abs_size(), "Submitting market close");

        self.exchange_request(Self::order_action(asset, is_buy, px, position.abs_size(), true))
            .await
    }
}

fn read_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        max_elapsed_time: Some(Duration::from_secs(10)),
        ..ExponentialBackoff::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_derivation() {
        // Well-known test vector: this key maps to the address below.
        let client = HyperliquidClient::new(
            "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
            false,
        )
        .unwrap();

        assert_eq!(
            client.address().to_lowercase(),
            "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23"
        );
    }

    #[test]
    fn test_order_action_shape() {
        let action = HyperliquidClient::order_action(
            3,
            true,
            Decimal::from_str("50500.0").unwrap(),
            Decimal::from_str("0.04").unwrap(),
            false,
        );

        assert_eq!(action["type"], "order");
        let order = &action["orders"][0];
        assert_eq!(order["a"], 3);
        assert_eq!(order["b"], true);
        assert_eq!(order["r"], false);
        assert_eq!(order["t"]["limit"]["tif"], "Ioc");
        assert!(order["c"].as_str().unwrap().starts_with("0x"));
    }
}
