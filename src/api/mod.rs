//! Hyperliquid API client and wire types.

mod client;
pub mod types;

pub use client::{ExchangeApi, HyperliquidClient, MAINNET_API_URL, TESTNET_API_URL};
pub use types::{AllMids, ExchangeResponse, Meta, UserState};
