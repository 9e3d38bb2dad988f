//! Process configuration, read from the environment once at startup.

use std::net::{IpAddr, Ipv4Addr};

use anyhow::{Context, Result};
use tracing::warn;

/// TradingView webhook egress addresses; alerts arrive from these.
const TRADINGVIEW_WEBHOOK_IPS: [IpAddr; 4] = [
    IpAddr::V4(Ipv4Addr::new(52, 89, 214, 238)),
    IpAddr::V4(Ipv4Addr::new(34, 212, 75, 30)),
    IpAddr::V4(Ipv4Addr::new(54, 218, 53, 128)),
    IpAddr::V4(Ipv4Addr::new(52, 32, 178, 7)),
];

/// Everything the process needs from the environment.
///
/// Built once in `main` and handed to the authenticator and exchange client
/// constructors; nothing else reads the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Shared webhook secret. `None` makes authentication fail closed.
    pub webhook_password: Option<String>,

    /// Source addresses allowed to deliver signals.
    pub allowed_source_ips: Vec<IpAddr>,

    /// Hex private key for the trading wallet.
    pub private_key: String,

    /// Mainnet unless `HYPERLIQUID_USE_MAINNET=false`.
    pub use_mainnet: bool,
}

impl AppConfig {
    /// Read configuration from the environment (after dotenv loading).
    pub fn from_env() -> Result<Self> {
        let webhook_password = std::env::var("WEBHOOK_PASSWORD")
            .ok()
            .filter(|s| !s.is_empty());
        if webhook_password.is_none() {
            warn!("WEBHOOK_PASSWORD not set; every webhook request will be rejected");
        }

        let private_key = std::env::var("HYPERLIQUID_PRIVATE_KEY")
            .context("HYPERLIQUID_PRIVATE_KEY not set")?;

        let use_mainnet = std::env::var("HYPERLIQUID_USE_MAINNET")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(true);

        let allowed_source_ips = match std::env::var("ALLOWED_SOURCE_IPS") {
            Ok(raw) => parse_ip_list(&raw)?,
            Err(_) => TRADINGVIEW_WEBHOOK_IPS.to_vec(),
        };

        Ok(Self {
            webhook_password,
            allowed_source_ips,
            private_key,
            use_mainnet,
        })
    }
}

/// Parse a comma-separated IP list from the environment override.
fn parse_ip_list(raw: &str) -> Result<Vec<IpAddr>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .with_context(|| format!("Invalid address in ALLOWED_SOURCE_IPS: {s}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ip_list() {
        let ips = parse_ip_list("10.0.0.1, 192.168.1.2,").unwrap();
        assert_eq!(ips.len(), 2);
        assert_eq!(ips[0], "10.0.0.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_parse_ip_list_rejects_garbage() {
        assert!(parse_ip_list("not-an-ip").is_err());
    }

    #[test]
    fn test_default_allow_list_is_tradingview() {
        assert_eq!(TRADINGVIEW_WEBHOOK_IPS.len(), 4);
        assert!(TRADINGVIEW_WEBHOOK_IPS
            .contains(&"52.89.214.238".parse::<IpAddr>().unwrap()));
    }
}
