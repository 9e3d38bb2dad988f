//! Webhook request authentication: shared secret and source-address checks.

use std::net::IpAddr;

use sha2::{Digest, Sha256};
use tracing::debug;

/// Validates inbound webhook credentials.
///
/// Both checks must pass; the caller only learns a single yes/no, so a
/// rejected request cannot tell which check failed. Failure reasons are
/// logged at debug level only.
pub struct Authenticator {
    secret: Option<String>,
    allowed_ips: Vec<IpAddr>,
}

impl Authenticator {
    pub fn new(secret: Option<String>, allowed_ips: Vec<IpAddr>) -> Self {
        Self {
            secret,
            allowed_ips,
        }
    }

    /// Authenticate one request. With no secret configured, everything is
    /// rejected. The source address is checked only when the transport
    /// supplied one.
    pub fn authenticate(&self, password: &str, source_ip: Option<IpAddr>) -> bool {
        let Some(secret) = self.secret.as_deref() else {
            debug!("No webhook secret configured; rejecting request");
            return false;
        };

        if password.is_empty() {
            debug!("No password provided in webhook payload");
            return false;
        }

        if !constant_time_eq(secret.as_bytes(), password.as_bytes()) {
            debug!("Webhook password mismatch");
            return false;
        }

        if let Some(ip) = source_ip {
            if !self.allowed_ips.contains(&ip) {
                debug!(ip = %ip, "Source address not in allow-list");
                return false;
            }
        }

        true
    }
}

/// Compare two secrets without leaking where they differ.
///
/// Hashing both sides first gives fixed-width inputs, so the fold below
/// always runs the same number of iterations regardless of what was
/// supplied.
fn constant_time_eq(expected: &[u8], provided: &[u8]) -> bool {
    let expected = Sha256::digest(expected);
    let provided = Sha256::digest(provided);

    expected
        .iter()
        .zip(provided.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tv_ip() -> IpAddr {
        "52.89.214.238".parse().unwrap()
    }

    fn authenticator(secret: Option<&str>) -> Authenticator {
        Authenticator::new(secret.map(String::from), vec![tv_ip()])
    }

    #[test]
    fn test_missing_secret_fails_closed() {
        let auth = authenticator(None);
        assert!(!auth.authenticate("anything", None));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let auth = authenticator(Some("hunter2"));
        assert!(!auth.authenticate("hunter3", None));
        assert!(!auth.authenticate("", None));
    }

    #[test]
    fn test_correct_password_without_source_context() {
        let auth = authenticator(Some("hunter2"));
        assert!(auth.authenticate("hunter2", None));
    }

    #[test]
    fn test_correct_password_with_allowed_source() {
        let auth = authenticator(Some("hunter2"));
        assert!(auth.authenticate("hunter2", Some(tv_ip())));
    }

    #[test]
    fn test_correct_password_with_disallowed_source() {
        let auth = authenticator(Some("hunter2"));
        let other: IpAddr = "203.0.113.7".parse().unwrap();
        assert!(!auth.authenticate("hunter2", Some(other)));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
