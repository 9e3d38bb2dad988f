//! Open-position model derived from exchange account state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Side;

/// An open perpetual position on a single coin.
///
/// The sign of `size` encodes direction: positive is long, negative short.
/// Positions are never stored; each one is rebuilt from a fresh
/// clearinghouse snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub coin: String,
    pub size: Decimal,
    pub entry_price: Option<Decimal>,
}

impl Position {
    pub fn new(coin: String, size: Decimal, entry_price: Option<Decimal>) -> Self {
        Self {
            coin,
            size,
            entry_price,
        }
    }

    pub fn side(&self) -> Side {
        if self.size > Decimal::ZERO {
            Side::Long
        } else {
            Side::Short
        }
    }

    /// Unsigned size, for order submission and display.
    pub fn abs_size(&self) -> Decimal {
        self.size.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sign_encodes_direction() {
        let long = Position::new("BTC".to_string(), dec!(0.5), None);
        let short = Position::new("ETH".to_string(), dec!(-2), None);

        assert_eq!(long.side(), Side::Long);
        assert_eq!(short.side(), Side::Short);
        assert_eq!(short.abs_size(), dec!(2));
    }
}
