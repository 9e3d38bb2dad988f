//! Percent-of-margin position sizing with per-asset quantization.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::{Result, TradeError};

/// Coins whose orders must be whole units.
///
/// Venue listing policy for these assets, not something the metadata
/// endpoint reports.
const INTEGER_SIZE_COINS: &[&str] = &["XRP", "DOGE", "SHIB", "FARTCOIN"];

/// Decimal places allowed on every other coin's order size.
const SIZE_DECIMALS: u32 = 4;

/// Compute an order size from available margin.
///
/// `usd = withdrawable * percent / 100`, leveraged and divided by the
/// current price, then quantized to the coin's size rules. A non-positive
/// result means the account cannot support the requested order; it is
/// reported as a validation failure and never submitted.
pub fn compute_size(
    withdrawable: Decimal,
    percent: u32,
    max_leverage: u32,
    price: Decimal,
    coin: &str,
) -> Result<Decimal> {
    if !(1..=100).contains(&percent) {
        return Err(TradeError::validation(format!(
            "Percentage must be between 1 and 100, got {percent}"
        )));
    }
    if price <= Decimal::ZERO {
        return Err(TradeError::validation(format!(
            "Invalid price (0 or negative) for {coin}"
        )));
    }
    if withdrawable <= Decimal::ZERO {
        return Err(TradeError::validation(
            "Insufficient balance: no USDC available for trading",
        ));
    }

    let usd_amount = withdrawable * Decimal::from(percent) / dec!(100);
    let raw_size = usd_amount * Decimal::from(max_leverage) / price;
    let size = quantize(raw_size, coin);

    if size <= Decimal::ZERO {
        return Err(TradeError::validation(
            "Calculated position size too small. Try increasing the percentage.",
        ));
    }

    Ok(size)
}

/// Truncate whole-unit coins, round everything else to four decimals.
fn quantize(raw: Decimal, coin: &str) -> Decimal {
    if INTEGER_SIZE_COINS.contains(&coin) {
        raw.trunc().normalize()
    } else {
        raw.round_dp(SIZE_DECIMALS).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worked_example() {
        // 1000 USDC, 10% at 20x against a 50000 price: 100 USD margin,
        // 2000 USD notional, 0.04 BTC.
        let size = compute_size(dec!(1000), 10, 20, dec!(50000), "BTC").unwrap();
        assert_eq!(size, dec!(0.04));
    }

    #[test]
    fn test_monotonic_in_percent() {
        let mut last = Decimal::ZERO;
        for percent in [1, 5, 10, 25, 50, 75, 100] {
            let size = compute_size(dec!(1000), percent, 20, dec!(50000), "BTC").unwrap();
            assert!(size >= last, "size decreased at {percent}%");
            last = size;
        }
    }

    #[test]
    fn test_monotonic_in_balance() {
        let mut last = Decimal::ZERO;
        for balance in [dec!(10), dec!(100), dec!(1000), dec!(25000)] {
            let size = compute_size(balance, 10, 20, dec!(50000), "BTC").unwrap();
            assert!(size >= last, "size decreased at balance {balance}");
            last = size;
        }
    }

    #[test]
    fn test_integer_coins_truncate_to_whole_units() {
        // 500 * 0.1 * 10 / 3.1 = 161.29..., truncated, never rounded up.
        let size = compute_size(dec!(500), 10, 10, dec!(3.1), "XRP").unwrap();
        assert_eq!(size, dec!(161));
        assert_eq!(size.fract(), Decimal::ZERO);
    }

    #[test]
    fn test_decimal_coins_round_to_four_places() {
        let size = compute_size(dec!(777), 7, 13, dec!(1893.35), "ETH").unwrap();
        assert!(size.scale() <= 4);
        assert!(size > Decimal::ZERO);
    }

    #[test]
    fn test_non_positive_price_rejected() {
        assert!(compute_size(dec!(1000), 10, 20, Decimal::ZERO, "BTC").is_err());
        assert!(compute_size(dec!(1000), 10, 20, dec!(-1), "BTC").is_err());
    }

    #[test]
    fn test_non_positive_balance_rejected() {
        assert!(compute_size(Decimal::ZERO, 10, 20, dec!(50000), "BTC").is_err());
        assert!(compute_size(dec!(-5), 10, 20, dec!(50000), "BTC").is_err());
    }

    #[test]
    fn test_percent_out_of_range_rejected() {
        assert!(compute_size(dec!(1000), 0, 20, dec!(50000), "BTC").is_err());
        assert!(compute_size(dec!(1000), 101, 20, dec!(50000), "BTC").is_err());
    }

    #[test]
    fn test_dust_size_is_terminal() {
        // Rounds to zero for BTC at four decimals.
        let result = compute_size(dec!(0.01), 1, 1, dec!(50000), "BTC");
        assert!(matches!(result, Err(TradeError::Validation(_))));

        // Truncates to zero for a whole-unit coin.
        let result = compute_size(dec!(1), 1, 1, dec!(3), "XRP");
        assert!(matches!(result, Err(TradeError::Validation(_))));
    }
}
