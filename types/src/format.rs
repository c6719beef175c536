//! Display formatting for amounts, fees, durations and warnings.

use alloy_primitives::U256;
use alloy_primitives::utils;
pub use alloy_primitives::utils::UnitsError;

/// Shown in place of a fee or value that is zero or unknown.
pub const EMPTY_CURRENCY: &str = "$0";
pub const PRICE_NOT_AVAILABLE: &str = "Price not available";
pub const HIGH_SLIPPAGE_WARNING: &str =
    "Slippage higher than 1% may be frontrun and result in unfavorable prices.";

pub const SECONDS_IN_MINUTE: u64 = 60;
pub const SECONDS_IN_HOUR: u64 = 60 * SECONDS_IN_MINUTE;
pub const SECONDS_IN_DAY: u64 = 24 * SECONDS_IN_HOUR;

/// Estimated transfer times at or above this trigger a warning.
pub const WARNING_THRESHOLD_SECONDS: u64 = 5 * SECONDS_IN_MINUTE;
/// Price impact at or above this fraction triggers a warning.
pub const WARNING_THRESHOLD_PRICE_IMPACT: f64 = 0.02;
/// Price impact at or above this fraction blocks the action button.
pub const DISABLE_THRESHOLD_PRICE_IMPACT: f64 = 0.10;

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// US-dollar currency string with two decimals: `1234.5` → `$1,234.50`.
#[must_use]
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return EMPTY_CURRENCY.to_string();
    }
    let cents = (value.abs() * 100.0).round() as u128;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${}.{:02}", group_thousands(cents / 100), cents % 100)
}

/// Short USD string for input fields: `$1.50K`, `$2.00M`, `$3.10E15`.
#[must_use]
pub fn compact_usd(value: f64) -> String {
    const SUFFIXES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    if value >= 1e14 {
        return format!("${value:.2E}");
    }
    for (scale, suffix) in SUFFIXES {
        if value >= scale {
            return format!("{}{suffix}", format_usd(value / scale));
        }
    }
    format_usd(value)
}

/// USD value of `amount` tokens at `price`, compact form.
#[must_use]
pub fn usd_value(price: Option<f64>, amount: f64) -> String {
    match price {
        Some(price) if price.is_finite() => {
            if price == 0.0 {
                EMPTY_CURRENCY.to_string()
            } else {
                compact_usd(price * amount)
            }
        }
        Some(_) => PRICE_NOT_AVAILABLE.to_string(),
        None => EMPTY_CURRENCY.to_string(),
    }
}

/// Round `amount` to `decimals` places for display; amounts of one or more
/// get two places. Amounts that round to zero render as `<0.0…1`.
#[must_use]
pub fn readable_amount(amount: f64, decimals: usize) -> String {
    if !amount.is_finite() || amount == 0.0 {
        return "0".to_string();
    }
    let decimals = if amount >= 1.0 { 2 } else { decimals };
    let rounded: f64 = format!("{amount:.decimals$}").parse().unwrap_or(0.0);
    if rounded == 0.0 {
        return format!("<0.{}1", "0".repeat(decimals.saturating_sub(1)));
    }
    rounded.to_string()
}

fn plural(amount: u64) -> &'static str {
    if amount > 1 { "s" } else { "" }
}

#[must_use]
pub fn seconds_to_readable_time(seconds: u64) -> String {
    if seconds < SECONDS_IN_MINUTE {
        return format!("{seconds} second{}", plural(seconds));
    }
    if seconds < SECONDS_IN_HOUR {
        let minutes = seconds / SECONDS_IN_MINUTE;
        return format!("{minutes} minute{}", plural(minutes));
    }
    if seconds < SECONDS_IN_DAY {
        let hours = seconds / SECONDS_IN_HOUR;
        return format!("{hours} hour{}", plural(hours));
    }
    let days = seconds / SECONDS_IN_DAY;
    format!("{days} day{}", plural(days))
}

/// Warning for slow transfers, or `None` below the threshold.
#[must_use]
pub fn time_warning(seconds: u64) -> Option<String> {
    if seconds < WARNING_THRESHOLD_SECONDS {
        return None;
    }
    Some(format!(
        "The estimated waiting time to bridge is {}.",
        seconds_to_readable_time(seconds)
    ))
}

/// Warning for a price impact fraction, or `None` below the threshold.
#[must_use]
pub fn price_impact_warning(impact: f64) -> Option<String> {
    if !impact.is_finite() || impact < WARNING_THRESHOLD_PRICE_IMPACT {
        return None;
    }
    Some(format!(
        "You will receive {:.1}% less than the amount sent (in USD equivalent). Try sending smaller amounts to reduce price impact.",
        impact * 100.0
    ))
}

#[must_use]
pub fn is_high_price_impact(impact: Option<f64>) -> bool {
    impact.is_some_and(|impact| impact >= DISABLE_THRESHOLD_PRICE_IMPACT)
}

/// Base units to a decimal string without trailing zeros.
pub fn format_units(amount: U256, decimals: u8) -> Result<String, UnitsError> {
    let formatted = utils::format_units(amount, decimals)?;
    if !formatted.contains('.') {
        return Ok(formatted);
    }
    Ok(formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string())
}

/// Lossy float view of a base-unit amount, for USD math.
#[must_use]
pub fn units_to_f64(amount: U256, decimals: u8) -> f64 {
    format_units(amount, decimals)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0)
}
