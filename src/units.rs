use std::str::FromStr;

use alloy_primitives::U256;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::error::ValidationError;

fn pow10(decimals: u8) -> Option<Decimal> {
    (0..decimals).try_fold(Decimal::ONE, |acc, _| acc.checked_mul(Decimal::TEN))
}

/// Parses a human amount such as `"0.5"` into smallest units.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, ValidationError> {
    let invalid = || ValidationError::InvalidAmount(amount.to_string());
    let value = Decimal::from_str(amount.trim()).map_err(|_| invalid())?.normalize();
    if value.is_sign_negative() || value.scale() > u32::from(decimals) {
        return Err(invalid());
    }
    from_decimal(value, decimals).ok_or_else(invalid)
}

/// Smallest units -> human amount, trailing zeros stripped.
pub fn format_units(value: U256, decimals: u8) -> String {
    if let Some(d) = to_decimal(value, decimals) {
        return d.normalize().to_string();
    }
    let digits = value.to_string();
    let decimals = usize::from(decimals);
    if decimals == 0 {
        return digits;
    }
    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (int, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        int.to_string()
    } else {
        format!("{int}.{frac}")
    }
}

/// `None` when the value does not fit a 96-bit decimal mantissa.
pub fn to_decimal(value: U256, decimals: u8) -> Option<Decimal> {
    let value = i128::try_from(u128::try_from(value).ok()?).ok()?;
    Decimal::try_from_i128_with_scale(value, u32::from(decimals)).ok()
}

pub fn from_decimal(value: Decimal, decimals: u8) -> Option<U256> {
    value
        .checked_mul(pow10(decimals)?)?
        .trunc()
        .to_u128()
        .map(U256::from)
}

pub fn decimal_from_f64(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value)
}

/// Buy units received per sell unit, in human terms.
pub fn price(sell_amount: U256, sell_decimals: u8, buy_amount: U256, buy_decimals: u8) -> String {
    let ratio = to_decimal(sell_amount, sell_decimals)
        .zip(to_decimal(buy_amount, buy_decimals))
        .and_then(|(sell, buy)| buy.checked_div(sell));
    if let Some(r) = ratio {
        return r.round_dp(12).normalize().to_string();
    }
    // outside decimal range: approximate
    let sell = format_units(sell_amount, sell_decimals).parse::<f64>().unwrap_or(0.0);
    let buy = format_units(buy_amount, buy_decimals).parse::<f64>().unwrap_or(0.0);
    if sell > 0.0 && buy.is_finite() {
        (buy / sell).to_string()
    } else {
        "0".to_string()
    }
}
