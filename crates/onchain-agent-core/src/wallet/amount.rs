//! Exact conversion between whole-unit and atomic-unit amounts
//!
//! Amounts cross the platform boundary as decimal strings. Conversion is
//! done on digits so 18-decimal assets never lose precision.

use crate::error::{Error, Result};

/// Decimals of assets the platform knows natively
pub fn known_decimals(asset_id: &str) -> Option<u32> {
    match asset_id.to_ascii_lowercase().as_str() {
        "eth" | "weth" => Some(18),
        "usdc" => Some(6),
        "gwei" => Some(9),
        "wei" => Some(0),
        _ => None,
    }
}

/// Convert a whole-unit amount ("0.01") to atomic units ("10000000000000000")
pub fn to_atomic(amount: &str, decimals: u32) -> Result<String> {
    let amount = amount.trim();
    let (whole, frac) = split_decimal(amount)?;

    if frac.len() > decimals as usize {
        return Err(Error::InvalidInput(format!(
            "Amount '{}' has more than {} decimal places",
            amount, decimals
        )));
    }

    let mut digits = String::with_capacity(whole.len() + decimals as usize);
    digits.push_str(whole);
    digits.push_str(frac);
    for _ in frac.len()..decimals as usize {
        digits.push('0');
    }

    Ok(strip_leading_zeros(&digits))
}

/// Convert an atomic amount back to whole units, trimming trailing zeros
pub fn from_atomic(atomic: &str, decimals: u32) -> Result<String> {
    let atomic = atomic.trim();
    if atomic.is_empty() || !atomic.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidInput(format!(
            "Atomic amount '{}' must be a non-negative integer",
            atomic
        )));
    }

    let decimals = decimals as usize;
    let padded = if atomic.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - atomic.len()), atomic)
    } else {
        atomic.to_string()
    };

    let split = padded.len() - decimals;
    let whole = strip_leading_zeros(&padded[..split]);
    let frac = padded[split..].trim_end_matches('0');

    if frac.is_empty() {
        Ok(whole)
    } else {
        Ok(format!("{}.{}", whole, frac))
    }
}

/// Whether the amount is a valid, strictly positive decimal
pub fn is_positive(amount: &str) -> bool {
    match split_decimal(amount.trim()) {
        Ok((whole, frac)) => whole.bytes().chain(frac.bytes()).any(|b| b != b'0'),
        Err(_) => false,
    }
}

fn split_decimal(amount: &str) -> Result<(&str, &str)> {
    let invalid = || {
        Error::InvalidInput(format!(
            "Amount '{}' must be a non-negative decimal number",
            amount
        ))
    };

    let (whole, frac) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    Ok((whole, frac))
}

fn strip_leading_zeros(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
