//! Shared field validators.
//!
//! Create and update paths apply the same rules, so they live here rather
//! than inline in each pipeline. Every failure is an
//! [`Error::Validation`] naming the offending field.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{Error, Result};

#[allow(clippy::expect_used)]
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

#[allow(clippy::expect_used)]
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Optional leading +, then 7-20 digits with common separators.
    Regex::new(r"^\+?[0-9][0-9 ().\-]{5,18}[0-9]$").expect("phone pattern compiles")
});

/// Requires a non-empty name/title, returning it trimmed.
pub fn required_name(value: &str, field: &'static str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Validates an email address format.
pub fn email(value: &str) -> Result<()> {
    if EMAIL_RE.is_match(value.trim()) {
        Ok(())
    } else {
        Err(Error::validation("email", format!("`{value}` is not a valid email address")))
    }
}

/// Validates a phone number format.
pub fn phone(value: &str) -> Result<()> {
    if PHONE_RE.is_match(value.trim()) {
        Ok(())
    } else {
        Err(Error::validation("phone", format!("`{value}` is not a valid phone number")))
    }
}

/// Validates a budget range: each bound finite and non-negative,
/// and `min <= max` when both bounds are present.
pub fn budget_range(min: Option<f64>, max: Option<f64>) -> Result<()> {
    if let Some(value) = min {
        non_negative("budget_min", value)?;
    }
    if let Some(value) = max {
        non_negative("budget_max", value)?;
    }
    if let (Some(lo), Some(hi)) = (min, max)
        && lo > hi
    {
        return Err(Error::validation(
            "budget_min",
            format!("lower bound {lo} exceeds upper bound {hi}"),
        ));
    }
    Ok(())
}

/// Validates a lead score, returning it narrowed to the stored width.
pub fn score(value: i64) -> Result<u8> {
    match u8::try_from(value) {
        Ok(narrowed) if narrowed <= 100 => Ok(narrowed),
        _ => Err(Error::validation("score", format!("{value} is outside 0..=100"))),
    }
}

/// Validates a monetary amount that must be strictly positive.
pub fn positive_amount(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::validation(field, format!("{value} must be a positive amount")))
    }
}

/// Validates a monetary amount that must be finite and non-negative.
pub fn non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::validation(field, format!("{value} must be non-negative")))
    }
}
