//! Input validation helpers
//!
//! Text length constants and checks applied before anything is staged.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::slug::is_slug_char;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: restaurant, category, dish title
pub const MAX_NAME_LEN: usize = 200;

/// Dish descriptions
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Slugs (URL path segment)
pub const MAX_SLUG_LEN: usize = 100;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::required(field));
    }
    validate_len(value, field, max_len)
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value {
        validate_len(v, field, max_len)?;
    }
    Ok(())
}

fn validate_len(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.len() > max_len {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{field} is too long ({} chars, max {max_len})", value.len()),
        )
        .with_detail("field", field));
    }
    Ok(())
}

/// Prices are non-negative; zero is allowed (complimentary items).
pub fn validate_price(price: Decimal) -> Result<(), AppError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::with_message(
            ErrorCode::DishInvalidPrice,
            format!("price must not be negative (got {price})"),
        )
        .with_detail("field", "price"));
    }
    Ok(())
}

/// Slugs may be empty but only contain slug characters.
pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    validate_len(slug, "slug", MAX_SLUG_LEN)?;
    if let Some(bad) = slug.chars().find(|c| !is_slug_char(*c) || c.is_ascii_uppercase()) {
        return Err(AppError::with_message(
            ErrorCode::SlugInvalid,
            format!("slug contains invalid character '{bad}'"),
        )
        .with_detail("field", "slug"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Pasta", "name", MAX_NAME_LEN).is_ok());

        let err = validate_required_text("   ", "name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);

        let long = "x".repeat(MAX_NAME_LEN + 1);
        let err = validate_required_text(&long, "name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "description", 10).is_ok());
        assert!(validate_optional_text(&Some("short".into()), "description", 10).is_ok());
        assert!(validate_optional_text(&Some("much too long".into()), "description", 10).is_err());
    }

    #[test]
    fn test_price() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::from_str("12.50").unwrap()).is_ok());

        let err = validate_price(Decimal::from_str("-0.01").unwrap()).unwrap_err();
        assert_eq!(err.code, ErrorCode::DishInvalidPrice);
    }

    #[test]
    fn test_slug() {
        assert!(validate_slug("pizza-hut2").is_ok());
        assert!(validate_slug("").is_ok());
        assert_eq!(validate_slug("Pizza").unwrap_err().code, ErrorCode::SlugInvalid);
        assert_eq!(validate_slug("a b").unwrap_err().code, ErrorCode::SlugInvalid);
    }
}
