//! # Validation Module
//!
//! Input validation utilities, run at the system boundary before business
//! logic. Storage constraints (NOT NULL, UNIQUE, foreign keys) back these up
//! as a second layer.

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an item quantity: positive, at most [`MAX_ITEM_QUANTITY`].
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive { field: "quantity".to_string() });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in céntimos. Zero is allowed (courtesy items).
pub fn validate_price_centimos(centimos: i64) -> ValidationResult<()> {
    if centimos < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a counted cash amount for a cash close. Must be non-negative.
pub fn validate_counted_cash(centimos: i64) -> ValidationResult<()> {
    if centimos < 0 {
        return Err(ValidationError::OutOfRange {
            field: "counted cash".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a person-name field (names, last names).
pub fn validate_person_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required { field: field.to_string() });
    }

    if value.len() > 120 {
        return Err(ValidationError::TooLong { field: field.to_string(), max: 120 });
    }

    Ok(())
}

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required { field: "name".to_string() });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong { field: "name".to_string(), max: 200 });
    }

    Ok(())
}

/// Validates a client code (`C001`, `caja1`, ...).
///
/// Alphanumeric plus hyphen/underscore, 1-20 characters.
pub fn validate_client_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required { field: "code".to_string() });
    }

    if code.len() > 20 {
        return Err(ValidationError::TooLong { field: "code".to_string(), max: 20 });
    }

    if !code.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a login PIN: 4 to 6 digits.
pub fn validate_pin(pin: &str) -> ValidationResult<()> {
    if pin.is_empty() {
        return Err(ValidationError::Required { field: "pin".to_string() });
    }

    if pin.len() < 4 || pin.len() > 6 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "pin".to_string(),
            reason: "must be 4 to 6 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a kitchen/lunch note.
pub fn validate_notes(notes: &str) -> ValidationResult<()> {
    if notes.len() > 280 {
        return Err(ValidationError::TooLong { field: "notes".to_string(), max: 280 });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(99).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(100).is_err());
    }

    #[test]
    fn test_validate_price_centimos() {
        assert!(validate_price_centimos(0).is_ok());
        assert!(validate_price_centimos(1099).is_ok());
        assert!(validate_price_centimos(-100).is_err());
    }

    #[test]
    fn test_validate_client_code() {
        assert!(validate_client_code("C001").is_ok());
        assert!(validate_client_code("caja_1").is_ok());

        assert!(validate_client_code("").is_err());
        assert!(validate_client_code("has space").is_err());
        assert!(validate_client_code(&"A".repeat(30)).is_err());
    }

    #[test]
    fn test_validate_pin() {
        assert!(validate_pin("1234").is_ok());
        assert!(validate_pin("123456").is_ok());

        assert!(validate_pin("").is_err());
        assert!(validate_pin("123").is_err());
        assert!(validate_pin("1234567").is_err());
        assert!(validate_pin("12a4").is_err());
    }

    #[test]
    fn test_validate_person_name() {
        assert!(validate_person_name("names", "María José").is_ok());
        assert!(validate_person_name("names", "  ").is_err());
        assert!(validate_person_name("names", &"x".repeat(200)).is_err());
    }
}
