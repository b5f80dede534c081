//! # Validation Module
//!
//! Input checks run before a store sends anything to the backend.
//!
//! ## Usage
//! ```rust
//! use shopfront_core::validation::{clamp_quantity, validate_phone};
//!
//! assert_eq!(clamp_quantity(0), 1);
//! assert!(validate_phone("08123456789").is_ok());
//! assert!(validate_phone("123").is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MIN_LINE_QUANTITY, MIN_PHONE_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Clamps a requested line quantity into
/// `MIN_LINE_QUANTITY..=MAX_LINE_QUANTITY`.
///
/// Applied on every cart write path; zero and negative inputs become 1.
#[inline]
pub fn clamp_quantity(quantity: i64) -> i64 {
    quantity.clamp(MIN_LINE_QUANTITY, MAX_LINE_QUANTITY)
}

/// Validates a phone number for the phone login flow.
///
/// ## Rules
/// - Must not be empty
/// - Must be at least 7 characters
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    if phone.chars().count() < MIN_PHONE_LENGTH {
        return Err(ValidationError::TooShort {
            field: "phone".to_string(),
            min: MIN_PHONE_LENGTH,
        });
    }

    Ok(())
}
