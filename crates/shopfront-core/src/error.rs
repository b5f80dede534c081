//! # Error Types
//!
//! Domain-specific error types for shopfront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopfront-core errors (this file)                                     │
//! │  ├── CoreError        - Parsing and domain errors                      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shopfront-client errors (separate crate)                              │
//! │  └── ClientError      - HTTP, config and session failures              │
//! │                                                                         │
//! │  ValidationError stays local: the login flow turns it into a snackbar. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A price could not be read as a decimal amount.
    ///
    /// ## When This Occurs
    /// - Backend sends `"price": "abc"`
    /// - Backend sends a price with more than one decimal point
    #[error("Invalid money amount '{value}': {reason}")]
    InvalidMoney { value: String, reason: String },

    /// Role name is not one of `user` / `admin`.
    #[error("Unknown role: '{0}'. Valid options: user, admin")]
    UnknownRole(String),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any request is sent.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidMoney {
            value: "12.a".to_string(),
            reason: "not a number".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid money amount '12.a': not a number");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "phone".to_string(),
        };
        assert_eq!(err.to_string(), "phone is required");

        let err = ValidationError::TooShort {
            field: "phone".to_string(),
            min: 7,
        };
        assert_eq!(err.to_string(), "phone must be at least 7 characters");
    }
}
