//! Error Types for Reading Validation Failures
//!
//! ## Design Philosophy
//!
//! Validation errors travel on the hot path of every request, so they follow
//! the same rules as the rest of the core crate:
//!
//! 1. **Small Size**: Each variant carries a handful of scalars at most.
//!
//! 2. **No Heap Allocation**: Field names are `&'static str`, never `String`.
//!
//! 3. **Copy Semantics**: Errors are `Copy` so the engine can log them and
//!    still hand them to the response fallback without cloning.
//!
//! ## When Errors Occur
//!
//! The transport layer rejects malformed JSON before the engine runs, so in
//! practice these errors only fire for numerically hostile input that is still
//! syntactically valid, e.g. a float that overflowed to infinity on the device.
//! The engine converts every error into the safe default response:
//!
//! ```rust
//! use railguard_core::ValidationError;
//!
//! fn describe(err: ValidationError) -> &'static str {
//!     match err {
//!         ValidationError::NonFinite { field } => field,
//!         ValidationError::OutOfRange { .. } => "range",
//!     }
//! }
//!
//! assert_eq!(describe(ValidationError::NonFinite { field: "accel_x" }), "accel_x");
//! ```

use thiserror_no_std::Error;

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation errors - kept small for the request hot path
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ValidationError {
    /// A numeric field is NaN or infinite
    #[error("Field {field} is not a finite number")]
    NonFinite {
        /// Name of the offending request field
        field: &'static str,
    },

    /// Value outside an accepted range
    #[error("Value {value} outside range [{min}, {max}]")]
    OutOfRange {
        /// The rejected value
        value: f64,
        /// Minimum accepted value
        min: f64,
        /// Maximum accepted value
        max: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn error_messages() {
        let err = ValidationError::NonFinite { field: "mag_z" };
        assert_eq!(err.to_string(), "Field mag_z is not a finite number");

        let err = ValidationError::OutOfRange { value: 2.0, min: 0.0, max: 1.0 };
        assert_eq!(err.to_string(), "Value 2 outside range [0, 1]");
    }
}
