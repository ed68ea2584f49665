//! Input validation for registration and update requests.

use std::fmt;

/// A single validation failure, tied to the field that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field or path that failed validation.
    pub field: String,
    /// A human-readable description of the failure.
    pub message: String,
    /// The category of failure.
    pub kind: ValidationErrorKind,
}

/// The category of validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// A required field was not provided or was empty.
    Empty,
    /// The value's format is invalid.
    Format,
    /// A business constraint was violated.
    Constraint,
}

impl ValidationError {
    /// Creates an error for an empty or missing field.
    pub fn empty(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            message: format!("'{field}' must not be empty"),
            field,
            kind: ValidationErrorKind::Empty,
        }
    }

    /// Creates an error for an invalid format.
    ///
    /// # Examples
    ///
    /// ```
    /// use daedalus_core::validation::ValidationError;
    ///
    /// let error = ValidationError::format(
    ///     "tool_maintainer_email",
    ///     "must be a well-formed email address",
    /// );
    /// assert_eq!(error.field, "tool_maintainer_email");
    /// ```
    pub fn format(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind: ValidationErrorKind::Format,
        }
    }

    /// Creates an error for a violated business constraint.
    pub fn constraint(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind: ValidationErrorKind::Constraint,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error for '{}': {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// All failures found while validating one value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Records a failure.
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Returns true if nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of recorded failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterates the recorded failures.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// `Ok(())` if nothing failed, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the collection itself when it holds at least one failure.
    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => write!(f, "no validation errors"),
            [single] => write!(f, "{single}"),
            many => {
                let joined = many
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "{joined}")
            }
        }
    }
}

impl std::error::Error for ValidationErrors {}

/// Types that validate themselves before being persisted.
///
/// Registration and update requests call `validate` on the resulting
/// entry before it reaches the store.
pub trait Validate {
    /// Validates this instance, collecting every failure.
    ///
    /// # Errors
    ///
    /// Returns every validation failure found.
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Convenience check that `validate` returned `Ok`.
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_error_message() {
        let error = ValidationError::empty("path.repository");
        assert_eq!(error.kind, ValidationErrorKind::Empty);
        assert!(error.message.contains("must not be empty"));
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());

        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::empty("field"));
        let err = errors.into_result().unwrap_err();
        assert_eq!(err.len(), 1);
    }

    #[test]
    fn test_display_joins_failures() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::empty("path.organization"));
        errors.add(ValidationError::format("email", "must contain '@'"));

        let display = errors.to_string();
        assert!(display.contains("path.organization"));
        assert!(display.contains("email"));
    }
}
