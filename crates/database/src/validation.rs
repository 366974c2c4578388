//! Input validation for messaging operations.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty value where one is required.
    Empty(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Unknown thread status.
    InvalidStatus(String),
    /// Unknown message importance.
    InvalidImportance(String),
    /// Unknown channel kind.
    InvalidChannelKind(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::InvalidStatus(value) => {
                write!(f, "unknown status '{}' (expected active, paused, or closed)", value)
            }
            ValidationError::InvalidImportance(value) => {
                write!(
                    f,
                    "unknown importance '{}' (expected low, normal, high, or urgent)",
                    value
                )
            }
            ValidationError::InvalidChannelKind(value) => {
                write!(f, "unknown channel kind '{}' (expected public or dm)", value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for agent identifiers.
pub const MAX_AGENT_ID_LENGTH: usize = 64;

/// Maximum allowed length for thread titles and channel names.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum allowed length for message bodies.
pub const MAX_BODY_LENGTH: usize = 65_536;

/// Maximum allowed length for task and session references.
pub const MAX_REF_LENGTH: usize = 200;

/// Validate an agent identifier under the given field name.
pub fn validate_agent_id(field: &str, value: &str) -> Result<(), ValidationError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }

    if value.len() > MAX_AGENT_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_AGENT_ID_LENGTH,
            actual: value.len(),
        });
    }

    Ok(())
}

/// Validate a thread title or channel name.
pub fn validate_title(field: &str, value: &str) -> Result<(), ValidationError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }

    if value.len() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TITLE_LENGTH,
            actual: value.len(),
        });
    }

    Ok(())
}

/// Validate a message body.
pub fn validate_body(body: &str) -> Result<(), ValidationError> {
    if body.trim().is_empty() {
        return Err(ValidationError::Empty("body".to_string()));
    }

    if body.len() > MAX_BODY_LENGTH {
        return Err(ValidationError::TooLong {
            field: "body".to_string(),
            max: MAX_BODY_LENGTH,
            actual: body.len(),
        });
    }

    Ok(())
}

/// Validate an optional task or session reference.
pub fn validate_reference(field: &str, value: &str) -> Result<(), ValidationError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }

    if value.len() > MAX_REF_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_REF_LENGTH,
            actual: value.len(),
        });
    }

    Ok(())
}
