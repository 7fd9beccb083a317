//! Submission validation: trimmed text must be non-empty and within the
//! length limit.

use std::fmt;

/// Hard limit on submission length, in characters.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 2000;

/// Length at which the input surface starts warning about the limit.
pub const SOFT_LIMIT_CHARS: usize = 1900;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty,
    TooLong { len: usize, max: usize },
}

impl ValidationError {
    /// Text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::Empty => "Please enter a message".to_string(),
            ValidationError::TooLong { max, .. } => format!("Message exceeds {max} characters"),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty => write!(f, "empty submission"),
            ValidationError::TooLong { len, max } => {
                write!(f, "submission too long ({len} > {max} chars)")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Returns the trimmed submission if it is acceptable.
pub fn validate(text: &str, max_chars: usize) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    let len = trimmed.chars().count();
    if len > max_chars {
        return Err(ValidationError::TooLong { len, max: max_chars });
    }
    Ok(trimmed)
}
