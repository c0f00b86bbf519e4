use serde::{Deserialize, Serialize};
use std::fmt;

/// A single failed constraint, reported against the field that broke it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug)]
pub enum AppError {
    /// Signature invalid or claims expired at verification time.
    Unauthorized(String),
    /// Reset token absent or past its TTL at exchange time.
    Forbidden(String),
    /// Aggregated validation failures, including uniqueness violations
    /// and password mismatch.
    BadRequest(Vec<Violation>),
    /// No identity matches the supplied lookup key.
    NotFound(String),
    /// The external store signaled an error independent of business rules.
    Storage(anyhow::Error),
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// A single-field `BadRequest`, for failures outside the validation
    /// engine (password mismatch, storage-level uniqueness conflicts).
    pub fn bad_request(field: &str, message: &str) -> Self {
        Self::BadRequest(vec![Violation::new(field, message)])
    }

    pub fn validation(violations: Vec<Violation>) -> Self {
        Self::BadRequest(violations)
    }

    pub fn resource_not_found(resource_type: &str, identifier: &str) -> Self {
        Self::NotFound(format!(
            "{} with identifier '{}' was not found",
            resource_type, identifier
        ))
    }

    pub fn token_expired() -> Self {
        Self::Unauthorized("Invalid token".to_string())
    }

    pub fn token_invalid() -> Self {
        Self::Unauthorized("Invalid token".to_string())
    }

    /// Stable machine-readable code for the caller-facing surface.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Violations carried by a `BadRequest`; empty for every other kind.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::BadRequest(violations) => violations,
            _ => &[],
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Storage(error)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Self::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            Self::BadRequest(violations) => {
                write!(f, "Bad request: ")?;
                for (i, violation) in violations.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", violation)?;
                }
                Ok(())
            }
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

// Extension trait to wrap collaborator errors with a specific kind
pub trait AppErrorExt<T> {
    fn storage_err(self) -> AppResult<T>;
}

impl<T, E> AppErrorExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn storage_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::Storage(e.into()))
    }
}
