//! Storage boundary for the authentication core. Persistence engines live
//! outside this workspace; the core only sees these traits. `MemoryStore`
//! is the in-process implementation used by tests and demos.

pub mod memory;

pub use memory::MemoryStore;

use app_models::{token::ResetToken, user::User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's own uniqueness constraint fired. This is the backstop
    /// for the window between a uniqueness pre-check and the insert.
    #[error("unique constraint violated on '{field}'")]
    UniqueViolation { field: String },
    #[error(transparent)]
    Unavailable(#[from] anyhow::Error),
}

// A storage-level uniqueness conflict surfaces to callers as the same
// BadRequest the validation pre-check would have produced; anything else
// is a storage failure, surfaced unmodified.
impl From<StoreError> for app_error::AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation { field } => {
                app_error::AppError::bad_request(&field, "already exists")
            }
            StoreError::Unavailable(cause) => app_error::AppError::Storage(cause),
        }
    }
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up a single identity by an arbitrary field of its document
    /// representation ("email", "id", ...).
    async fn find_by_field(
        &self,
        field: &str,
        value: &Value,
    ) -> Result<Option<User>, StoreError>;

    /// Insert a new identity. The password field must already be hashed.
    async fn persist(&self, user: User) -> Result<User, StoreError>;

    /// Replace an existing identity row.
    async fn update(&self, user: User) -> Result<User, StoreError>;
}

#[async_trait]
pub trait ResetTokenRepository: Send + Sync {
    /// Insert-or-overwrite keyed on the owning user: a second token for the
    /// same user replaces the first row's value and expiry. Must be a
    /// single atomic store operation.
    async fn upsert_by_owner(&self, token: ResetToken) -> Result<ResetToken, StoreError>;

    /// The row whose value matches and whose expiry is still in the
    /// future; absent or expired rows yield `None`, never an error.
    async fn find_valid(
        &self,
        value: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, StoreError>;
}
