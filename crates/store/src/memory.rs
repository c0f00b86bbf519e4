use crate::{IdentityStore, ResetTokenRepository, StoreError};

use app_error::AppResult;
use app_models::{token::ResetToken, user::User};
use app_validation::engine::ExistenceLookup;
use app_validation::rules::EntityKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory store: users and reset tokens in maps behind async locks,
/// plus generic rows for the entities uniqueness rules can target.
/// Reset tokens are keyed by owner, so upsert-by-owner is one map insert.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    reset_tokens: RwLock<HashMap<Uuid, ResetToken>>,
    rows: RwLock<HashMap<EntityKind, Vec<Map<String, Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a non-user row (company, campaign) for existence queries.
    pub async fn insert_row(&self, entity: EntityKind, doc: Map<String, Value>) {
        self.rows.write().await.entry(entity).or_default().push(doc);
    }

    fn field_of(user: &User, field: &str) -> Option<Value> {
        serde_json::to_value(user)
            .ok()
            .and_then(|doc| doc.get(field).cloned())
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_by_field(
        &self,
        field: &str,
        value: &Value,
    ) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|user| Self::field_of(user, field).as_ref() == Some(value))
            .cloned())
    }

    async fn persist(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::UniqueViolation {
                field: "email".to_string(),
            });
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(StoreError::Unavailable(anyhow::anyhow!(
                "no user row with id {}",
                user.id
            )));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl ResetTokenRepository for MemoryStore {
    async fn upsert_by_owner(&self, token: ResetToken) -> Result<ResetToken, StoreError> {
        self.reset_tokens
            .write()
            .await
            .insert(token.user_id, token.clone());
        Ok(token)
    }

    async fn find_valid(
        &self,
        value: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, StoreError> {
        let tokens = self.reset_tokens.read().await;
        Ok(tokens
            .values()
            .find(|row| row.token == value && row.is_fresh(now))
            .cloned())
    }
}

#[async_trait]
impl ExistenceLookup for MemoryStore {
    async fn count_by_field(
        &self,
        entity: EntityKind,
        field: &str,
        value: &Value,
    ) -> AppResult<u64> {
        match entity {
            EntityKind::Users => {
                let users = self.users.read().await;
                Ok(users
                    .values()
                    .filter(|user| Self::field_of(user, field).as_ref() == Some(value))
                    .count() as u64)
            }
            _ => {
                let rows = self.rows.read().await;
                let count = rows
                    .get(&entity)
                    .map(|docs| docs.iter().filter(|doc| doc.get(field) == Some(value)).count())
                    .unwrap_or(0);
                Ok(count as u64)
            }
        }
    }
}
