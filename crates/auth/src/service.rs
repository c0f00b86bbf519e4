use app_config::AppConfig;
use app_error::{AppError, AppResult};
use app_models::user::{AuthResponse, LoginInput, RegisterInput, User, UserProfile, UserUpdate};
use app_models::token::ResetToken;
use app_store::IdentityStore;
use app_store::ResetTokenRepository;
use app_validation::engine::ExistenceLookup;
use app_validation::rules::Ruleset;
use app_validation::shapes::registration_rules;
use app_validation::ValidationEngine;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tracing::{error, info, warn};

use crate::email::MailDispatch;
use crate::jwt::JwtService;
use crate::password::{hash_password, verify_password};
use crate::reset::ResetTokens;

/// The four user-facing credential flows, plus the validation surface that
/// gates entity creation for callers outside this crate.
#[async_trait]
pub trait AuthServiceTrait: Send + Sync {
    async fn login(&self, input: LoginInput) -> AppResult<AuthResponse>;

    async fn register(&self, input: RegisterInput) -> AppResult<AuthResponse>;

    async fn forgot_password(&self, email: &str) -> AppResult<ResetToken>;

    /// Exchange a still-valid reset token for fresh access claims.
    async fn exchange_reset_token(&self, token: &str) -> AppResult<String>;

    /// Explicit password-change path: the only mutation of a stored
    /// credential, always through the hasher.
    async fn update_user(&self, update: UserUpdate) -> AppResult<UserProfile>;

    async fn validate(&self, doc: &Map<String, Value>, ruleset: &Ruleset) -> AppResult<()>;
}

pub struct AuthService {
    jwt_service: Arc<JwtService>,
    identities: Arc<dyn IdentityStore>,
    reset_tokens: ResetTokens,
    mailer: Arc<dyn MailDispatch>,
    validator: ValidationEngine,
    reset_url_base: String,
}

impl AuthService {
    pub fn new(
        config: &AppConfig,
        identities: Arc<dyn IdentityStore>,
        reset_repo: Arc<dyn ResetTokenRepository>,
        lookup: Arc<dyn ExistenceLookup>,
        mailer: Arc<dyn MailDispatch>,
    ) -> Self {
        let security = &config.security;
        Self {
            jwt_service: Arc::new(JwtService::new(
                security.jwt.secret.as_bytes(),
                security.jwt.expiry_days,
            )),
            identities,
            reset_tokens: ResetTokens::new(
                reset_repo,
                Duration::minutes(security.reset_token.ttl_minutes as i64),
            ),
            mailer,
            validator: ValidationEngine::new(lookup),
            reset_url_base: security.reset_token.reset_url_base.clone(),
        }
    }

    pub fn jwt_service(&self) -> Arc<JwtService> {
        Arc::clone(&self.jwt_service)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.identities.find_by_field("email", &json!(email)).await?)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.identities.find_by_field("id", &json!(id)).await?)
    }
}

#[async_trait]
impl AuthServiceTrait for AuthService {
    async fn login(&self, input: LoginInput) -> AppResult<AuthResponse> {
        let user = self
            .find_by_email(&input.email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        // Argon2 is CPU-bound by design; keep it off the I/O scheduler.
        let password = input.password;
        let stored_hash = user.password.clone();
        let is_match = spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|e| AppError::Storage(anyhow::anyhow!("hashing task failed: {}", e)))??;

        if !is_match {
            return Err(AppError::bad_request(
                "password",
                "Email or password is incorrect",
            ));
        }

        let token = self.jwt_service.generate_token(&user)?;
        info!(user_id = %user.id, "User logged in");

        Ok(AuthResponse {
            token,
            user: UserProfile::from(user),
        })
    }

    async fn register(&self, input: RegisterInput) -> AppResult<AuthResponse> {
        // Full validation, uniqueness included, before any mutation.
        self.validator
            .validate(&input.as_document(), &registration_rules())
            .await?;

        let plaintext = input.password.clone();
        let hashed_password = spawn_blocking(move || hash_password(&plaintext))
            .await
            .map_err(|e| AppError::Storage(anyhow::anyhow!("hashing task failed: {}", e)))??;

        let user = User::new(
            input.name,
            input.email,
            hashed_password,
            input.mobile_number,
            1,
        );

        // The uniqueness pre-check and this insert are not atomic; a
        // concurrent registration can slip between them. The store's own
        // constraint is the backstop, and its conflict surfaces as the
        // same "already exists" BadRequest the pre-check produces.
        let stored_user = self.identities.persist(user).await.map_err(|e| {
            error!("Failed to persist new identity: {}", e);
            AppError::from(e)
        })?;

        let token = self.jwt_service.generate_token(&stored_user)?;
        info!(user_id = %stored_user.id, "User registered");

        Ok(AuthResponse {
            token,
            user: UserProfile::from(stored_user),
        })
    }

    async fn forgot_password(&self, email: &str) -> AppResult<ResetToken> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let token = self.reset_tokens.issue(user.id).await?;

        // Delivery failure must not fail the flow; the token is already
        // stored and the caller still gets its result.
        let reset_url = format!("{}?token={}", self.reset_url_base, token.token);
        if let Err(e) = self
            .mailer
            .send_password_reset(&user.email, &reset_url, &user.name)
            .await
        {
            warn!(user_id = %user.id, "Failed to dispatch reset email: {}", e);
        }

        Ok(token)
    }

    async fn exchange_reset_token(&self, token: &str) -> AppResult<String> {
        let row = self
            .reset_tokens
            .lookup_valid(token, Utc::now())
            .await?
            .ok_or_else(|| AppError::forbidden("Token has expired"))?;

        let owner = self
            .find_by_id(&row.user_id.to_string())
            .await?
            .ok_or_else(|| AppError::resource_not_found("User", &row.user_id.to_string()))?;

        let access_token = self.jwt_service.generate_token(&owner)?;
        info!(user_id = %owner.id, "Reset token exchanged for access claims");

        Ok(access_token)
    }

    async fn update_user(&self, update: UserUpdate) -> AppResult<UserProfile> {
        self.validator
            .validate_partial(&update.as_document(), &registration_rules())
            .await?;

        let mut user = self
            .find_by_id(&update.id.to_string())
            .await?
            .ok_or_else(|| AppError::resource_not_found("User", &update.id.to_string()))?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(mobile_number) = update.mobile_number {
            user.mobile_number = mobile_number;
        }
        if let Some(password) = update.password {
            let hashed = spawn_blocking(move || hash_password(&password))
                .await
                .map_err(|e| AppError::Storage(anyhow::anyhow!("hashing task failed: {}", e)))??;
            user.password = hashed;
        }

        let stored = self.identities.update(user).await?;
        info!(user_id = %stored.id, "User updated");

        Ok(UserProfile::from(stored))
    }

    async fn validate(&self, doc: &Map<String, Value>, ruleset: &Ruleset) -> AppResult<()> {
        self.validator.validate(doc, ruleset).await
    }
}
