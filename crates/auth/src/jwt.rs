use app_error::{AppError, AppResult};
use app_models::user::User;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The signed, time-bounded identity assertion issued after successful
/// authentication. Immutable once signed; expiry is the only invalidation
/// mechanism (there is no revocation list).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,   // Subject (user ID)
    pub email: String, // Email snapshot at issuance
    pub role: u8,
    pub iat: i64, // Issued at
    pub exp: i64, // Expiration time
}

/// Issues and verifies signed access claims with a process-wide secret.
/// The secret is read-only after construction; rotation means a new
/// process generation, which silently invalidates outstanding claims.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_days: u64,
}

impl JwtService {
    pub fn new(secret: &[u8], expiry_days: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry_days,
        }
    }

    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let expires_at = now + Duration::days(self.expiry_days as i64);

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Storage(anyhow::anyhow!("Failed to generate token: {}", e)))
    }

    /// Verify a token and return its claims. Pure, no side effects.
    ///
    /// Every failure mode (malformed payload, bad signature, expired
    /// claims) is normalized to the same `Unauthorized`; the distinction
    /// is only logged, never returned, so callers cannot be used as an
    /// oracle.
    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &Validation::default()).map_err(|e| {
                debug!("Token verification failed: {}", e);
                AppError::token_invalid()
            })?;

        Ok(token_data.claims)
    }
}
