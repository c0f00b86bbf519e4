use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::{debug, info, warn};

use app_error::{AppError, AppResult, Violation};

/// Complete application configuration loaded from a JSON file.
///
/// Security-relevant values (the signing secret in particular) are read once
/// at startup and never mutated afterwards; rotating the secret means a new
/// process generation, never in-place mutation.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SecurityConfig {
    pub jwt: JwtConfig,
    pub reset_token: ResetTokenConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_days: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResetTokenConfig {
    pub ttl_minutes: u64,
    pub reset_url_base: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
        debug!("Configuration loaded from file");
        Ok(config)
    }

    /// Load configuration from the embedded default location
    pub fn load() -> AppResult<Self> {
        let config_content =
            std::str::from_utf8(include_bytes!("../res/app-config.json")).expect("Invalid UTF-8");

        let config = match serde_json::from_str::<AppConfig>(config_content) {
            Ok(conf) => {
                info!("Loaded configuration for environment: {}", conf.environment);
                conf
            }
            Err(e) => {
                warn!(
                    "Failed to load config file: {}. Using default configuration.",
                    e
                );
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        let is_production = self.environment == "production";

        if self.security.jwt.secret.trim().is_empty() {
            errors.push("JWT secret cannot be empty".to_string());
        }

        if is_production
            && (self.security.jwt.secret.len() < 32
                || self.security.jwt.secret == "your-strong-secret-key-here")
        {
            errors.push("JWT secret is not secure for production use".to_string());
        }

        if self.security.jwt.expiry_days == 0 {
            errors.push("JWT expiry cannot be 0 days".to_string());
        }

        if self.security.reset_token.ttl_minutes == 0 {
            errors.push("Reset token TTL cannot be 0 minutes".to_string());
        }

        if self.security.reset_token.reset_url_base.trim().is_empty() {
            errors.push("Reset URL base cannot be empty".to_string());
        }

        if !errors.is_empty() {
            return Err(AppError::validation(
                errors
                    .into_iter()
                    .map(|msg| Violation::new("config", msg))
                    .collect(),
            ));
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            security: SecurityConfig {
                jwt: JwtConfig {
                    secret: "your-strong-secret-key-here".to_string(),
                    expiry_days: 7,
                },
                reset_token: ResetTokenConfig {
                    ttl_minutes: 5,
                    reset_url_base: "https://localhost:3000/auth".to_string(),
                },
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "plain".to_string(),
            },
        }
    }
}
