use app_auth::service::{AuthService, AuthServiceTrait};
use app_auth::email::MailDispatch;
use app_config::AppConfig;
use app_error::{AppError, AppResult};
use app_models::token::ResetToken;
use app_models::user::{LoginInput, RegisterInput, UserUpdate};
use app_store::{MemoryStore, ResetTokenRepository};
use app_validation::engine::ExistenceLookup;
use app_validation::rules::EntityKind;
use app_validation::shapes::{campaign_rules, company_rules};
use async_trait::async_trait;
use chrono::Duration;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

// Mailer double that records every dispatch and can be made to fail;
// forgot-password must succeed either way.
struct RecordingMailer {
    sent: Mutex<Vec<(String, String, String)>>,
    fail: bool,
}

impl RecordingMailer {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail,
        })
    }

    fn sent_urls(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, url, _)| url.clone()).collect()
    }
}

#[async_trait]
impl MailDispatch for RecordingMailer {
    async fn send_password_reset(&self, to: &str, reset_url: &str, name: &str) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Storage(anyhow::anyhow!("smtp unreachable")));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), reset_url.to_string(), name.to_string()));
        Ok(())
    }
}

// Existence lookup that never sees the concurrent writer: simulates the
// window between the uniqueness pre-check and the insert.
struct BlindLookup;

#[async_trait]
impl ExistenceLookup for BlindLookup {
    async fn count_by_field(
        &self,
        _entity: EntityKind,
        _field: &str,
        _value: &Value,
    ) -> AppResult<u64> {
        Ok(0)
    }
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.security.jwt.secret = "test_jwt_secret_for_flow_tests".to_string();
    config
}

struct Harness {
    service: AuthService,
    store: Arc<MemoryStore>,
    mailer: Arc<RecordingMailer>,
}

fn setup() -> Harness {
    setup_with(false, false)
}

fn setup_with(failing_mailer: bool, blind_lookup: bool) -> Harness {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let store = Arc::new(MemoryStore::new());
    let mailer = RecordingMailer::new(failing_mailer);
    let lookup: Arc<dyn ExistenceLookup> = if blind_lookup {
        Arc::new(BlindLookup)
    } else {
        store.clone()
    };

    let service = AuthService::new(
        &test_config(),
        store.clone(),
        store.clone(),
        lookup,
        mailer.clone(),
    );

    Harness {
        service,
        store,
        mailer,
    }
}

fn register_input(email: &str) -> RegisterInput {
    RegisterInput {
        name: "Test User".to_string(),
        email: email.to_string(),
        password: "secure_password123".to_string(),
        mobile_number: "0501234567".to_string(),
    }
}

#[tokio::test]
async fn register_then_login_round_trip() {
    let harness = setup();

    let registered = harness
        .service
        .register(register_input("a@x.com"))
        .await
        .unwrap();

    let logged_in = harness
        .service
        .login(LoginInput {
            email: "a@x.com".to_string(),
            password: "secure_password123".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(logged_in.user.id, registered.user.id);

    // Claims round-trip within the issuance window.
    let claims = harness
        .service
        .jwt_service()
        .verify_token(&logged_in.token)
        .unwrap();
    assert_eq!(claims.sub, registered.user.id.to_string());
    assert_eq!(claims.email, "a@x.com");
    assert_eq!(claims.role, 1);
}

#[tokio::test]
async fn login_failures_have_distinct_kinds() {
    let harness = setup();
    harness
        .service
        .register(register_input("a@x.com"))
        .await
        .unwrap();

    let not_found = harness
        .service
        .login(LoginInput {
            email: "nobody@x.com".to_string(),
            password: "secure_password123".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(not_found.code(), "NOT_FOUND");

    let mismatch = harness
        .service
        .login(LoginInput {
            email: "a@x.com".to_string(),
            password: "wrong_password".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(mismatch.code(), "BAD_REQUEST");
}

#[tokio::test]
async fn duplicate_email_fails_the_uniqueness_pre_check() {
    let harness = setup();
    harness
        .service
        .register(register_input("a@x.com"))
        .await
        .unwrap();

    let err = harness
        .service
        .register(register_input("a@x.com"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BAD_REQUEST");
    assert!(err.violations().iter().any(|v| v.field == "email"));
}

#[tokio::test]
async fn all_registration_violations_arrive_together() {
    let harness = setup();
    harness
        .service
        .register(register_input("a@x.com"))
        .await
        .unwrap();

    // Missing name and a taken email: both must be reported in one pass.
    let mut input = register_input("a@x.com");
    input.name = String::new();
    let err = harness.service.register(input).await.unwrap_err();

    let fields: Vec<_> = err.violations().iter().map(|v| v.field.as_str()).collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"email"));
}

#[tokio::test]
async fn storage_conflict_falls_back_to_the_same_bad_request() {
    // The pre-check and the insert are not atomic. With a lookup that
    // cannot see the existing row, the store's own constraint must fire
    // and surface as the "already exists" BadRequest.
    let harness = setup_with(false, true);
    harness
        .service
        .register(register_input("a@x.com"))
        .await
        .unwrap();

    let err = harness
        .service
        .register(register_input("a@x.com"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BAD_REQUEST");
    assert_eq!(err.violations()[0].field, "email");
    assert_eq!(err.violations()[0].message, "already exists");
}

#[tokio::test]
async fn forgot_password_issues_and_emails_a_token() {
    let harness = setup();
    harness
        .service
        .register(register_input("a@x.com"))
        .await
        .unwrap();

    let token = harness.service.forgot_password("a@x.com").await.unwrap();

    let urls = harness.mailer.sent_urls();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].contains(&token.token));

    let unknown = harness
        .service
        .forgot_password("nobody@x.com")
        .await
        .unwrap_err();
    assert_eq!(unknown.code(), "NOT_FOUND");
}

#[tokio::test]
async fn forgot_password_survives_mailer_failure() {
    let harness = setup_with(true, false);
    harness
        .service
        .register(register_input("a@x.com"))
        .await
        .unwrap();

    // Delivery failure is logged, not propagated.
    let token = harness.service.forgot_password("a@x.com").await.unwrap();
    assert!(!token.token.is_empty());
}

#[tokio::test]
async fn reissue_invalidates_the_previous_token() {
    let harness = setup();
    harness
        .service
        .register(register_input("a@x.com"))
        .await
        .unwrap();

    let first = harness.service.forgot_password("a@x.com").await.unwrap();
    let second = harness.service.forgot_password("a@x.com").await.unwrap();

    // Single-active invariant: the first value no longer resolves even
    // though its TTL has not elapsed.
    let err = harness
        .service
        .exchange_reset_token(&first.token)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");

    assert!(
        harness
            .service
            .exchange_reset_token(&second.token)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn exchange_returns_claims_for_the_owner() {
    let harness = setup();
    let registered = harness
        .service
        .register(register_input("a@x.com"))
        .await
        .unwrap();

    let token = harness.service.forgot_password("a@x.com").await.unwrap();
    let access = harness
        .service
        .exchange_reset_token(&token.token)
        .await
        .unwrap();

    let claims = harness.service.jwt_service().verify_token(&access).unwrap();
    assert_eq!(claims.sub, registered.user.id.to_string());

    // No consume-on-use: the same still-fresh token exchanges again.
    assert!(
        harness
            .service
            .exchange_reset_token(&token.token)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn expired_or_absent_reset_tokens_are_forbidden() {
    let harness = setup();
    let registered = harness
        .service
        .register(register_input("a@x.com"))
        .await
        .unwrap();

    let absent = harness
        .service
        .exchange_reset_token("no-such-token")
        .await
        .unwrap_err();
    assert_eq!(absent.code(), "FORBIDDEN");

    // Plant a row that is already past its TTL.
    let mut expired = ResetToken::issue(registered.user.id, Duration::minutes(5));
    expired.expires_at = chrono::Utc::now() - Duration::seconds(1);
    let value = expired.token.clone();
    harness.store.upsert_by_owner(expired).await.unwrap();

    let err = harness
        .service
        .exchange_reset_token(&value)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");
}

#[tokio::test]
async fn password_change_rehashes_and_old_password_stops_working() {
    let harness = setup();
    let registered = harness
        .service
        .register(register_input("a@x.com"))
        .await
        .unwrap();

    harness
        .service
        .update_user(UserUpdate {
            id: registered.user.id,
            password: Some("brand_new_password".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let old = harness
        .service
        .login(LoginInput {
            email: "a@x.com".to_string(),
            password: "secure_password123".to_string(),
        })
        .await;
    assert!(old.is_err());

    let new = harness
        .service
        .login(LoginInput {
            email: "a@x.com".to_string(),
            password: "brand_new_password".to_string(),
        })
        .await;
    assert!(new.is_ok());
}

#[tokio::test]
async fn campaign_budget_must_strictly_exceed_daily_budget() {
    let harness = setup();

    let base = json!({
        "name": "spring push",
        "end_date": 1767225600,
        "status": "active",
        "daily_budget": 100,
        "company_id": 7
    });

    let mut equal = base.as_object().unwrap().clone();
    equal.insert("budget".to_string(), json!(100));
    let err = harness
        .service
        .validate(&equal, &campaign_rules())
        .await
        .unwrap_err();
    assert!(err.violations().iter().any(|v| v.field == "budget"));

    let mut above = base.as_object().unwrap().clone();
    above.insert("budget".to_string(), json!(101));
    assert!(harness.service.validate(&above, &campaign_rules()).await.is_ok());
}

#[tokio::test]
async fn company_business_id_must_be_unique() {
    let harness = setup();
    harness
        .store
        .insert_row(
            EntityKind::Companies,
            json!({ "business_id": "514000000" })
                .as_object()
                .unwrap()
                .clone(),
        )
        .await;

    let doc = json!({
        "name": "Acme",
        "name_for_tax_invoice": "Acme Ltd",
        "business_id": "514000000",
        "address": "1 Main St"
    })
    .as_object()
    .unwrap()
    .clone();

    let err = harness
        .service
        .validate(&doc, &company_rules())
        .await
        .unwrap_err();
    assert!(err.violations().iter().any(|v| v.field == "business_id"));
}

#[tokio::test]
async fn concurrent_registrations_end_with_one_row() {
    let harness = setup_with(false, true);

    let (a, b) = tokio::join!(
        harness.service.register(register_input("race@x.com")),
        harness.service.register(register_input("race@x.com")),
    );

    // Exactly one wins; the loser gets the conflict BadRequest.
    assert!(a.is_ok() ^ b.is_ok());
    let loser = if a.is_ok() { b.unwrap_err() } else { a.unwrap_err() };
    assert_eq!(loser.code(), "BAD_REQUEST");
}
