use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// The stored credential: an Argon2 PHC string, never the plaintext.
    pub password: String,
    pub mobile_number: String,
    pub role: u8,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: String,
        email: String,
        password: String,
        mobile_number: String,
        role: u8,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password,
            mobile_number,
            role,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile_number: String,
    pub role: u8,
    pub created_at: DateTime<Utc>,
}

// Convert User to UserProfile (hiding the password hash)
impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            mobile_number: user.mobile_number,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub mobile_number: String,
}

impl RegisterInput {
    /// The JSON document the validation engine evaluates rules against.
    pub fn as_document(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        doc.insert("name".to_string(), json!(self.name));
        doc.insert("email".to_string(), json!(self.email));
        doc.insert("password".to_string(), json!(self.password));
        doc.insert("mobile_number".to_string(), json!(self.mobile_number));
        doc
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Partial update: absent fields are left untouched and skipped by
/// partial validation. A present password goes back through the hasher.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct UserUpdate {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub mobile_number: Option<String>,
}

impl UserUpdate {
    pub fn as_document(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        if let Some(name) = &self.name {
            doc.insert("name".to_string(), json!(name));
        }
        if let Some(email) = &self.email {
            doc.insert("email".to_string(), json!(email));
        }
        if let Some(password) = &self.password {
            doc.insert("password".to_string(), json!(password));
        }
        if let Some(mobile_number) = &self.mobile_number {
            doc.insert("mobile_number".to_string(), json!(mobile_number));
        }
        doc
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}
