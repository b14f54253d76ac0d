//! User credentials: salted SHA-256 digests and the login check.

use crate::error::AppError;
use crate::model::{Document, Model, Payload};
use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;

pub const PASSWORD_FIELD: &str = "password";
pub const HASH_FIELD: &str = "passwordHash";
pub const SALT_FIELD: &str = "passwordSalt";
pub const USERNAME_FIELD: &str = "username";

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Replace a plaintext `password` with `passwordHash` + `passwordSalt`.
pub fn hash_password_field(mut payload: Payload) -> Payload {
    // clients may not set the digest fields directly
    payload.remove(HASH_FIELD);
    payload.remove(SALT_FIELD);
    if let Some(Value::String(password)) = payload.remove(PASSWORD_FIELD) {
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let hash = digest(&salt, &password);
        payload.insert(HASH_FIELD.into(), Value::String(hash));
        payload.insert(SALT_FIELD.into(), Value::String(salt));
    }
    payload
}

pub fn password_matches(user: &Document, password: &str) -> bool {
    let field = |name: &str| user.payload.get(name).and_then(Value::as_str);
    match (field(SALT_FIELD), field(HASH_FIELD)) {
        (Some(salt), Some(hash)) => digest(salt, password) == hash,
        _ => false,
    }
}

/// Login collaborator: resolves a username/password pair to a user document.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, username: &str, password: &str) -> Result<Document, AppError>;
}

/// Checks credentials against live User documents.
pub struct StoreVerifier {
    users: Arc<dyn Model>,
}

impl StoreVerifier {
    pub fn new(users: Arc<dyn Model>) -> Self {
        StoreVerifier { users }
    }
}

#[async_trait]
impl CredentialVerifier for StoreVerifier {
    async fn verify(&self, username: &str, password: &str) -> Result<Document, AppError> {
        let candidates = self.users.find_by(USERNAME_FIELD, username).await?;
        candidates
            .into_iter()
            .find(|u| password_matches(u, password))
            .ok_or_else(|| AppError::Authentication("invalid username or password".into()))
    }
}
