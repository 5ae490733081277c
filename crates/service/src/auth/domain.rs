use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::AuthError;

/// Username/password pair from a register or login request. Never persisted.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }

    /// Accept a request body only when both `username` and `password` are present strings.
    pub fn from_json(body: &serde_json::Value) -> Result<Self, AuthError> {
        let field = |name: &str| {
            body.get(name)
                .and_then(|v| v.as_str())
                .map(str::to_owned)
                .ok_or_else(|| AuthError::BadRequest(format!("`{name}` must be a string")))
        };
        Ok(Self { username: field("username")?, password: field("password")? })
    }
}

/// Stored user. `password_hash` is a PHC digest, never the plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

/// Which half of a login failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFailure {
    UnknownUsername,
    WrongPassword,
}

impl std::fmt::Display for CredentialFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialFailure::UnknownUsername => f.write_str("unknown username"),
            CredentialFailure::WrongPassword => f.write_str("wrong password"),
        }
    }
}

/// How much a failed login tells the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialErrorPolicy {
    /// Separate messages for unknown username and wrong password.
    #[default]
    Detailed,
    /// One message for both, and unknown usernames still pay for a hash verify.
    Uniform,
}

impl CredentialErrorPolicy {
    pub fn message(&self, failure: CredentialFailure) -> &'static str {
        match (self, failure) {
            (CredentialErrorPolicy::Detailed, CredentialFailure::UnknownUsername) => "Invalid username",
            (CredentialErrorPolicy::Detailed, CredentialFailure::WrongPassword) => "Invalid password",
            (CredentialErrorPolicy::Uniform, _) => "Invalid username or password",
        }
    }
}
