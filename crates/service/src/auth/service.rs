use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use super::domain::{CredentialErrorPolicy, CredentialFailure, Credentials, UserRecord};
use super::errors::AuthError;
use super::password::PasswordHasher;
use super::repository::AuthRepository;
use super::token::{TokenClaims, TokenCodec, TokenError};

/// Auth service configuration
#[derive(Debug, Clone, Copy)]
pub struct AuthConfig {
    pub credential_errors: CredentialErrorPolicy,
    /// Token lifetime in calendar months.
    pub token_ttl_months: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { credential_errors: CredentialErrorPolicy::Detailed, token_ttl_months: 1 }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository + ?Sized> {
    repo: Arc<R>,
    hasher: Arc<dyn PasswordHasher>,
    codec: TokenCodec,
    cfg: AuthConfig,
    /// Digest verified against when the username is unknown under the uniform policy.
    decoy_hash: OnceCell<String>,
}

impl<R: AuthRepository + ?Sized> AuthService<R> {
    pub fn new(repo: Arc<R>, hasher: Arc<dyn PasswordHasher>, codec: TokenCodec, cfg: AuthConfig) -> Self {
        Self { repo, hasher, codec, cfg, decoy_hash: OnceCell::new() }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn config(&self) -> &AuthConfig {
        &self.cfg
    }

    /// Client-facing text for a failed login under the configured policy.
    pub fn credential_message(&self, failure: CredentialFailure) -> &'static str {
        self.cfg.credential_errors.message(failure)
    }

    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let digest = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Task(e.to_string()))??;
        Ok(digest)
    }

    async fn verify_password(&self, password: String, digest: String) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let ok = tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| AuthError::Task(e.to_string()))??;
        Ok(ok)
    }

    /// Burn one verify so unknown usernames take as long as wrong passwords.
    async fn verify_decoy(&self, password: String) -> Result<(), AuthError> {
        let decoy = self
            .decoy_hash
            .get_or_try_init(|| self.hash_password("decoy-password".into()))
            .await?
            .clone();
        let _ = self.verify_password(password, decoy).await?;
        Ok(())
    }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::{domain::Credentials, password::Argon2Hasher, token::TokenCodec};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let codec = TokenCodec::new("secret").unwrap();
    /// let svc = AuthService::new(repo, Arc::new(Argon2Hasher::default()), codec, AuthConfig::default());
    /// let user = tokio_test::block_on(svc.register(Credentials::new("alice", "pw1"))).unwrap();
    /// assert_eq!(user.username, "alice");
    /// ```
    #[instrument(skip(self, creds), fields(username = %creds.username))]
    pub async fn register(&self, creds: Credentials) -> Result<UserRecord, AuthError> {
        let Credentials { username, password } = creds;
        let hash = self.hash_password(password).await?;
        let user = match self.repo.create_user(&username, hash).await {
            Ok(user) => user,
            Err(AuthError::Conflict) => {
                debug!("username already taken");
                return Err(AuthError::Conflict);
            }
            Err(e) => return Err(e),
        };
        info!(user_id = %user.id, username = %user.username, "user_registered");
        Ok(user)
    }

    /// Check credentials and issue a signed token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::{domain::Credentials, password::Argon2Hasher, token::TokenCodec};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let codec = TokenCodec::new("secret").unwrap();
    /// let svc = AuthService::new(repo, Arc::new(Argon2Hasher::default()), codec, AuthConfig::default());
    /// let user = tokio_test::block_on(svc.register(Credentials::new("u", "Passw0rd"))).unwrap();
    /// let token = tokio_test::block_on(svc.login(Credentials::new("u", "Passw0rd"))).unwrap();
    /// let claims = svc.authorize(Some(format!("Bearer {token}").as_str())).unwrap();
    /// assert_eq!(claims.subject_id, user.id.to_string());
    /// ```
    #[instrument(skip(self, creds), fields(username = %creds.username))]
    pub async fn login(&self, creds: Credentials) -> Result<String, AuthError> {
        self.login_at(creds, Utc::now()).await
    }

    /// [`AuthService::login`] with an explicit issue time.
    pub async fn login_at(&self, creds: Credentials, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let Credentials { username, password } = creds;
        let Some(user) = self.repo.find_user_by_username(&username).await? else {
            if self.cfg.credential_errors == CredentialErrorPolicy::Uniform {
                self.verify_decoy(password).await?;
            }
            warn!(%username, "login rejected: unknown username");
            return Err(AuthError::InvalidCredentials(CredentialFailure::UnknownUsername));
        };

        if !self.verify_password(password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(AuthError::InvalidCredentials(CredentialFailure::WrongPassword));
        }

        let claims = self.claims_for(&user, issued_at)?;
        let token = self.codec.encode(&claims)?;
        info!(user_id = %user.id, expires_at = %claims.expires_at, "token_issued");
        Ok(token)
    }

    /// Claims for `user`, expiring `token_ttl_months` calendar months after `issued_at`.
    /// Month ends clamp (Jan 31 + 1 month = Feb 28/29).
    pub fn claims_for(&self, user: &UserRecord, issued_at: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        let expires = issued_at
            .checked_add_months(Months::new(self.cfg.token_ttl_months))
            .ok_or_else(|| TokenError::Encode("token expiry out of range".into()))?;
        Ok(TokenClaims::new(user.id.to_string(), expires.timestamp()))
    }

    /// Validate an `Authorization` header value and return the token's claims.
    pub fn authorize(&self, header: Option<&str>) -> Result<TokenClaims, AuthError> {
        self.authorize_at(header, Utc::now().timestamp())
    }

    /// [`AuthService::authorize`] against `now` in epoch seconds.
    pub fn authorize_at(&self, header: Option<&str>, now: i64) -> Result<TokenClaims, AuthError> {
        let header = header.ok_or(AuthError::MissingAuthorization)?;
        let token = bearer_token(header).ok_or(AuthError::MalformedAuthorization)?;
        let claims = self.codec.decode_at(token, now)?;
        Ok(claims)
    }
}

/// `Bearer <token>`: case-insensitive scheme, exactly one single-space separator.
fn bearer_token(header: &str) -> Option<&str> {
    let scheme = header.get(..7)?;
    if !scheme.eq_ignore_ascii_case("bearer ") {
        return None;
    }
    let mut parts = header.split(' ');
    let (_, token) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    Some(token)
}
