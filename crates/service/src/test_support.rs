#![cfg(test)]
use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

use crate::auth::domain::CredentialErrorPolicy;
use crate::auth::password::{Argon2Hasher, PasswordHasher};
use crate::auth::repository::mock::MockAuthRepository;
use crate::auth::token::TokenCodec;
use crate::auth::{AuthConfig, AuthService};

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Low-cost Argon2 so tests stay quick.
pub fn fast_hasher() -> Arc<dyn PasswordHasher> {
    Arc::new(Argon2Hasher::with_params(1024, 1, 1).expect("valid argon2 params"))
}

pub fn test_service(policy: CredentialErrorPolicy) -> (AuthService<MockAuthRepository>, Arc<MockAuthRepository>) {
    let repo = Arc::new(MockAuthRepository::default());
    let codec = TokenCodec::new("test-secret").expect("hmac accepts any key");
    let cfg = AuthConfig { credential_errors: policy, ..AuthConfig::default() };
    (AuthService::new(Arc::clone(&repo), fast_hasher(), codec, cfg), repo)
}

/// Migrated Postgres connection, or `None` when no database is configured.
pub async fn get_db() -> Result<Option<DatabaseConnection>, anyhow::Error> {
    if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() {
        return Ok(None);
    }
    MIGRATED
        .get_or_try_init(|| async {
            let db = models::db::connect().await?;
            models::db::migrate(&db).await?;
            Ok::<(), anyhow::Error>(())
        })
        .await?;
    Ok(Some(models::db::connect().await?))
}
