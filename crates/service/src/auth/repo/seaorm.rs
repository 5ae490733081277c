use sea_orm::DatabaseConnection;

use models::{app_user, errors::ModelError};

use crate::auth::domain::UserRecord;
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

/// Postgres-backed repository over the `app_user` table.
#[derive(Clone)]
pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl From<app_user::Model> for UserRecord {
    fn from(m: app_user::Model) -> Self {
        UserRecord { id: m.id, username: m.username, password_hash: m.password }
    }
}

fn map_model_err(e: ModelError) -> AuthError {
    match e {
        ModelError::Conflict(_) => AuthError::Conflict,
        ModelError::Validation(msg) => AuthError::BadRequest(msg),
        ModelError::Db(msg) => AuthError::Repository(msg),
    }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError> {
        let found = app_user::find_by_username(&self.db, username).await.map_err(map_model_err)?;
        Ok(found.map(UserRecord::from))
    }

    async fn create_user(&self, username: &str, password_hash: String) -> Result<UserRecord, AuthError> {
        let created = app_user::create(&self.db, username, password_hash).await.map_err(map_model_err)?;
        Ok(created.into())
    }
}
