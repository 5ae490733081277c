use async_trait::async_trait;

use super::domain::UserRecord;
use super::errors::AuthError;

/// Repository abstraction for user records.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// At most one record per username.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError>;

    /// Insert a new user with a generated id. A taken username is [`AuthError::Conflict`].
    async fn create_user(&self, username: &str, password_hash: String) -> Result<UserRecord, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, UserRecord>>, // key: username
        unavailable: bool,
    }

    impl MockAuthRepository {
        /// A repository whose every call fails, for exercising internal-error paths.
        pub fn unavailable() -> Self {
            Self { users: Mutex::default(), unavailable: true }
        }

        pub fn user_count(&self) -> usize {
            self.users.lock().map(|u| u.len()).unwrap_or(0)
        }

        fn users(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, UserRecord>>, AuthError> {
            if self.unavailable {
                return Err(AuthError::Repository("store unavailable".into()));
            }
            self.users.lock().map_err(|_| AuthError::Repository("mock store poisoned".into()))
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError> {
            Ok(self.users()?.get(username).cloned())
        }

        async fn create_user(&self, username: &str, password_hash: String) -> Result<UserRecord, AuthError> {
            let mut users = self.users()?;
            if users.contains_key(username) {
                return Err(AuthError::Conflict);
            }
            let user = UserRecord { id: Uuid::new_v4(), username: username.to_string(), password_hash };
            users.insert(username.to_string(), user.clone());
            Ok(user)
        }
    }
}
