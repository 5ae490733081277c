use thiserror::Error;

use super::domain::CredentialFailure;
use super::password::HashError;
use super::token::TokenError;

/// Outcome class of a failed auth operation, independent of transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    BadRequest,
    Unauthorized,
    Conflict,
    Internal,
}

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    BadRequest(String),
    #[error("user already exists")]
    Conflict,
    #[error("invalid credentials: {0}")]
    InvalidCredentials(CredentialFailure),
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header is not `Bearer <token>`")]
    MalformedAuthorization,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error("repository error: {0}")]
    Repository(String),
    #[error("background task failed: {0}")]
    Task(String),
}

impl AuthError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AuthError::BadRequest(_)
            | AuthError::InvalidCredentials(_)
            | AuthError::MissingAuthorization
            | AuthError::MalformedAuthorization => ErrorClass::BadRequest,
            AuthError::Token(TokenError::Encode(_)) => ErrorClass::Internal,
            AuthError::Token(e) if e.is_unauthorized() => ErrorClass::Unauthorized,
            AuthError::Token(_) => ErrorClass::BadRequest,
            AuthError::Conflict => ErrorClass::Conflict,
            AuthError::Hash(_) | AuthError::Repository(_) | AuthError::Task(_) => ErrorClass::Internal,
        }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::BadRequest(_) => 1001,
            AuthError::Conflict => 1002,
            AuthError::InvalidCredentials(_) => 1004,
            AuthError::MissingAuthorization => 1005,
            AuthError::MalformedAuthorization => 1006,
            AuthError::Token(TokenError::InvalidFormat) => 1010,
            AuthError::Token(TokenError::InvalidSignature) => 1011,
            AuthError::Token(TokenError::InvalidClaims(_)) => 1012,
            AuthError::Token(TokenError::Expired) => 1013,
            AuthError::Token(TokenError::Encode(_)) => 1102,
            AuthError::Hash(_) => 1101,
            AuthError::Repository(_) => 1200,
            AuthError::Task(_) => 1300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::ClaimsDefect;

    #[test]
    fn classes_follow_taxonomy() {
        assert_eq!(AuthError::BadRequest("x".into()).class(), ErrorClass::BadRequest);
        assert_eq!(AuthError::Conflict.class(), ErrorClass::Conflict);
        assert_eq!(AuthError::InvalidCredentials(CredentialFailure::WrongPassword).class(), ErrorClass::BadRequest);
        assert_eq!(AuthError::MissingAuthorization.class(), ErrorClass::BadRequest);
        assert_eq!(AuthError::Token(TokenError::InvalidFormat).class(), ErrorClass::BadRequest);
        assert_eq!(AuthError::Token(TokenError::InvalidClaims(ClaimsDefect::WrongShape)).class(), ErrorClass::BadRequest);
        assert_eq!(AuthError::Token(TokenError::InvalidSignature).class(), ErrorClass::Unauthorized);
        assert_eq!(AuthError::Token(TokenError::Expired).class(), ErrorClass::Unauthorized);
        assert_eq!(AuthError::Token(TokenError::Encode("x".into())).class(), ErrorClass::Internal);
        assert_eq!(AuthError::Repository("down".into()).class(), ErrorClass::Internal);
    }
}
