use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::MessageBody;
use service::auth::{
    domain::CredentialErrorPolicy,
    token::{ClaimsDefect, TokenError},
    AuthError,
};
use thiserror::Error;
use tracing::{debug, error};

/// Client-facing failure. Bodies are either empty or `{"message": ...}`.
#[derive(Debug, PartialEq, Eq)]
pub enum ApiError {
    BadRequest(Option<&'static str>),
    Unauthorized,
    Conflict,
    Internal,
}

impl ApiError {
    /// Map a service error to its HTTP outcome. Internal causes are logged here and never echoed.
    pub fn from_auth(e: AuthError, policy: CredentialErrorPolicy) -> Self {
        match e {
            AuthError::BadRequest(reason) => {
                debug!(%reason, "bad request");
                ApiError::BadRequest(None)
            }
            AuthError::InvalidCredentials(failure) => ApiError::BadRequest(Some(policy.message(failure))),
            AuthError::MissingAuthorization | AuthError::MalformedAuthorization => {
                ApiError::BadRequest(Some("No authorization header"))
            }
            AuthError::Token(TokenError::InvalidFormat) => ApiError::BadRequest(Some("Invalid JWT token")),
            AuthError::Token(TokenError::InvalidClaims(ClaimsDefect::Unparseable)) => {
                ApiError::BadRequest(Some("Invalid JWT payload"))
            }
            AuthError::Token(TokenError::InvalidClaims(ClaimsDefect::WrongShape)) => {
                ApiError::BadRequest(Some("Invalid data in JWT payload"))
            }
            AuthError::Token(TokenError::InvalidSignature | TokenError::Expired) => ApiError::Unauthorized,
            AuthError::Conflict => ApiError::Conflict,
            other => {
                error!(code = other.code(), error = %other, "internal error");
                ApiError::Internal
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(Some(msg)) => (StatusCode::BAD_REQUEST, Json(MessageBody::new(msg))).into_response(),
            other => other.status().into_response(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::auth::domain::CredentialFailure;

    #[test]
    fn maps_every_class() {
        let p = CredentialErrorPolicy::Detailed;
        assert_eq!(ApiError::from_auth(AuthError::BadRequest("x".into()), p), ApiError::BadRequest(None));
        assert_eq!(
            ApiError::from_auth(AuthError::InvalidCredentials(CredentialFailure::UnknownUsername), p),
            ApiError::BadRequest(Some("Invalid username"))
        );
        assert_eq!(
            ApiError::from_auth(AuthError::MissingAuthorization, p),
            ApiError::BadRequest(Some("No authorization header"))
        );
        assert_eq!(
            ApiError::from_auth(AuthError::Token(TokenError::InvalidFormat), p),
            ApiError::BadRequest(Some("Invalid JWT token"))
        );
        assert_eq!(
            ApiError::from_auth(AuthError::Token(TokenError::InvalidClaims(ClaimsDefect::Unparseable)), p),
            ApiError::BadRequest(Some("Invalid JWT payload"))
        );
        assert_eq!(
            ApiError::from_auth(AuthError::Token(TokenError::InvalidClaims(ClaimsDefect::WrongShape)), p),
            ApiError::BadRequest(Some("Invalid data in JWT payload"))
        );
        assert_eq!(ApiError::from_auth(AuthError::Token(TokenError::Expired), p), ApiError::Unauthorized);
        assert_eq!(ApiError::from_auth(AuthError::Token(TokenError::InvalidSignature), p), ApiError::Unauthorized);
        assert_eq!(ApiError::from_auth(AuthError::Conflict, p), ApiError::Conflict);
        assert_eq!(ApiError::from_auth(AuthError::Repository("db down".into()), p), ApiError::Internal);
        assert_eq!(ApiError::Conflict.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn uniform_policy_hides_which_half_failed() {
        let p = CredentialErrorPolicy::Uniform;
        let a = ApiError::from_auth(AuthError::InvalidCredentials(CredentialFailure::UnknownUsername), p);
        let b = ApiError::from_auth(AuthError::InvalidCredentials(CredentialFailure::WrongPassword), p);
        assert_eq!(a, b);
    }
}
