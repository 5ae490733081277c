use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Form, Json,
};
use serde_json::{Map, Value};
use common::types::TokenBody;
use service::auth::{
    domain::Credentials,
    repository::AuthRepository,
    token::TokenClaims,
    AuthError, AuthService,
};
use tracing::{info, warn};

use crate::errors::ApiError;

#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService<dyn AuthRepository>>,
}

impl ServerState {
    pub fn new(auth: AuthService<dyn AuthRepository>) -> Self {
        Self { auth: Arc::new(auth) }
    }

    fn api_error(&self, e: AuthError) -> ApiError {
        ApiError::from_auth(e, self.auth.config().credential_errors)
    }
}

/// Register/login body, JSON or url-encoded form.
/// Both fields must be present strings; anything else, including an unparseable body, is a bare 400.
pub struct CredentialsBody(pub Credentials);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for CredentialsBody {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let value = if is_form(&req) {
            let Form(fields) = Form::<Map<String, Value>>::from_request(req, state).await.map_err(|rejection| {
                warn!(error = %rejection, "rejected form body");
                ApiError::BadRequest(None)
            })?;
            Value::Object(fields)
        } else {
            let Json(value) = Json::<Value>::from_request(req, state).await.map_err(|rejection| {
                warn!(error = %rejection, "rejected request body");
                ApiError::BadRequest(None)
            })?;
            value
        };
        let creds = Credentials::from_json(&value).map_err(|_| ApiError::BadRequest(None))?;
        Ok(Self(creds))
    }
}

#[utoipa::path(post, path = "/register", tag = "auth", request_body = crate::openapi::CredentialsRequest,
    responses((status = 200, description = "Registered"), (status = 400, description = "Missing or non-string fields"),
        (status = 409, description = "Username taken"), (status = 500, description = "Store or hashing failure")))]
pub async fn register(
    State(state): State<ServerState>,
    CredentialsBody(creds): CredentialsBody,
) -> Result<StatusCode, ApiError> {
    state.auth.register(creds).await.map_err(|e| state.api_error(e))?;
    Ok(StatusCode::OK)
}

#[utoipa::path(post, path = "/login", tag = "auth", request_body = crate::openapi::CredentialsRequest,
    responses((status = 200, description = "Token issued", body = crate::openapi::TokenResponse),
        (status = 400, description = "Missing fields or invalid credentials", body = crate::openapi::MessageResponse),
        (status = 500, description = "Unexpected failure")))]
pub async fn login(
    State(state): State<ServerState>,
    CredentialsBody(creds): CredentialsBody,
) -> Result<Json<TokenBody>, ApiError> {
    let token = state.auth.login(creds).await.map_err(|e| state.api_error(e))?;
    Ok(Json(TokenBody { token }))
}

#[utoipa::path(post, path = "/authorized-action", tag = "auth",
    responses((status = 200, description = "Token accepted"),
        (status = 400, description = "Malformed header or token", body = crate::openapi::MessageResponse),
        (status = 401, description = "Bad signature or expired token")),
    security(("bearer" = [])))]
pub async fn authorized_action(Extension(claims): Extension<TokenClaims>) -> StatusCode {
    info!(user_id = %claims.subject_id, "authorized action");
    StatusCode::OK
}

/// Verify `Authorization: Bearer <token>` and hand the claims to the handler.
/// Malformed header or token is 400, bad signature or expiry is 401.
pub async fn require_bearer(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // non-UTF-8 values count as present but malformed
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default().to_owned());

    match state.auth.authorize(header_value.as_deref()) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(e) => {
            let path = req.uri().path();
            warn!(%path, code = e.code(), error = %e, "token validation failed");
            Err(state.api_error(e))
        }
    }
}
