//! Request-time authentication.
//!
//! [`AuthGate`] turns a raw bearer value into the current user or a refusal.
//! Handlers opt in by taking [`Principal`] or [`CurrentUser`] as an argument;
//! both extractors run the gate and short-circuit with `401` before the
//! handler body executes.

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::token::TokenCodec;
use crate::db::{User, UserDirectory};
use crate::error::{AppError, AuthError};
use crate::AppState;

/// Identity of an authenticated caller, rebuilt on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject_id: i64,
    pub username: String,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            subject_id: user.id,
            username: user.username.clone(),
        }
    }
}

/// The full user record behind a valid token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[derive(Clone)]
pub struct AuthGate {
    codec: Arc<TokenCodec>,
    directory: Arc<dyn UserDirectory>,
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { codec, directory }
    }

    /// Resolves a bearer value to its user. Read-only: the token is neither
    /// refreshed nor extended.
    pub async fn resolve(&self, bearer: Option<&str>) -> Result<User, AuthError> {
        let token = match bearer.map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => {
                debug!("Rejected request without bearer token");
                return Err(AuthError::MissingToken);
            }
        };

        let claims = self.codec.verify(token).map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            AuthError::InvalidToken(e)
        })?;

        let user = match self.directory.find_by_id(claims.subject_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!("Token subject {} not found", claims.subject_id);
                return Err(AuthError::UnknownSubject(claims.subject_id));
            }
            Err(e) => {
                warn!("Directory lookup for subject {} failed: {}", claims.subject_id, e);
                return Err(AuthError::UnknownSubject(claims.subject_id));
            }
        };

        if !user.is_active {
            warn!("Token subject {} is inactive", user.id);
            return Err(AuthError::Disabled);
        }

        Ok(user)
    }

    pub async fn authenticate(&self, bearer: Option<&str>) -> Result<Principal, AuthError> {
        self.resolve(bearer).await.map(|user| Principal::from(&user))
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header. The
/// scheme is matched case-insensitively.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

fn resolve_request(req: &HttpRequest) -> LocalBoxFuture<'static, Result<User, AppError>> {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let token = bearer_token(req).map(str::to_owned);

    Box::pin(async move {
        let state = state.ok_or_else(|| {
            AppError::InternalError("application state is not registered".to_string())
        })?;
        let user = state.auth_service.gate().resolve(token.as_deref()).await?;
        Ok(user)
    })
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = resolve_request(req);
        Box::pin(async move { user.await.map(CurrentUser) })
    }
}

impl FromRequest for Principal {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = resolve_request(req);
        Box::pin(async move { user.await.map(|u| Principal::from(&u)) })
    }
}
