use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::{header, StatusCode}};
use serde_json::json;

use crate::auth::{PasswordError, TokenError};

/// Message returned for every rejected bearer token, whatever the reason.
pub const INVALID_TOKEN_MESSAGE: &str = "Could not validate credentials";

/// Message returned for a failed login, whether the user exists or not.
pub const INVALID_LOGIN_MESSAGE: &str = "Incorrect username or password";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    ConflictError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.into())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("blocking task failed: {}", err))
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl AppError {
    /// The message sent to the client. Auth failures collapse to fixed strings
    /// and internal failures never expose their cause.
    pub fn client_message(&self) -> String {
        match self {
            AppError::AuthError(e) => e.client_message().to_string(),
            AppError::ValidationError(msg)
            | AppError::ConflictError(msg)
            | AppError::NotFound(msg)
            | AppError::Forbidden(msg) => msg.clone(),
            AppError::DatabaseError(DatabaseError::NotFound) => "Record not found".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut builder = HttpResponse::build(status);
        if status == StatusCode::UNAUTHORIZED {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(json!({ "detail": self.client_message() }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthError(e) => match e {
                AuthError::MissingToken
                | AuthError::InvalidToken(_)
                | AuthError::UnknownSubject(_)
                | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::InactiveUser => StatusCode::BAD_REQUEST,
                AuthError::Disabled => StatusCode::FORBIDDEN,
            },
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ConflictError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::DatabaseError(DatabaseError::NotFound) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Reasons an authentication attempt is refused. The variants are kept apart
/// for logging; clients only ever see [`AuthError::client_message`].
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No bearer token supplied")]
    MissingToken,

    #[error("Token rejected: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Token subject {0} no longer exists")]
    UnknownSubject(i64),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Inactive user")]
    InactiveUser,

    #[error("Account disabled")]
    Disabled,
}

impl AuthError {
    pub fn client_message(&self) -> &'static str {
        match self {
            AuthError::MissingToken
            | AuthError::InvalidToken(_)
            | AuthError::UnknownSubject(_) => INVALID_TOKEN_MESSAGE,
            AuthError::InvalidCredentials => INVALID_LOGIN_MESSAGE,
            AuthError::InactiveUser | AuthError::Disabled => "Inactive user",
        }
    }
}

/// Unique user fields the directory enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueField::Username => f.write_str("username"),
            UniqueField::Email => f.write_str("email"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate {0}")]
    Duplicate(UniqueField),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionError(err.to_string())
            }
            _ => DatabaseError::QueryError(err.to_string()),
        }
    }
}
