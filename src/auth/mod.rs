//! Authentication: password hashing, session tokens, and the request gate
//! every protected route goes through.

pub mod gate;
pub mod handlers;
mod password;
mod service;
mod token;

pub use gate::{bearer_token, AuthGate, CurrentUser, Principal};
pub use password::{CredentialHasher, PasswordConfig, PasswordError};
pub use service::{AuthService, LoginRequest, SignupRequest, TokenResponse};
pub use token::{Claims, SigningSecret, TokenCodec, TokenError, DEFAULT_TOKEN_TTL_SECS, TOKEN_ALGORITHM};
