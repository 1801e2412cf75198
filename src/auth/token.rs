//! Session token codec.
//!
//! Tokens are HS256 JWTs carrying `{sub, username, iat, exp}`. The algorithm
//! is pinned: the header is inspected before any verification and a token
//! declaring anything but HS256 is refused without touching its claims.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only signing algorithm issued or accepted.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;
const TOKEN_ALGORITHM_NAME: &str = "HS256";

/// Default token lifetime: 30 minutes.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 1800;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

/// Server-held HMAC key. Its contents never appear in `Debug` output.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self(secret.as_ref().to_vec())
    }

    /// 32 bytes from the OS RNG, url-safe base64 encoded.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes).into_bytes())
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret(..)")
    }
}

/// Verified token contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub subject_id: i64,
    pub username: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    username: String,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct WireHeader {
    alg: String,
}

pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &SigningSecret, default_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn issue(&self, subject_id: i64, username: &str, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Encoding(format!("token lifetime {} out of range", ttl)))?;
        let claims = WireClaims {
            sub: subject_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verifies structure, algorithm and signature, then expiry, in that
    /// order. A token is accepted only while `exp > now`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        check_algorithm(token)?;

        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<WireClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => {
                    TokenError::UnsupportedAlgorithm("unknown".to_string())
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;
        let claims = data.claims;

        // jsonwebtoken accepts exp == now; the boundary belongs to "expired".
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        let subject_id = claims.sub.parse::<i64>().map_err(|_| TokenError::Malformed)?;

        Ok(Claims {
            subject_id,
            username: claims.username,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }
}

fn check_algorithm(token: &str) -> Result<(), TokenError> {
    let mut parts = token.split('.');
    let header = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(_), Some(_), None) => header,
        _ => return Err(TokenError::Malformed),
    };

    let raw = URL_SAFE_NO_PAD.decode(header).map_err(|_| TokenError::Malformed)?;
    let header: WireHeader = serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)?;

    if header.alg != TOKEN_ALGORITHM_NAME {
        return Err(TokenError::UnsupportedAlgorithm(header.alg));
    }
    Ok(())
}
