use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::gate::AuthGate;
use crate::auth::password::CredentialHasher;
use crate::auth::token::TokenCodec;
use crate::db::{NewUser, User, UserDirectory, UserResponse};
use crate::error::{AppError, AuthError, DatabaseError, UniqueField};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Signup and login flows on top of the hasher, codec and directory.
pub struct AuthService {
    directory: Arc<dyn UserDirectory>,
    hasher: Arc<CredentialHasher>,
    codec: Arc<TokenCodec>,
    gate: AuthGate,
    /// Verified against when a login names an unknown user, so both failure
    /// paths pay for one hash verification.
    decoy_hash: Arc<str>,
}

impl AuthService {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        hasher: CredentialHasher,
        codec: TokenCodec,
    ) -> Result<Self, AppError> {
        let decoy_hash: Arc<str> = hasher.hash("decoy password")?.into();
        let codec = Arc::new(codec);
        Ok(Self {
            gate: AuthGate::new(codec.clone(), directory.clone()),
            directory,
            hasher: Arc::new(hasher),
            codec,
            decoy_hash,
        })
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    pub fn directory(&self) -> &Arc<dyn UserDirectory> {
        &self.directory
    }

    pub async fn signup(&self, req: SignupRequest) -> Result<TokenResponse, AppError> {
        validate_signup(&req)?;

        if self.directory.find_by_username(&req.username).await?.is_some() {
            warn!("Signup rejected, username taken: {}", req.username);
            return Err(duplicate(UniqueField::Username));
        }
        if self.directory.find_by_email(&req.email).await?.is_some() {
            warn!("Signup rejected, email taken: {}", req.email);
            return Err(duplicate(UniqueField::Email));
        }

        let hasher = self.hasher.clone();
        let password = req.password;
        let hashed_password = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

        // The pre-checks above only pick the message; the directory decides.
        let user = self
            .directory
            .create(NewUser::new(req.username, req.email, hashed_password))
            .await
            .map_err(|e| match e {
                DatabaseError::Duplicate(field) => {
                    warn!("Signup lost a race on {}", field);
                    duplicate(field)
                }
                other => other.into(),
            })?;

        info!("User {} registered with id {}", user.username, user.id);
        self.token_response(user)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse, AppError> {
        let user = self.directory.find_by_username(&req.username).await?;

        let stored_hash: Arc<str> = match &user {
            Some(user) => user.hashed_password.as_str().into(),
            None => self.decoy_hash.clone(),
        };
        let hasher = self.hasher.clone();
        let password = req.password;
        let verified =
            tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash)).await?;

        let user = match user {
            Some(user) if verified => user,
            Some(_) => {
                warn!("Login failed for {}: wrong password", req.username);
                return Err(AuthError::InvalidCredentials.into());
            }
            None => {
                warn!("Login failed for {}: no such user", req.username);
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !user.is_active {
            warn!("Login refused for inactive user {}", user.username);
            return Err(AuthError::InactiveUser.into());
        }

        info!("User {} logged in", user.username);
        self.token_response(user)
    }

    /// Issues a token for `user` with the configured lifetime.
    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        self.codec
            .issue(user.id, &user.username, self.codec.default_ttl())
            .map_err(|e| AppError::InternalError(e.to_string()))
    }

    fn token_response(&self, user: User) -> Result<TokenResponse, AppError> {
        let access_token = self.issue_token(&user)?;
        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: self.codec.default_ttl().num_seconds(),
            user: user.into(),
        })
    }
}

fn duplicate(field: UniqueField) -> AppError {
    match field {
        UniqueField::Username => AppError::ConflictError("Username already registered".to_string()),
        UniqueField::Email => AppError::ConflictError("Email already registered".to_string()),
    }
}

fn validate_signup(req: &SignupRequest) -> Result<(), AppError> {
    if req.username.trim().is_empty() {
        return Err(AppError::ValidationError("Username must not be empty".to_string()));
    }
    if !is_valid_email(&req.email) {
        return Err(AppError::ValidationError("Invalid email address".to_string()));
    }
    if req.password.is_empty() {
        return Err(AppError::ValidationError("Password must not be empty".to_string()));
    }
    Ok(())
}

/// `local@domain.tld`, no whitespace, exactly one `@`.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && !tld.is_empty() && !name.starts_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::PasswordConfig;
    use crate::auth::token::SigningSecret;
    use crate::db::InMemoryUserDirectory;
    use chrono::Duration;

    fn service() -> AuthService {
        let hasher = CredentialHasher::new(&PasswordConfig {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            output_len: Some(32),
        })
        .unwrap();
        let codec = TokenCodec::new(&SigningSecret::new("service_secret"), Duration::seconds(1800));
        AuthService::new(Arc::new(InMemoryUserDirectory::new()), hasher, codec).unwrap()
    }

    fn signup_req(username: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn login_req(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let service = service();
        let signed_up = service.signup(signup_req("alice", "a@x.com", "pw1")).await.unwrap();
        assert_eq!(signed_up.token_type, "bearer");
        assert_eq!(signed_up.expires_in, 1800);
        assert_eq!(signed_up.user.username, "alice");

        let logged_in = service.login(login_req("alice", "pw1")).await.unwrap();
        let principal = service.gate().authenticate(Some(&logged_in.access_token)).await.unwrap();
        assert_eq!(principal.subject_id, signed_up.user.id);
        assert_eq!(principal.username, "alice");
    }

    #[tokio::test]
    async fn test_password_is_stored_hashed() {
        let service = service();
        service.signup(signup_req("alice", "a@x.com", "pw1")).await.unwrap();
        let stored = service.directory().find_by_username("alice").await.unwrap().unwrap();
        assert_ne!(stored.hashed_password, "pw1");
        assert!(stored.hashed_password.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_duplicate_username_checked_before_email() {
        let service = service();
        service.signup(signup_req("alice", "a@x.com", "pw1")).await.unwrap();

        let err = service.signup(signup_req("alice", "a@x.com", "pw2")).await.unwrap_err();
        assert!(matches!(&err, AppError::ConflictError(m) if m == "Username already registered"));

        let err = service.signup(signup_req("alicia", "a@x.com", "pw2")).await.unwrap_err();
        assert!(matches!(&err, AppError::ConflictError(m) if m == "Email already registered"));
    }

    #[tokio::test]
    async fn test_concurrent_signups_admit_one() {
        let service = service();
        let (a, b) = tokio::join!(
            service.signup(signup_req("twin", "t1@x.com", "pw")),
            service.signup(signup_req("twin", "t2@x.com", "pw")),
        );
        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(AppError::ConflictError(_)))));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_alike() {
        let service = service();
        service.signup(signup_req("alice", "a@x.com", "pw1")).await.unwrap();

        let wrong = service.login(login_req("alice", "nope")).await.unwrap_err();
        let unknown = service.login(login_req("mallory", "pw1")).await.unwrap_err();
        assert!(matches!(wrong, AppError::AuthError(AuthError::InvalidCredentials)));
        assert!(matches!(unknown, AppError::AuthError(AuthError::InvalidCredentials)));
        assert_eq!(wrong.client_message(), unknown.client_message());
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_login() {
        let service = service();
        let resp = service.signup(signup_req("alice", "a@x.com", "pw1")).await.unwrap();
        service.directory().set_active(resp.user.id, false).await.unwrap();

        let err = service.login(login_req("alice", "pw1")).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::InactiveUser)));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let service = service();
        for req in [
            signup_req("  ", "a@x.com", "pw"),
            signup_req("alice", "not-an-email", "pw"),
            signup_req("alice", "a@x.com", ""),
        ] {
            let err = service.signup(req).await.unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)));
        }
        assert!(service.directory().find_by_username("alice").await.unwrap().is_none());
    }

    #[test]
    fn test_email_shapes() {
        for ok in ["a@x.com", "first.last@sub.example.org", "a+tag@x.io"] {
            assert!(is_valid_email(ok), "{}", ok);
        }
        for bad in ["", "a", "a@", "@x.com", "a@x", "a@@x.com", "a@x.", "a b@x.com", "a@.com"] {
            assert!(!is_valid_email(bad), "{}", bad);
        }
    }
}
