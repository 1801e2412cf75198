use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored user, including the credential hash.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a user. The directory assigns the id and
/// creation time.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
}

impl NewUser {
    pub fn new(username: impl Into<String>, email: impl Into<String>, hashed_password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            hashed_password: hashed_password.into(),
        }
    }
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_view_omits_hash() {
        let user = User {
            id: 1,
            username: "alice".into(),
            email: "a@x.com".into(),
            hashed_password: "$argon2id$secret".into(),
            is_active: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();
        let fields: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(fields.len(), 5);
        for field in ["id", "username", "email", "is_active", "created_at"] {
            assert!(fields.contains(&field), "missing {}", field);
        }
        assert!(!json.to_string().contains("argon2"));
    }
}
