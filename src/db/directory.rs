use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::db::models::{NewUser, User};
use crate::error::{DatabaseError, UniqueField};

/// Storage for user records.
///
/// `create` must enforce username and email uniqueness atomically and report
/// a collision as [`DatabaseError::Duplicate`], naming the username first
/// when both collide.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError>;

    /// Returns false when no user has this id.
    async fn set_active(&self, id: i64, active: bool) -> Result<bool, DatabaseError>;

    /// Returns false when no user has this id.
    async fn delete(&self, id: i64) -> Result<bool, DatabaseError>;

    /// Cheap liveness probe for health checks.
    async fn ping(&self) -> Result<(), DatabaseError>;
}

#[derive(Debug, Default)]
struct DirectoryInner {
    last_id: i64,
    users: BTreeMap<i64, User>,
}

/// Process-local directory. Lost on restart; meant for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    inner: RwLock<DirectoryInner>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        // Check and insert under one write lock.
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.username == user.username) {
            return Err(DatabaseError::Duplicate(UniqueField::Username));
        }
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::Duplicate(UniqueField::Email));
        }

        inner.last_id += 1;
        let record = User {
            id: inner.last_id,
            username: user.username,
            email: user.email,
            hashed_password: user.hashed_password,
            is_active: true,
            created_at: Utc::now(),
        };
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<bool, DatabaseError> {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&id) {
            Some(user) => {
                user.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.inner.write().await.users.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
