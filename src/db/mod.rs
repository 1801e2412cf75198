//! User storage.
//!
//! The auth core only sees the [`UserDirectory`] trait; the backing store is
//! chosen at startup.

pub mod directory;
pub mod models;
pub mod postgres;

pub use directory::{InMemoryUserDirectory, UserDirectory};
pub use models::{NewUser, User, UserResponse};
pub use postgres::PgUserDirectory;
