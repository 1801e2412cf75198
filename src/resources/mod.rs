//! Simple CRUD resources behind the authentication gate.

pub mod store;
pub mod tasks;
pub mod todos;

pub use store::RecordStore;
pub use tasks::Task;
pub use todos::TodoItem;
