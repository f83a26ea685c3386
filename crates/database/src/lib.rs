pub mod connection;
pub mod error;
pub mod memory;
pub mod repositories;
pub mod store;

pub use connection::{Database, DatabaseConfig};
pub use error::{DatabaseError, Result};
pub use memory::{MemoryPasswordResetStore, MemorySessionRecordStore};
pub use repositories::{
    password_resets::PasswordResetRepository,
    sessions::SessionRepository,
};
pub use store::{PasswordResetStore, SessionRecordStore};
