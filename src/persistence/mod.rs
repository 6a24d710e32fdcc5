//! Save/load of player progress
//!
//! Features:
//! - JSON save record compatible with versionless saves
//! - Storage port (`SaveStore`) so the state machine never touches storage directly
//! - Memory, file (native) and LocalStorage (web) backends
//! - Malformed data is reported as an error and never applied

pub mod record;
pub mod store;

pub use record::{SAVE_VERSION, SaveRecord, SavedPlayer};
pub use store::{FileStore, MemoryStore, SaveStore};
#[cfg(target_arch = "wasm32")]
pub use store::LocalStorageStore;

use thiserror::Error;

/// LocalStorage key of the progress save
pub const STORAGE_KEY: &str = "treasureHuntSave";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("save data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("save data is invalid: {0}")]
    Invalid(String),

    #[error("unsupported save version {found}")]
    UnsupportedVersion { found: u32 },

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
