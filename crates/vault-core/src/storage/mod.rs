//! Configuration store backends for the vault's persisted salt and hash
//!
//! Two backends are provided:
//! 1. JSON file in the application data directory
//! 2. In-memory map (tests and embedding)

mod file;
mod memory;
mod traits;

pub use file::FileConfigStore;
pub use memory::MemoryConfigStore;
pub use traits::{ConfigStore, MASTER_HASH_KEY, MASTER_SALT_KEY};
