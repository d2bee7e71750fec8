//! Local persistent key/value storage
//!
//! The hub keeps a handful of per-profile settings (such as the impersonated
//! role) in a small synchronous key/value store. Values have no expiry and
//! are never synced anywhere.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::utils::error::Result;

/// Synchronous string key/value store
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}
