//! Key/value document persistence.
//!
//! Components never touch the filesystem directly. They are handed a
//! [`Store`] and read or write whole framed documents by key. Every failure on
//! that path is logged and treated as "absent" or "write skipped": the
//! in-memory state stays authoritative until the next successful write.

pub mod codec;
mod file_store;
mod memory;
mod persistent;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use file_store::FileStore;
pub use memory::MemoryStore;
pub use persistent::Persistent;

/// Blocking, synchronous document store.
pub trait Store: Send + Sync {
    /// `Ok(None)` when nothing is stored under `key`.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the document under `key`.
    fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    fn contains(&self, key: &str) -> Result<bool>;

    /// All keys, sorted.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Decode the document under `key`, or `None` if it is missing or unreadable.
pub fn load_json<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Option<T> {
    let bytes = match store.read(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(err) => {
            log::warn!("failed to read `{key}`: {err:#}");
            return None;
        }
    };
    match codec::decode_document(&bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("failed to decode `{key}`: {err}");
            None
        }
    }
}

/// Encode and write `value` under `key`. Returns whether the write landed.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn Store, key: &str, value: &T) -> bool {
    let bytes = match codec::encode_document(value) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::warn!("failed to encode `{key}`: {err}");
            return false;
        }
    };
    match store.write(key, &bytes) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("failed to write `{key}`: {err:#}");
            false
        }
    }
}
