//! LMDB storage backend for FairDraw.
//!
//! Implements the storage traits from `fairdraw-store` using the `heed` LMDB
//! bindings. Each logical table maps to one LMDB database within a single
//! environment. LMDB allows one writer at a time, so every conditional
//! update (read status, compare, write) runs inside a single write
//! transaction and is serialized against concurrent draws.

pub mod environment;
pub mod error;
pub mod giveaway;
pub mod participant;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;

/// Encode a value for storage.
pub(crate) fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, LmdbError> {
    bincode::serialize(value).map_err(|e| LmdbError::Serialization(e.to_string()))
}

/// Decode a stored value.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    bincode::deserialize(bytes).map_err(|e| LmdbError::Serialization(e.to_string()))
}

/// Build composite key `parent ++ 0x00 ++ child`.
///
/// Identifiers never contain control characters, so the separator keeps
/// prefix scans for `parent` from matching a longer parent id.
pub(crate) fn composite_key(parent: &[u8], child: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(parent.len() + 1 + child.len());
    key.extend_from_slice(parent);
    key.push(0);
    key.extend_from_slice(child);
    key
}

/// Prefix for all composite keys under `parent`.
pub(crate) fn prefix_of(parent: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(parent.len() + 1);
    key.extend_from_slice(parent);
    key.push(0);
    key
}
