//! Key/value storage abstraction and implementations for Shiori.
//!
//! The mistake sync reads and writes whole snapshots under a handful of
//! keys. This crate provides the trait that sync talks to, an in-memory
//! store, and a directory-backed JSON store.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory;
pub mod json_file;

pub use trait_::{KeyValueStore, KeyValueStoreExt, StorageError, Result};
pub use memory::MemoryKeyValueStore;
pub use json_file::JsonFileStore;
