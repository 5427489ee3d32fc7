//! Persistence layer: key-value storage backends and the entitlement token store.

pub mod file;
pub mod storage;
pub mod token_store;
