//! Storage adapters implementing [`crate::domain::ports::OrderStore`].

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
