//! Storage layer for rewards-dedup
//!
//! A `RecordStore` trait with a MongoDB backend for real runs and an
//! in-memory backend that mirrors its grouping and unique-index rules.

pub mod error;
mod memory;
mod mongo;
#[cfg(test)]
mod tests;
pub mod traits;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use traits::RecordStore;
