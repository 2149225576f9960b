//! Service layer for rewards-dedup
//!
//! Runs the scan → plan → delete → constrain pass against any `RecordStore`.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]

mod dedup_service;
mod error;

pub use dedup_service::DedupService;
pub use error::ServiceError;
