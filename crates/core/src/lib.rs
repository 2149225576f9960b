//! Core types for rewards-dedup
//!
//! Domain types shared by the storage, service and CLI crates. No I/O.

mod config;
pub mod constants;
mod env_config;
mod error;
mod index;
mod record;
mod report;
mod retention;
mod target;

pub use config::*;
pub use constants::*;
pub use env_config::*;
pub use error::*;
pub use index::*;
pub use record::*;
pub use report::*;
pub use retention::*;
pub use target::*;
