//! In-process backend for kvmapper.
//!
//! `MemoryBackend` implements the full `kvmapper_client::Backend` contract
//! (links, secondary indexes, search, predicate scans) without a server.
//! Useful for tests and for embedding the mapper where no external store is
//! available.

mod config;
mod in_memory;

pub use config::MemoryConfig;
pub use in_memory::MemoryBackend;
