//! In-process store implementation.
//!
//! Backs both store traits with ordered maps behind a single lock. Used by
//! the test suites and by the binary's `memory` mode.

mod store;

pub use store::MemoryStore;
