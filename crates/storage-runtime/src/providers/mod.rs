//! Object store provider implementations.
//!
//! Currently only the in-memory provider used for testing and
//! development; cloud providers plug in behind the same trait.

mod memory;

pub use memory::InMemoryObjectStore;
