//! Queue service provider implementations.
//!
//! Currently only the in-memory provider used for testing and
//! development; cloud transports plug in behind the same trait.

mod memory;

pub use memory::InMemoryQueueService;
