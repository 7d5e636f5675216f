//! Remote service traits and in-memory implementations for saga steps.

pub mod counter;

pub use counter::{CounterError, CounterOperation, CounterService, InMemoryCounterService};
