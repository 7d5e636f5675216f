//! Saga pattern implementation for cross-service bookmark consistency.
//!
//! Bookmarking an article touches two aggregates owned by different services:
//! the article's bookmark counter (Article service) and the bookmark row
//! (this service). There is no shared transaction, so each workflow runs as a
//! saga:
//! 1. Mutate the remote counter
//! 2. Write the local bookmark row
//!
//! If the local write fails, the counter mutation is undone by a compensating
//! remote call. Compensation is best-effort: it runs once, is never retried,
//! and its failure is logged as an inconsistency.
//!
//! The crate also provides the cascade participant that soft-deletes and
//! restores dependent rows when a user or article is deleted elsewhere.

pub mod cascade;
pub mod coordinator;
pub mod error;
pub mod runner;
pub mod services;
pub mod state;
pub mod workflows;

pub use cascade::CascadeParticipant;
pub use coordinator::BookmarkCoordinator;
pub use error::SagaError;
pub use runner::{CompensatingAction, Saga};
pub use services::{CounterError, CounterOperation, CounterService, InMemoryCounterService};
pub use state::SagaState;
