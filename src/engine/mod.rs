//! Fetch-retry-backfill engine
//!
//! This module contains the core paging logic, including:
//! - The pending URL queue
//! - The connection budget bounding concurrent fetches
//! - Batch orchestration with retry and backfill
//! - Cooperative "show more" pagination

mod budget;
mod orchestrator;
mod pagination;
mod queue;

pub use budget::ConnectionBudget;
pub use orchestrator::{Batch, BatchOrchestrator, BatchStats, RetryPolicy};
pub use pagination::{Advance, PaginationSession, RenderSink};
pub use queue::PendingQueue;
