//! Pipeline components: shared context, worker loop, two-tier orchestration.

pub mod context;
pub mod orchestrator;
pub mod worker;

pub use context::JobContext;
pub use orchestrator::run_job;
pub use worker::{process_identity, spawn_search_workers};
