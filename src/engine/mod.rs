//! Engine: CLI surface, identity sharding, and the shared retry policy.

pub mod arg_parser;
pub mod handlers;
pub mod partition;
pub mod retry;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use handlers::handle_run;
pub use partition::{effective_threads, partition};
pub use retry::RetryPolicy;
