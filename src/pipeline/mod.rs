//! Pipeline components: queues and context, dispatcher, worker pool, aggregator, runner.

pub mod aggregate;
pub mod context;
pub mod dispatch;
pub mod error_handler;
pub mod orchestrator;
pub mod state;
pub mod workers;

pub use aggregate::{Aggregated, aggregate_records, spawn_aggregator};
pub use context::{PipelineChannels, SkippedList, WorkerContext, create_pipeline_channels};
pub use dispatch::dispatch;
pub use error_handler::{print_skipped, report_run_summary};
pub use orchestrator::PipelineRunner;
pub use state::PipelineState;
pub use workers::{WorkerPool, WorkerStats};
