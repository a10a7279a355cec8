//! Pipeline components: pool, completion queue, rendezvous, feeder and drainer loops.

pub mod cancel;
pub mod completion;
pub mod context;
pub mod counters;
pub mod drainer;
pub mod error_handler;
pub mod feeder;
pub mod orchestrator;
pub mod pool;
pub mod rendezvous;

pub use cancel::CancelToken;
pub use completion::{Completed, CompletionQueue};
pub use context::{LoopGuard, PipelineContext};
pub use counters::FlowCounters;
pub use drainer::run_drainer;
pub use error_handler::{check_loop_results, root_cause};
pub use feeder::run_feeder;
pub use orchestrator::run_pipeline;
pub use pool::{Job, WorkerPool};
pub use rendezvous::Rendezvous;
