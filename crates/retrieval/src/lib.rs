//! Fetching, decompression, and conversion of resolved product candidates.
//!
//! The orchestrator ([`orchestrator::Orchestrator`]) walks the candidate
//! lists the resolver produces: grouped by destination file, strict priority
//! order within a group, bounded retries on transient failures, and a
//! post-download pipeline that turns archive deliveries into ready-to-use
//! files. Every logical file succeeds or fails on its own.

pub mod fetcher;
pub mod orchestrator;
pub mod outcome;
pub mod pipeline;

pub use fetcher::{FetchStatus, Fetcher, HttpFetcher};
pub use orchestrator::{Orchestrator, RetrievalConfig};
pub use outcome::{FetchOutcome, JsonlOutcomeSink, LogMode, OutcomeRecord, OutcomeSink};
pub use pipeline::{run_pipeline, PipelineError, ToolPaths};
