//! Dashboard engine: backend HTTP client and the worker that runs it.
mod client;
mod engine;
mod types;

pub use client::{Backend, ClientSettings, ReqwestBackend};
pub use engine::EngineHandle;
pub use types::{
    parse_timestamp, ApiError, EngineEvent, FailureKind, JobOverview, JobSummary, ListParams,
    RequestSeq,
};
