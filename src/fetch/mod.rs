//! Fetch module: asynchronous linked-page lookups
//!
//! This module contains the lookup machinery:
//! - The transport seam and its reqwest implementation
//! - The per-request pipeline state machine with staleness tracking
//! - The coordinator that gates and launches lookups

mod coordinator;
mod pipeline;
mod transport;

pub use coordinator::{Deferred, PipelineCoordinator};
pub use pipeline::{CompletionFn, FetchPipeline, FetchRequest};
pub use transport::{
    build_http_client, HttpRequest, ReqwestTransport, ResponseHead, Transport, TransportEvent,
    ACCEPT_HTML,
};
