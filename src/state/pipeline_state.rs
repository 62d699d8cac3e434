/// Pipeline state definitions for tracking a lookup in flight
///
/// A pipeline only ever moves forward: `Init → HeadersWait → BodyWait → Done`.
/// Any failure jumps straight to `Done`.
use std::fmt;

/// Represents the current state of a fetch pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Pipeline created, request not yet issued
    Init,

    /// Request issued, waiting for response headers
    HeadersWait,

    /// Headers accepted, waiting for the body to finish loading
    BodyWait,

    /// Terminal: result delivered, request failed, or request went stale
    Done,
}

impl PipelineState {
    /// Returns true if no further events will be processed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::HeadersWait => "headers_wait",
            Self::BodyWait => "body_wait",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
