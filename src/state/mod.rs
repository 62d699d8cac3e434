//! State module for tracking lookups in flight
//!
//! # Components
//!
//! - `PipelineState`: where a single fetch pipeline is in its lifecycle
//! - `RequestEpoch` / `EpochToken`: which lookup is the current one for a slot

mod epoch;
mod pipeline_state;

// Re-export main types
pub use epoch::{EpochToken, RequestEpoch};
pub use pipeline_state::PipelineState;
