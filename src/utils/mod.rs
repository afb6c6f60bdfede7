//! Utils Module - Shared Utilities
//!
//! Constants, the assessment cache, and telemetry aggregation.

pub mod cache;
pub mod constants;
pub mod telemetry;

pub use cache::*;
pub use telemetry::*;
