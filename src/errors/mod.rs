//! Centralized error handling for the news updater.
//!
//! Two failure domains exist: configuration resolution, which is fatal and
//! happens before any update work starts, and the transport API, whose
//! errors are recovered at cycle or job granularity by the scheduling core.

pub mod types;

pub use types::*;

/// Convenience type alias for transport API results.
pub type ApiResult<T> = Result<T, ApiError>;
