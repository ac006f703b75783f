//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]` where they call into this crate.

use thiserror::Error;

use crate::ObjectId;

/// Errors produced by `tq-core` parsing and lookup helpers.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),

    #[error("unknown lane type '{0}'")]
    UnknownLaneType(String),

    #[error("unknown agent category '{0}'")]
    UnknownCategory(String),

    #[error("invalid route element '{0}', expected '<road>:+' or '<road>:-'")]
    InvalidRouteElement(String),

    #[error("simulation time must be finite and non-negative, got {0} s")]
    InvalidTime(f64),
}

/// Shorthand result type for `tq-core`.
pub type CoreResult<T> = Result<T, CoreError>;
