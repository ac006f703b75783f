//! Scenery error type.

use thiserror::Error;

use tq_core::{LaneId, ObjectId, RouteElement};

/// Errors produced while building a scenery or placing objects on it.
#[derive(Debug, Error)]
pub enum SceneryError {
    #[error("road '{0}' not found")]
    UnknownRoad(String),

    #[error("lane {lane} does not exist on road '{road}' at s = {s}")]
    UnknownLane { road: String, lane: LaneId, s: f64 },

    #[error("road '{road}' is invalid: {reason}")]
    InvalidRoad { road: String, reason: String },

    #[error("road '{0}' defined twice")]
    DuplicateRoad(String),

    #[error("connection {from} -> {to} refers to a direction without lanes")]
    InvalidConnection { from: RouteElement, to: RouteElement },

    #[error("object {0} not found")]
    UnknownObject(ObjectId),
}

pub type SceneryResult<T> = Result<T, SceneryError>;
