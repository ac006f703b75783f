//! Ego-agent error type.

use thiserror::Error;

use tq_core::{ObjectId, VertexId};
use tq_road::RoadError;

/// Errors produced by route-relative queries.
#[derive(Debug, Error)]
pub enum EgoError {
    #[error("no route set")]
    NoRoute,

    #[error("route is no longer valid for the agent's position")]
    InvalidRoute,

    #[error("alternative {index} out of range, agent has {len}")]
    AlternativeOutOfRange { index: usize, len: usize },

    #[error("{0} is not below the agent's current vertex")]
    UnreachableTarget(VertexId),

    #[error("agent is not located on road '{0}'")]
    NotOnRoad(String),

    #[error("agent {0} not found in the world")]
    AgentNotFound(ObjectId),

    #[error(transparent)]
    Road(#[from] RoadError),
}

pub type EgoResult<T> = Result<T, EgoError>;
