//! Road-subsystem error type.

use thiserror::Error;

use tq_core::{EdgeId, RouteElement, VertexId};

/// Errors produced by `tq-road`.
#[derive(Debug, Error)]
pub enum RoadError {
    #[error("no weight supplied for {0}")]
    MissingEdgeWeight(EdgeId),

    #[error("{edge} has negative weight {weight}")]
    NegativeEdgeWeight { edge: EdgeId, weight: f64 },

    #[error("{0} is not a vertex of the graph")]
    UnknownVertex(VertexId),

    #[error("route element {0} not found in network")]
    UnknownElement(RouteElement),
}

pub type RoadResult<T> = Result<T, RoadError>;
