//! Spawn-analysis error type.

use thiserror::Error;

use tq_core::RouteElement;
use tq_road::RoadError;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("invalid spawn configuration: {field} = {value}")]
    InvalidConfig { field: &'static str, value: f64 },

    #[error("route element {0} is not part of the road network")]
    UnknownRouteElement(RouteElement),

    #[error(transparent)]
    Road(#[from] RoadError),
}

pub type SpawnResult<T> = Result<T, SpawnError>;
