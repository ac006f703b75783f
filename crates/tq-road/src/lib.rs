//! `tq-road` — road-network graph, route views and the world-query seam.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`graph`]      | `RoadGraph` (CSR + reverse CSR), `RoadGraphBuilder`       |
//! | [`route_view`] | `RouteView`, `build_route_view`, `DEFAULT_MAX_DEPTH`      |
//! | [`sampler`]    | `EdgeWeights`, `sample_route`, `reconstruct_path`         |
//! | [`world`]      | `WorldQuery` provider trait and its result types          |
//! | [`error`]      | `RoadError`, `RoadResult`                                 |
//!
//! # Traversal rule
//!
//! A road network may contain cycles (ring roads, loops).  Nothing in this
//! workspace walks the raw network except for one-hop successor lookups;
//! every multi-hop query runs on a [`RouteView`], a depth-bounded tree
//! unrolled from the agent's current (road, direction).

pub mod error;
pub mod graph;
pub mod route_view;
pub mod sampler;
pub mod world;


pub use error::{RoadError, RoadResult};
pub use graph::{RoadGraph, RoadGraphBuilder};
pub use route_view::{build_route_view, leaves_below, RouteView, DEFAULT_MAX_DEPTH};
pub use sampler::{reconstruct_path, sample_route, EdgeWeights, RoutePath, SampledRoute};
pub use world::{
    route_segments, LongitudinalDistance, Obstruction, Pose, RouteQueryResult, RouteSegment,
    WorldQuery,
};
