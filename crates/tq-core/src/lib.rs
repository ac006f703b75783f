//! `tq-core` — foundational types for the traffic-query workspace.
//!
//! This crate is a dependency of every other `tq-*` crate.  It has no `tq-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`ids`]     | `ObjectId`, `VertexId`, `EdgeId`                           |
//! | [`route`]   | `RouteElement`, the (road, direction) vertex label         |
//! | [`lane`]    | `LaneId`, `LaneType`, `LaneSection`, `Side`, `Direction`   |
//! | [`object`]  | `WorldObject` and its position / kinematic sub-structs     |
//! | [`time`]    | `SimTime` (whole milliseconds), `SimClock`                 |
//! | [`rng`]     | `UniformSource`, `AgentRng` (per-agent), `SimRng` (global) |
//! | [`error`]   | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public data types.   |

pub mod error;
pub mod ids;
pub mod lane;
pub mod object;
pub mod rng;
pub mod route;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{EdgeId, ObjectId, VertexId};
pub use lane::{Direction, LaneId, LaneSection, LaneType, Side};
pub use object::{
    AgentCategory, Dimensions, Kinematics, MeasurementPoint, ObjectPosition, Remainder,
    RoadInterval, RoadPosition, WorldObject,
};
pub use rng::{AgentRng, SimRng, UniformSource};
pub use route::RouteElement;
pub use time::{SimClock, SimTime};
