//! `tq-scenery` — an in-memory road network that answers world queries.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`road`]    | `RoadSpec`, `SectionSpec`, `LaneSpec`: straight roads        |
//! | [`scenery`] | `SceneryBuilder`, `Scenery`, `ObjectPlacement`               |
//! | `index`     | per-road R-tree of touched lane intervals                   |
//! | [`error`]   | `SceneryError`, `SceneryResult`                             |
//!
//! `Scenery` implements [`tq_road::WorldQuery`], so every route-aware query
//! in the workspace can run against it.  Roads are straight; objects are
//! confined to the road they are placed on.

pub mod error;
mod index;
pub mod road;
pub mod scenery;


pub use error::{SceneryError, SceneryResult};
pub use road::{normalize_angle, LaneSpec, RoadSpec, SectionSpec};
pub use scenery::{ObjectPlacement, Scenery, SceneryBuilder};
