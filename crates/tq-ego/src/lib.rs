//! `tq-ego` — what one agent sees along the routes it may still take.
//!
//! # Crate layout
//!
//! | Module           | Contents                                              |
//! |------------------|-------------------------------------------------------|
//! | [`agent`]        | `EgoAgent` route state machine and its queries        |
//! | [`alternatives`] | `alternatives_where`, `alternatives_sorted`           |
//! | [`error`]        | `EgoError`, `EgoResult`                               |
//!
//! Two kinds of query exist.  Plain queries (`distance_to_end_of_lane`,
//! `objects_in_range`, ...) run along the agent's way to its target and
//! return one value.  `query_*` methods run once per alternative and return
//! a `Vec` in alternative order, ready for [`alternatives_where`] /
//! [`alternatives_sorted`].
//!
//! Relative lane ids count from the agent's lane: `0` is its own lane,
//! positive ids lie to the left in driving direction.

pub mod agent;
pub mod alternatives;
pub mod error;

#[cfg(test)]
mod tests;

pub use agent::{EgoAgent, RouteStatus};
pub use alternatives::{alternatives_sorted, alternatives_where};
pub use error::{EgoError, EgoResult};
