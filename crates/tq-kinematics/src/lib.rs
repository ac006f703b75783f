//! `tq-kinematics` — collision prediction between two moving objects.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                      |
//! |-----------|---------------------------------------------------------------|
//! | [`brake`] | `will_crash_during_brake`, `will_crash`, `calculate_net_time_gap` |
//! | [`ttc`]   | `TtcParameters`, `simulate_ttc`, `calculate_object_ttc`, `TtcConfig` |
//!
//! The brake tests are closed-form and one-dimensional (longitudinal gap
//! only).  The TTC simulation steps oriented bounding boxes forward in time
//! and so handles yaw rate, which the closed form cannot.

pub mod brake;
pub mod ttc;

#[cfg(test)]
mod tests;

pub use brake::{calculate_net_time_gap, will_crash, will_crash_during_brake};
pub use ttc::{
    calculate_object_ttc, object_ttc, simulate_ttc, TtcConfig, TtcParameters, TtcSimulation,
    NO_COLLISION,
};
