//! `tq-spawn` — finding places and velocities for new vehicles.
//!
//! # Crate layout
//!
//! | Module       | Contents                                               |
//! |--------------|--------------------------------------------------------|
//! | [`analyzer`] | `SpawnPointAnalyzer`, `LaneSpawningRange`              |
//! | [`config`]   | `SpawnConfig` thresholds and assumed kinematics        |
//! | [`error`]    | `SpawnError`, `SpawnResult`                            |
//!
//! The analyzer only reads the world.  A spawner drives it once per attempt
//! and inserts the vehicle itself:
//!
//! ```rust,ignore
//! let analyzer = SpawnPointAnalyzer::new(&world);
//! let route = analyzer.sample_route("A", -1, &mut rng)?;
//! for range in analyzer.valid_lane_spawning_ranges("A", 0.0, 200.0, &[-1], &LaneType::DRIVABLE) {
//!     let Some(s) = analyzer.next_spawn_position("A", -1, range.bounds(), &car, 30.0, 2.0, &route, &LaneType::DRIVABLE) else {
//!         continue;
//!     };
//!     let v = analyzer.spawn_velocity_to_prevent_crashing(-1, s, &car, 30.0, &route);
//!     // ...
//! }
//! ```

pub mod analyzer;
pub mod config;
pub mod error;

#[cfg(test)]
mod tests;

pub use analyzer::{LaneSpawningRange, SpawnPointAnalyzer};
pub use config::SpawnConfig;
pub use error::{SpawnError, SpawnResult};
