//! Tunable constants of the spawn analysis.

use crate::{SpawnError, SpawnResult};

/// Thresholds and assumed kinematics used by [`SpawnPointAnalyzer`].
///
/// The defaults are the values every spawner in a run normally shares;
/// construct a custom one only to study sensitivity.
///
/// [`SpawnPointAnalyzer`]: crate::SpawnPointAnalyzer
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpawnConfig {
    /// Margin added around privileged agents when cutting spawn ranges (m).
    pub epsilon: f64,

    /// Hard minimum gap kept in front of a new vehicle (m).  Default: 5.
    pub minimum_separation_buffer: f64,

    /// Time-to-collision below which the spawn velocity is capped (s).
    pub ttc_threshold: f64,

    /// Time a new vehicle must be able to drive before its lane ends (s).
    pub ttc_end_of_lane: f64,

    /// Reaction time before the rear vehicle starts braking (s).
    pub assumed_time_to_brake: f64,

    /// Deceleration of the rear vehicle in the crash check (m/s², negative).
    pub assumed_braking_acceleration: f64,

    /// Deceleration of the front vehicle in the crash check (m/s², negative).
    pub assumed_front_acceleration: f64,

    /// Depth of the route tree sampled for a new vehicle (edges).
    pub max_road_graph_depth: usize,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            epsilon:                      0.001,
            minimum_separation_buffer:    5.0,
            ttc_threshold:                2.0,
            ttc_end_of_lane:              4.0,
            assumed_time_to_brake:        1.0,
            assumed_braking_acceleration: -6.0,
            assumed_front_acceleration:   -10.0,
            max_road_graph_depth:         10,
        }
    }
}

impl SpawnConfig {
    /// Reject values that make the analysis meaningless.
    pub fn validate(&self) -> SpawnResult<()> {
        let checks: [(&'static str, f64, bool); 7] = [
            ("epsilon", self.epsilon, self.epsilon >= 0.0),
            ("minimum_separation_buffer", self.minimum_separation_buffer, self.minimum_separation_buffer >= 0.0),
            ("ttc_threshold", self.ttc_threshold, self.ttc_threshold > 0.0),
            ("ttc_end_of_lane", self.ttc_end_of_lane, self.ttc_end_of_lane >= 0.0),
            ("assumed_time_to_brake", self.assumed_time_to_brake, self.assumed_time_to_brake >= 0.0),
            (
                "assumed_braking_acceleration",
                self.assumed_braking_acceleration,
                self.assumed_braking_acceleration < 0.0,
            ),
            (
                "assumed_front_acceleration",
                self.assumed_front_acceleration,
                self.assumed_front_acceleration < 0.0,
            ),
        ];
        for (field, value, ok) in checks {
            // NaN fails every comparison above.
            if !ok {
                return Err(SpawnError::InvalidConfig { field, value });
            }
        }
        if self.max_road_graph_depth == 0 {
            return Err(SpawnError::InvalidConfig { field: "max_road_graph_depth", value: 0.0 });
        }
        Ok(())
    }

    /// Distance to keep between the rear of a front vehicle and the reference
    /// point of a new one: the time gap at `velocity`, but never less than
    /// the separation buffer, plus `considered_lengths`.
    #[inline]
    pub fn separation(&self, gap_secs: f64, velocity: f64, considered_lengths: f64) -> f64 {
        let minimum = self.minimum_separation_buffer + considered_lengths;
        (gap_secs * velocity + considered_lengths).max(minimum)
    }
}
