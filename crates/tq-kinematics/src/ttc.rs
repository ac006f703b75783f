//! Time-stepped time-to-collision.
//!
//! # Method
//!
//! Both objects are advanced by a fixed step (constant acceleration for
//! position, constant yaw acceleration for heading).  After each step their
//! oriented bounding boxes are rebuilt and tested for intersection.  The
//! number of steps is fixed up front at `ceil(max_ttc / step)`, so the cost
//! is bounded regardless of input.

use geo::{Intersects, LineString, Polygon};

use tq_core::WorldObject;

/// Scalar stand-in for "no collision within the horizon".
pub const NO_COLLISION: f64 = f64::MAX;

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TtcConfig {
    /// Simulation step in milliseconds.  Default: 100.
    pub time_step_ms:         f64,
    /// Added to each object's length, split evenly front and back.
    pub longitudinal_padding: f64,
    /// Added to each object's width.
    pub lateral_padding:      f64,
}

impl Default for TtcConfig {
    fn default() -> Self {
        Self { time_step_ms: 100.0, longitudinal_padding: 0.0, lateral_padding: 0.0 }
    }
}

// ── TtcParameters ─────────────────────────────────────────────────────────────

/// Kinematic snapshot of one object, advanced in place during a simulation.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct TtcParameters {
    pub length:           f64,
    pub width:            f64,
    /// Reference point to leading edge.
    pub front_length:     f64,
    /// Reference point to trailing edge.
    pub back_length:      f64,
    pub x:                f64,
    pub y:                f64,
    pub velocity_x:       f64,
    pub velocity_y:       f64,
    pub acceleration_x:   f64,
    pub acceleration_y:   f64,
    pub yaw:              f64,
    pub yaw_rate:         f64,
    pub yaw_acceleration: f64,
}

impl TtcParameters {
    /// Snapshot of `object` with its box enlarged by the given paddings.
    /// Stationary objects get no yaw rate.
    pub fn from_object(object: &WorldObject, longitudinal_padding: f64, lateral_padding: f64) -> Self {
        let k = &object.kinematics;
        let d = &object.dimensions;
        let length = d.length + longitudinal_padding;
        let front_length = d.distance_reference_to_leading_edge + 0.5 * longitudinal_padding;
        let (acceleration_x, acceleration_y) = object.acceleration_xy();
        let (yaw_rate, yaw_acceleration) = if object.is_agent() {
            (k.yaw_rate, k.yaw_acceleration)
        } else {
            (0.0, 0.0)
        };
        Self {
            length,
            width: d.width + lateral_padding,
            front_length,
            back_length: length - front_length,
            x: k.x,
            y: k.y,
            velocity_x: k.velocity_x,
            velocity_y: k.velocity_y,
            acceleration_x,
            acceleration_y,
            yaw: k.yaw,
            yaw_rate,
            yaw_acceleration,
        }
    }

    /// Advance by `dt` seconds.
    ///
    /// Velocity and acceleration vectors are rotated by the heading change of
    /// the step before being integrated.
    pub fn propagate(&mut self, dt: f64) {
        self.x += 0.5 * self.acceleration_x * dt * dt + self.velocity_x * dt;
        self.y += 0.5 * self.acceleration_y * dt * dt + self.velocity_y * dt;

        let delta_yaw = 0.5 * self.yaw_acceleration * dt * dt + self.yaw_rate * dt;
        self.yaw += delta_yaw;

        let (sin, cos) = delta_yaw.sin_cos();
        let (vx, vy) = (self.velocity_x, self.velocity_y);
        self.velocity_x = cos * vx - sin * vy;
        self.velocity_y = sin * vx + cos * vy;
        let (ax, ay) = (self.acceleration_x, self.acceleration_y);
        self.acceleration_x = cos * ax - sin * ay;
        self.acceleration_y = sin * ax + cos * ay;

        self.velocity_x += self.acceleration_x * dt;
        self.velocity_y += self.acceleration_y * dt;
        self.yaw_rate += self.yaw_acceleration * dt;
    }

    /// Closed five-point ring: back right, back left, front left, front
    /// right, back right.
    pub fn bounding_box(&self) -> Polygon<f64> {
        let (sin, cos) = self.yaw.sin_cos();
        let half = 0.5 * self.width;
        let back_x = self.x - cos * self.back_length;
        let back_y = self.y - sin * self.back_length;
        let front_x = self.x + cos * self.front_length;
        let front_y = self.y + sin * self.front_length;

        let back_right = (back_x + sin * half, back_y - cos * half);
        let back_left = (back_x - sin * half, back_y + cos * half);
        let front_left = (front_x - sin * half, front_y + cos * half);
        let front_right = (front_x + sin * half, front_y - cos * half);

        Polygon::new(
            LineString::from(vec![back_right, back_left, front_left, front_right, back_right]),
            vec![],
        )
    }
}

// ── Simulation ────────────────────────────────────────────────────────────────

/// Outcome of one TTC simulation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TtcSimulation {
    /// Simulated time of the first intersection, if within the horizon.
    pub time_to_collision: Option<f64>,
    /// Steps executed.
    pub steps:             usize,
}

impl TtcSimulation {
    /// The TTC as a scalar, [`NO_COLLISION`] when none was found.
    pub fn value(&self) -> f64 {
        self.time_to_collision.unwrap_or(NO_COLLISION)
    }
}

/// Step both objects forward until their boxes intersect or `max_ttc`
/// seconds have been simulated.
///
/// Boxes are only tested after a step, so objects that already overlap
/// report one step as their TTC.
pub fn simulate_ttc(
    mut agent:    TtcParameters,
    mut object:   TtcParameters,
    max_ttc:      f64,
    time_step_ms: f64,
) -> TtcSimulation {
    let dt = time_step_ms / 1000.0;
    if !(dt > 0.0) || !(max_ttc > 0.0) || !max_ttc.is_finite() {
        return TtcSimulation { time_to_collision: None, steps: 0 };
    }

    let max_steps = (max_ttc / dt).ceil() as usize;
    for step in 1..=max_steps {
        agent.propagate(dt);
        object.propagate(dt);
        if agent.bounding_box().intersects(&object.bounding_box()) {
            return TtcSimulation { time_to_collision: Some(step as f64 * dt), steps: step };
        }
    }
    TtcSimulation { time_to_collision: None, steps: max_steps }
}

/// TTC in seconds, or `None` if there is no collision within `max_ttc`.
pub fn calculate_object_ttc(
    agent:        TtcParameters,
    object:       TtcParameters,
    max_ttc:      f64,
    time_step_ms: f64,
) -> Option<f64> {
    simulate_ttc(agent, object, max_ttc, time_step_ms).time_to_collision
}

/// TTC between two world objects.
pub fn object_ttc(agent: &WorldObject, object: &WorldObject, max_ttc: f64, config: &TtcConfig) -> Option<f64> {
    let a = TtcParameters::from_object(agent, config.longitudinal_padding, config.lateral_padding);
    let b = TtcParameters::from_object(object, config.longitudinal_padding, config.lateral_padding);
    calculate_object_ttc(a, b, max_ttc, config.time_step_ms)
}
