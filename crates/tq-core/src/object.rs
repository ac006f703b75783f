//! World objects: agents and stationary obstacles as the road-network
//! provider exposes them.
//!
//! Positions are road-relative.  An object can span several roads, so every
//! positional field is a map keyed by road id.  Inertial quantities (`x`,
//! `y`, `yaw`) live in [`Kinematics`].

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::{CoreError, LaneId, ObjectId};

// ── Category ──────────────────────────────────────────────────────────────────

/// Who controls an object.  Spawning treats `Ego` and `Scenario` agents as
/// privileged: their occupied ranges are never spawned into.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentCategory {
    Ego,
    Scenario,
    Common,
    StationaryObject,
}

impl AgentCategory {
    #[inline]
    pub fn is_agent(self) -> bool {
        self != AgentCategory::StationaryObject
    }

    #[inline]
    pub fn is_privileged(self) -> bool {
        matches!(self, AgentCategory::Ego | AgentCategory::Scenario)
    }
}

impl FromStr for AgentCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ego" => Ok(AgentCategory::Ego),
            "Scenario" => Ok(AgentCategory::Scenario),
            "Common" => Ok(AgentCategory::Common),
            "StationaryObject" => Ok(AgentCategory::StationaryObject),
            other => Err(CoreError::UnknownCategory(other.to_string())),
        }
    }
}

// ── Road-relative position ────────────────────────────────────────────────────

/// A point on a specific lane of one road.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadPosition {
    pub lane_id: LaneId,
    pub s:       f64,
    pub t:       f64,
    /// Heading relative to the road's reference line, radians.
    pub hdg:     f64,
}

/// Free lateral space to the outer lane boundaries.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Remainder {
    pub left:  f64,
    pub right: f64,
}

/// The part of one road an object's bounding box covers.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadInterval {
    pub s_start:   f64,
    pub s_end:     f64,
    pub lanes:     Vec<LaneId>,
    pub remainder: Remainder,
}

/// Position of an object in the road network, keyed by road id.
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectPosition {
    pub reference_point:   BTreeMap<String, RoadPosition>,
    /// Middle of the object's front edge.
    pub main_locate_point: BTreeMap<String, RoadPosition>,
    pub touched_roads:     BTreeMap<String, RoadInterval>,
}

/// Which point of an object a measurement refers to.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MeasurementPoint {
    Front,
    Rear,
    Reference,
}

// ── Kinematics & geometry ─────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Kinematics {
    pub x:                f64,
    pub y:                f64,
    pub yaw:              f64,
    pub yaw_rate:         f64,
    pub yaw_acceleration: f64,
    pub velocity_x:       f64,
    pub velocity_y:       f64,
    /// Longitudinal acceleration along `yaw`.
    pub acceleration:     f64,
}

/// Bounding-box dimensions.  The reference point lies on the longitudinal
/// axis, `distance_reference_to_leading_edge` behind the front edge.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimensions {
    pub length: f64,
    pub width:  f64,
    pub distance_reference_to_leading_edge: f64,
}

impl Dimensions {
    /// Box centred on the reference point.
    pub fn centered(length: f64, width: f64) -> Self {
        Self { length, width, distance_reference_to_leading_edge: length / 2.0 }
    }

    #[inline]
    pub fn front_length(&self) -> f64 {
        self.distance_reference_to_leading_edge
    }

    #[inline]
    pub fn rear_length(&self) -> f64 {
        self.length - self.distance_reference_to_leading_edge
    }
}

// ── WorldObject ───────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldObject {
    pub id:         ObjectId,
    pub name:       String,
    pub category:   AgentCategory,
    pub kinematics: Kinematics,
    pub dimensions: Dimensions,
    pub position:   ObjectPosition,
}

impl WorldObject {
    #[inline]
    pub fn is_agent(&self) -> bool {
        self.category.is_agent()
    }

    pub fn absolute_velocity(&self) -> f64 {
        self.kinematics.velocity_x.hypot(self.kinematics.velocity_y)
    }

    /// Velocity component along the object's own heading.
    pub fn longitudinal_velocity(&self) -> f64 {
        let k = &self.kinematics;
        k.velocity_x * k.yaw.cos() + k.velocity_y * k.yaw.sin()
    }

    pub fn lateral_velocity(&self) -> f64 {
        let k = &self.kinematics;
        -k.velocity_x * k.yaw.sin() + k.velocity_y * k.yaw.cos()
    }

    /// Inertial acceleration components derived from the longitudinal value.
    pub fn acceleration_xy(&self) -> (f64, f64) {
        let k = &self.kinematics;
        (k.acceleration * k.yaw.cos(), k.acceleration * k.yaw.sin())
    }

    /// Road-s coordinate of a measurement point on `road`, or `None` if the
    /// object does not touch that road.
    ///
    /// `Front` and `Rear` are the far and near ends of the touched interval
    /// in road coordinates.
    pub fn distance_to_start_of_road(&self, point: MeasurementPoint, road: &str) -> Option<f64> {
        match point {
            MeasurementPoint::Front => self.position.touched_roads.get(road).map(|i| i.s_end),
            MeasurementPoint::Rear => self.position.touched_roads.get(road).map(|i| i.s_start),
            MeasurementPoint::Reference => self.position.reference_point.get(road).map(|p| p.s),
        }
    }

    /// Roads a measurement point currently lies on.
    pub fn roads(&self, point: MeasurementPoint) -> Vec<String> {
        match point {
            MeasurementPoint::Front => self.position.main_locate_point.keys().cloned().collect(),
            MeasurementPoint::Rear => self.position.touched_roads.keys().cloned().collect(),
            MeasurementPoint::Reference => self.position.reference_point.keys().cloned().collect(),
        }
    }

    /// Lane of the reference point on `road`.
    pub fn lane_id(&self, road: &str) -> Option<LaneId> {
        self.position.reference_point.get(road).map(|p| p.lane_id)
    }
}
