//! Lane identifiers, lane types and lane sections.
//!
//! Lane ids follow the OpenDRIVE convention: `0` is the reference line,
//! negative ids lie to the right of it and are driven in the road's forward
//! direction, positive ids lie to the left and are driven against it.

use std::str::FromStr;

use crate::CoreError;

/// Signed OpenDRIVE lane id.
pub type LaneId = i32;

/// Lane usage type.  Only the types the spawn and query logic distinguish.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LaneType {
    #[default]
    Driving,
    Exit,
    Entry,
    OnRamp,
    OffRamp,
    Shoulder,
    Border,
    Sidewalk,
    Biking,
    Stop,
    None,
}

impl LaneType {
    /// Lane types an ordinary vehicle may be spawned on and drive along.
    pub const DRIVABLE: [LaneType; 5] = [
        LaneType::Driving,
        LaneType::Exit,
        LaneType::Entry,
        LaneType::OnRamp,
        LaneType::OffRamp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LaneType::Driving  => "driving",
            LaneType::Exit     => "exit",
            LaneType::Entry    => "entry",
            LaneType::OnRamp   => "onRamp",
            LaneType::OffRamp  => "offRamp",
            LaneType::Shoulder => "shoulder",
            LaneType::Border   => "border",
            LaneType::Sidewalk => "sidewalk",
            LaneType::Biking   => "biking",
            LaneType::Stop     => "stop",
            LaneType::None     => "none",
        }
    }
}

impl std::fmt::Display for LaneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LaneType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = match s {
            "driving"  => LaneType::Driving,
            "exit"     => LaneType::Exit,
            "entry"    => LaneType::Entry,
            "onRamp"   => LaneType::OnRamp,
            "offRamp"  => LaneType::OffRamp,
            "shoulder" => LaneType::Shoulder,
            "border"   => LaneType::Border,
            "sidewalk" => LaneType::Sidewalk,
            "biking"   => LaneType::Biking,
            "stop"     => LaneType::Stop,
            "none"     => LaneType::None,
            other      => return Err(CoreError::UnknownLaneType(other.to_string())),
        };
        Ok(t)
    }
}

/// A longitudinal slice of a road with a constant set of lanes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneSection {
    pub start_s: f64,
    pub end_s:   f64,
    pub lane_ids: Vec<LaneId>,
}

impl LaneSection {
    #[inline]
    pub fn contains_s(&self, s: f64) -> bool {
        self.start_s <= s && s <= self.end_s
    }
}

/// Lateral side relative to the driving direction.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Left,
    Right,
}

/// Longitudinal search direction relative to the driving direction.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Forward,
    Backward,
}
