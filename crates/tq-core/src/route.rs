//! The `RouteElement` vertex label.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// A directed traversal unit: one road driven in one direction.
///
/// Used both as a map key and as the label of every road-graph vertex, so it
/// carries a total order: direction first (`false` before `true`), then road
/// id.  Each road contributes at most two elements to a network.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteElement {
    pub road_id: String,
    pub in_forward_direction: bool,
}

impl RouteElement {
    pub fn new(road_id: impl Into<String>, in_forward_direction: bool) -> Self {
        Self { road_id: road_id.into(), in_forward_direction }
    }

    /// The element driven on the same road in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self { road_id: self.road_id.clone(), in_forward_direction: !self.in_forward_direction }
    }

    /// Direction implied by a lane id: negative lanes run along the road's
    /// reference line, positive lanes against it.
    #[inline]
    pub fn for_lane(road_id: impl Into<String>, lane_id: i32) -> Self {
        Self::new(road_id, lane_id < 0)
    }
}

impl Ord for RouteElement {
    fn cmp(&self, other: &Self) -> Ordering {
        self.in_forward_direction
            .cmp(&other.in_forward_direction)
            .then_with(|| self.road_id.cmp(&other.road_id))
    }
}

impl PartialOrd for RouteElement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RouteElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.in_forward_direction { '+' } else { '-' };
        write!(f, "{}:{}", self.road_id, sign)
    }
}

impl FromStr for RouteElement {
    type Err = CoreError;

    /// Parses the `Display` form, e.g. `"A1:+"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidRouteElement(s.to_string());
        let (road, sign) = s.rsplit_once(':').ok_or_else(invalid)?;
        if road.is_empty() {
            return Err(invalid());
        }
        match sign {
            "+" => Ok(Self::new(road, true)),
            "-" => Ok(Self::new(road, false)),
            _ => Err(invalid()),
        }
    }
}
