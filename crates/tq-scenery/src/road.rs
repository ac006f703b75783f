//! Straight roads with lane sections.
//!
//! A road's reference line starts at `(x, y)` and runs along `heading` for
//! `length` metres.  `curvature` is reported by lane queries but does not
//! bend the geometry.  Lane `t` grows to the left of the reference line:
//! negative lanes lie right of it, positive lanes left.

use std::f64::consts::{PI, TAU};

use tq_core::{LaneId, LaneSection, LaneType};

use crate::{SceneryError, SceneryResult};

/// Normalise an angle to `[-pi, pi)`.
#[inline]
pub fn normalize_angle(a: f64) -> f64 {
    (a + PI).rem_euclid(TAU) - PI
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneSpec {
    pub id:        LaneId,
    pub width:     f64,
    pub lane_type: LaneType,
}

impl LaneSpec {
    pub fn new(id: LaneId, width: f64, lane_type: LaneType) -> Self {
        Self { id, width, lane_type }
    }

    pub fn driving(id: LaneId, width: f64) -> Self {
        Self::new(id, width, LaneType::Driving)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectionSpec {
    pub start_s: f64,
    pub end_s:   f64,
    pub lanes:   Vec<LaneSpec>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadSpec {
    pub id:        String,
    pub x:         f64,
    pub y:         f64,
    pub heading:   f64,
    pub length:    f64,
    pub curvature: f64,
    pub sections:  Vec<SectionSpec>,
}

impl RoadSpec {
    /// A road at the origin along the x axis, with no lanes yet.
    pub fn straight(id: impl Into<String>, length: f64) -> Self {
        Self {
            id: id.into(),
            x: 0.0,
            y: 0.0,
            heading: 0.0,
            length,
            curvature: 0.0,
            sections: Vec::new(),
        }
    }

    pub fn at(mut self, x: f64, y: f64, heading: f64) -> Self {
        self.x = x;
        self.y = y;
        self.heading = heading;
        self
    }

    pub fn with_curvature(mut self, curvature: f64) -> Self {
        self.curvature = curvature;
        self
    }

    /// Append a lane section.
    pub fn section(mut self, start_s: f64, end_s: f64, lanes: Vec<LaneSpec>) -> Self {
        self.sections.push(SectionSpec { start_s, end_s, lanes });
        self
    }

    /// One section spanning the whole road.
    pub fn lanes(self, lanes: Vec<LaneSpec>) -> Self {
        let length = self.length;
        self.section(0.0, length, lanes)
    }

    /// Sections must tile `[0, length]` in order; lane ids are non-zero and
    /// unique per section, widths positive.
    pub(crate) fn validate(&self) -> SceneryResult<()> {
        let invalid = |reason: String| SceneryError::InvalidRoad { road: self.id.clone(), reason };
        if !(self.length > 0.0) {
            return Err(invalid(format!("length must be positive, got {}", self.length)));
        }
        let Some(first) = self.sections.first() else {
            return Err(invalid("road has no lane sections".into()));
        };
        if first.start_s != 0.0 {
            return Err(invalid("first section must start at s = 0".into()));
        }
        let mut expected_start = 0.0;
        for section in &self.sections {
            if section.start_s != expected_start || section.end_s <= section.start_s {
                return Err(invalid(format!(
                    "section [{}, {}] does not continue at s = {expected_start}",
                    section.start_s, section.end_s
                )));
            }
            expected_start = section.end_s;
            for (i, lane) in section.lanes.iter().enumerate() {
                if lane.id == 0 || !(lane.width > 0.0) {
                    return Err(invalid(format!("lane {} has width {}", lane.id, lane.width)));
                }
                if section.lanes[..i].iter().any(|l| l.id == lane.id) {
                    return Err(invalid(format!("lane {} listed twice", lane.id)));
                }
            }
        }
        if expected_start != self.length {
            return Err(invalid(format!("sections end at {expected_start}, road at {}", self.length)));
        }
        Ok(())
    }

    // ── Lane lookup ───────────────────────────────────────────────────────

    /// First section containing `s`.
    pub fn section_at(&self, s: f64) -> Option<&SectionSpec> {
        self.sections.iter().find(|sec| sec.start_s <= s && s <= sec.end_s)
    }

    pub fn lane_at(&self, lane: LaneId, s: f64) -> Option<&LaneSpec> {
        self.section_at(s)?.lanes.iter().find(|l| l.id == lane)
    }

    /// `(right, left)` boundary `t` of `lane` at `s`.  Missing inner lanes
    /// count as zero width.
    pub fn lane_bounds(&self, lane: LaneId, s: f64) -> Option<(f64, f64)> {
        let section = self.section_at(s)?;
        let spec = section.lanes.iter().find(|l| l.id == lane)?;
        let inner: f64 = section
            .lanes
            .iter()
            .filter(|l| l.id.signum() == lane.signum() && l.id.abs() < lane.abs())
            .map(|l| l.width)
            .sum();
        Some(if lane < 0 {
            (-inner - spec.width, -inner)
        } else {
            (inner, inner + spec.width)
        })
    }

    pub fn lane_center_t(&self, lane: LaneId, s: f64) -> Option<f64> {
        self.lane_bounds(lane, s).map(|(right, left)| 0.5 * (right + left))
    }

    /// Lanes at `s` whose band overlaps `[t_low, t_high]`.
    pub fn lanes_overlapping(&self, s: f64, t_low: f64, t_high: f64) -> Vec<LaneId> {
        let Some(section) = self.section_at(s) else {
            return Vec::new();
        };
        section
            .lanes
            .iter()
            .filter_map(|l| {
                let (right, left) = self.lane_bounds(l.id, s)?;
                (right < t_high && left > t_low).then_some(l.id)
            })
            .collect()
    }

    /// Lane sections in the provider-neutral form.
    pub fn lane_sections(&self) -> Vec<LaneSection> {
        self.sections
            .iter()
            .map(|sec| LaneSection {
                start_s: sec.start_s,
                end_s: sec.end_s,
                lane_ids: sec.lanes.iter().map(|l| l.id).collect(),
            })
            .collect()
    }

    pub fn has_forward_lanes(&self) -> bool {
        self.sections.iter().flat_map(|s| &s.lanes).any(|l| l.id < 0)
    }

    pub fn has_backward_lanes(&self) -> bool {
        self.sections.iter().flat_map(|s| &s.lanes).any(|l| l.id > 0)
    }

    // ── Geometry ──────────────────────────────────────────────────────────

    /// Inertial coordinates of road point `(s, t)`.
    pub fn point(&self, s: f64, t: f64) -> (f64, f64) {
        let (sin, cos) = self.heading.sin_cos();
        (self.x + s * cos - t * sin, self.y + s * sin + t * cos)
    }
}
