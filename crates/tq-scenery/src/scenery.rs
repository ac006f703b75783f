//! The in-memory world: roads, their connections and the objects on them.

use std::f64::consts::PI;

use geo::Intersects;
use log::{debug, trace};
use rustc_hash::FxHashMap;

use tq_core::{
    AgentCategory, Dimensions, Kinematics, LaneId, LaneSection, LaneType, ObjectId, ObjectPosition,
    Remainder, RoadInterval, RoadPosition, RouteElement, WorldObject,
};
use tq_kinematics::TtcParameters;
use tq_road::{EdgeWeights, Pose, RoadGraph, RoadGraphBuilder, WorldQuery};

use crate::index::ObjectIndex;
use crate::road::{normalize_angle, RoadSpec};
use crate::{SceneryError, SceneryResult};

// ── ObjectPlacement ───────────────────────────────────────────────────────────

/// Where and how to put an object on the scenery.
///
/// `t` is the lateral offset from the lane centre and `hdg` the heading
/// relative to the lane's driving direction, both in the driving frame (left
/// positive).  `speed` is along the heading.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectPlacement {
    pub name:         String,
    pub category:     AgentCategory,
    pub road:         String,
    pub lane:         LaneId,
    pub s:            f64,
    pub t:            f64,
    pub hdg:          f64,
    pub dimensions:   Dimensions,
    pub speed:        f64,
    pub acceleration: f64,
    pub yaw_rate:     f64,
}

impl ObjectPlacement {
    pub fn new(
        name:       impl Into<String>,
        category:   AgentCategory,
        road:       impl Into<String>,
        lane:       LaneId,
        s:          f64,
        dimensions: Dimensions,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            road: road.into(),
            lane,
            s,
            t: 0.0,
            hdg: 0.0,
            dimensions,
            speed: 0.0,
            acceleration: 0.0,
            yaw_rate: 0.0,
        }
    }

    pub fn offset(mut self, t: f64) -> Self {
        self.t = t;
        self
    }

    pub fn heading(mut self, hdg: f64) -> Self {
        self.hdg = hdg;
        self
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn acceleration(mut self, acceleration: f64) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn yaw_rate(mut self, yaw_rate: f64) -> Self {
        self.yaw_rate = yaw_rate;
        self
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Collects roads and connections, then validates them in [`build`](Self::build).
#[derive(Default)]
pub struct SceneryBuilder {
    roads:       Vec<RoadSpec>,
    connections: Vec<(RouteElement, RouteElement, f64)>,
}

impl SceneryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn road(mut self, spec: RoadSpec) -> Self {
        self.roads.push(spec);
        self
    }

    /// Successor link with branch weight 1.
    pub fn connect(self, from: RouteElement, to: RouteElement) -> Self {
        self.connect_weighted(from, to, 1.0)
    }

    /// Successor link whose weight is used when sampling routes through it.
    pub fn connect_weighted(mut self, from: RouteElement, to: RouteElement, weight: f64) -> Self {
        self.connections.push((from, to, weight));
        self
    }

    pub fn build(self) -> SceneryResult<Scenery> {
        let mut roads: FxHashMap<String, RoadSpec> = FxHashMap::default();
        let mut network = RoadGraphBuilder::new();

        for spec in self.roads {
            spec.validate()?;
            if roads.contains_key(&spec.id) {
                return Err(SceneryError::DuplicateRoad(spec.id));
            }
            if spec.has_forward_lanes() {
                network.vertex(RouteElement::new(spec.id.clone(), true));
            }
            if spec.has_backward_lanes() {
                network.vertex(RouteElement::new(spec.id.clone(), false));
            }
            roads.insert(spec.id.clone(), spec);
        }

        let drivable = |e: &RouteElement| {
            roads.get(&e.road_id).is_some_and(|r| {
                if e.in_forward_direction { r.has_forward_lanes() } else { r.has_backward_lanes() }
            })
        };
        let mut weights = FxHashMap::default();
        for (from, to, weight) in self.connections {
            for element in [&from, &to] {
                if !roads.contains_key(&element.road_id) {
                    return Err(SceneryError::UnknownRoad(element.road_id.clone()));
                }
            }
            if !drivable(&from) || !drivable(&to) {
                return Err(SceneryError::InvalidConnection { from, to });
            }
            network.connect(from.clone(), to.clone());
            weights.insert((from, to), weight.max(0.0));
        }

        let network = network.build();
        debug!(
            "scenery built: {} roads, {} route elements, {} connections",
            roads.len(),
            network.vertex_count(),
            network.edge_count()
        );
        Ok(Scenery {
            roads,
            network,
            weights,
            objects: Vec::new(),
            placements: Vec::new(),
            index: ObjectIndex::default(),
        })
    }
}

// ── Scenery ───────────────────────────────────────────────────────────────────

/// Straight roads plus objects.  Each object lies on a single road.
pub struct Scenery {
    roads:      FxHashMap<String, RoadSpec>,
    network:    RoadGraph,
    weights:    FxHashMap<(RouteElement, RouteElement), f64>,
    /// Indexed by `ObjectId`.
    objects:    Vec<WorldObject>,
    placements: Vec<ObjectPlacement>,
    index:      ObjectIndex,
}

impl Scenery {
    pub fn builder() -> SceneryBuilder {
        SceneryBuilder::new()
    }

    pub fn road(&self, id: &str) -> Option<&RoadSpec> {
        self.roads.get(id)
    }

    pub fn placement(&self, id: ObjectId) -> Option<&ObjectPlacement> {
        self.placements.get(id.index())
    }

    /// Add an object; ids are handed out in placement order.
    pub fn place(&mut self, placement: ObjectPlacement) -> SceneryResult<ObjectId> {
        let id = ObjectId(self.objects.len() as u32);
        let object = self.locate(id, &placement)?;
        trace!("placed {} '{}' on {}:{} at s = {}", id, object.name, placement.road, placement.lane, placement.s);
        self.index.insert(&object);
        self.objects.push(object);
        self.placements.push(placement);
        Ok(id)
    }

    /// Move an object, keeping its dimensions and motion.
    pub fn relocate(&mut self, id: ObjectId, road: &str, lane: LaneId, s: f64) -> SceneryResult<()> {
        let mut placement = self.placement(id).cloned().ok_or(SceneryError::UnknownObject(id))?;
        placement.road = road.to_string();
        placement.lane = lane;
        placement.s = s;
        self.replace(id, placement)
    }

    pub fn set_speed(&mut self, id: ObjectId, speed: f64) -> SceneryResult<()> {
        let mut placement = self.placement(id).cloned().ok_or(SceneryError::UnknownObject(id))?;
        placement.speed = speed;
        self.replace(id, placement)
    }

    /// Move every agent along its lane for `dt` seconds.  Objects leave a
    /// road through its first successor; an object with nowhere to go stops
    /// at the road end.  Returns the ids of objects that stopped that way.
    pub fn advance(&mut self, dt: f64) -> SceneryResult<Vec<ObjectId>> {
        let mut stranded = Vec::new();
        for i in 0..self.placements.len() {
            let mut placement = self.placements[i].clone();
            if !placement.category.is_agent() || (placement.speed == 0.0 && placement.acceleration == 0.0) {
                continue;
            }
            let distance = (placement.speed * dt + 0.5 * placement.acceleration * dt * dt).max(0.0);
            let (road, lane, s, blocked) = self.follow_lane(&placement.road, placement.lane, placement.s, distance);
            placement.road = road;
            placement.lane = lane;
            placement.s = s;
            placement.speed = if blocked { 0.0 } else { (placement.speed + placement.acceleration * dt).max(0.0) };
            let id = ObjectId(i as u32);
            if blocked {
                debug!("object {id} reached the end of {}:{lane}", placement.road);
                stranded.push(id);
            }
            self.replace(id, placement)?;
        }
        Ok(stranded)
    }

    fn replace(&mut self, id: ObjectId, placement: ObjectPlacement) -> SceneryResult<()> {
        let object = self.locate(id, &placement)?;
        let slot = self.objects.get_mut(id.index()).ok_or(SceneryError::UnknownObject(id))?;
        self.index.remove(slot);
        *slot = object;
        self.index.insert(slot);
        self.placements[id.index()] = placement;
        Ok(())
    }

    /// Drive `distance` metres along `lane`, crossing into successor roads.
    /// The flag is set when the lane ran out first.
    fn follow_lane(&self, road: &str, lane: LaneId, s: f64, distance: f64) -> (String, LaneId, f64, bool) {
        let (mut road, mut lane, mut s, mut distance) = (road.to_string(), lane, s, distance);
        loop {
            let Some(spec) = self.roads.get(&road) else {
                return (road, lane, s, true);
            };
            let forward = lane < 0;
            let along = if forward { s } else { spec.length - s } + distance;
            if along <= spec.length {
                let s = if forward { along } else { spec.length - along };
                return (road, lane, s, false);
            }
            let end = if forward { spec.length } else { 0.0 };

            let element = RouteElement::for_lane(road.as_str(), lane);
            let next = self
                .network
                .vertex_of(&element)
                .and_then(|v| self.network.successors(v).next())
                .map(|v| self.network.element(v).clone());
            let Some(next) = next else {
                return (road, lane, end, true);
            };
            let next_lane = if next.in_forward_direction == element.in_forward_direction { lane } else { -lane };
            let Some(next_spec) = self.roads.get(&next.road_id) else {
                return (road, lane, end, true);
            };
            let entry = if next.in_forward_direction { 0.0 } else { next_spec.length };
            if next_spec.lane_at(next_lane, entry).is_none() {
                return (road, lane, end, true);
            }
            distance = along - spec.length;
            road = next.road_id;
            lane = next_lane;
            s = entry;
        }
    }

    /// Road-relative position and kinematics for a placement.
    fn locate(&self, id: ObjectId, p: &ObjectPlacement) -> SceneryResult<WorldObject> {
        let road = self.roads.get(&p.road).ok_or_else(|| SceneryError::UnknownRoad(p.road.clone()))?;
        let unknown_lane = || SceneryError::UnknownLane { road: p.road.clone(), lane: p.lane, s: p.s };
        if !(0.0..=road.length).contains(&p.s) {
            return Err(unknown_lane());
        }
        let (lane_right, lane_left) = road.lane_bounds(p.lane, p.s).ok_or_else(unknown_lane)?;

        let forward = p.lane < 0;
        let sign = if forward { 1.0 } else { -1.0 };
        let centre = 0.5 * (lane_right + lane_left);
        let t = centre + sign * p.t;
        let hdg = normalize_angle(if forward { p.hdg } else { p.hdg + PI });
        let (sin_h, cos_h) = hdg.sin_cos();

        let d = &p.dimensions;
        let clip = |s: f64| s.clamp(0.0, road.length);
        let front_s = p.s + d.front_length() * cos_h;
        let rear_s = p.s - d.rear_length() * cos_h;
        let half = 0.5 * (d.width * cos_h.abs() + d.length * sin_h.abs());

        let mut lanes = road.lanes_overlapping(p.s, t - half, t + half);
        if lanes.is_empty() {
            lanes.push(p.lane);
        }
        let (outer_right, outer_left) = lanes
            .iter()
            .filter_map(|&l| road.lane_bounds(l, p.s))
            .fold((lane_right, lane_left), |(r, l), (lr, ll)| (r.min(lr), l.max(ll)));
        let to_left = outer_left - (t + half);
        let to_right = (t - half) - outer_right;
        let remainder = if forward {
            Remainder { left: to_left, right: to_right }
        } else {
            Remainder { left: to_right, right: to_left }
        };

        let mut position = ObjectPosition::default();
        position.reference_point.insert(
            road.id.clone(),
            RoadPosition { lane_id: p.lane, s: p.s, t: t - centre, hdg },
        );
        let front_t = t + d.front_length() * sin_h;
        position.main_locate_point.insert(
            road.id.clone(),
            RoadPosition { lane_id: p.lane, s: clip(front_s), t: front_t - centre, hdg },
        );
        position.touched_roads.insert(
            road.id.clone(),
            RoadInterval {
                s_start: clip(front_s.min(rear_s)),
                s_end: clip(front_s.max(rear_s)),
                lanes,
                remainder,
            },
        );

        let (x, y) = road.point(p.s, t);
        let yaw = normalize_angle(road.heading + hdg);
        let kinematics = Kinematics {
            x,
            y,
            yaw,
            yaw_rate: p.yaw_rate,
            yaw_acceleration: 0.0,
            velocity_x: p.speed * yaw.cos(),
            velocity_y: p.speed * yaw.sin(),
            acceleration: p.acceleration,
        };

        Ok(WorldObject {
            id,
            name: p.name.clone(),
            category: p.category,
            kinematics,
            dimensions: *d,
            position,
        })
    }
}

// ── WorldQuery ────────────────────────────────────────────────────────────────

impl WorldQuery for Scenery {
    fn objects(&self) -> &[WorldObject] {
        &self.objects
    }

    fn object(&self, id: ObjectId) -> Option<&WorldObject> {
        self.objects.get(id.index())
    }

    fn network(&self) -> &RoadGraph {
        &self.network
    }

    /// Weights from [`SceneryBuilder::connect_weighted`], matched on the
    /// elements at either end of each tree edge.
    fn edge_weights(&self, tree: &RoadGraph) -> EdgeWeights {
        (0..tree.edge_count() as u32)
            .map(tq_core::EdgeId)
            .map(|e| {
                let key = (tree.element(tree.source(e)).clone(), tree.element(tree.target(e)).clone());
                (e, self.weights.get(&key).copied().unwrap_or(1.0))
            })
            .collect()
    }

    fn road_length(&self, road: &str) -> Option<f64> {
        self.roads.get(road).map(|r| r.length)
    }

    fn lane_sections(&self, road: &str) -> Vec<LaneSection> {
        self.roads.get(road).map(RoadSpec::lane_sections).unwrap_or_default()
    }

    fn lane_type(&self, road: &str, lane: LaneId, s: f64) -> Option<LaneType> {
        let spec = self.roads.get(road)?;
        if !(0.0..=spec.length).contains(&s) {
            return None;
        }
        spec.lane_at(lane, s).map(|l| l.lane_type)
    }

    fn lane_width(&self, road: &str, lane: LaneId, s: f64) -> f64 {
        self.roads.get(road).and_then(|r| r.lane_at(lane, s)).map_or(0.0, |l| l.width)
    }

    fn lane_curvature(&self, road: &str, lane: LaneId, s: f64) -> f64 {
        match self.roads.get(road) {
            Some(r) if r.lane_at(lane, s).is_some() => r.curvature,
            _ => 0.0,
        }
    }

    fn lane_center_t(&self, road: &str, lane: LaneId, s: f64) -> f64 {
        self.roads.get(road).and_then(|r| r.lane_center_t(lane, s)).unwrap_or(0.0)
    }

    fn lane_to_world(&self, road: &str, lane: LaneId, s: f64, t: f64) -> Option<Pose> {
        let spec = self.roads.get(road)?;
        if !(0.0..=spec.length).contains(&s) {
            return None;
        }
        let centre = spec.lane_center_t(lane, s)?;
        let (forward_t, yaw) = if lane < 0 {
            (centre + t, spec.heading)
        } else {
            (centre - t, spec.heading + PI)
        };
        let (x, y) = spec.point(s, forward_t);
        Some(Pose { x, y, yaw: normalize_angle(yaw) })
    }

    fn objects_on_lane(&self, road: &str, lane: LaneId, s_start: f64, s_end: f64) -> Vec<ObjectId> {
        self.index.query(road, lane, s_start, s_end)
    }

    fn intersects_with_object(&self, pose: Pose, dimensions: &Dimensions, ignore: Option<ObjectId>) -> bool {
        let candidate = TtcParameters {
            length: dimensions.length,
            width: dimensions.width,
            front_length: dimensions.front_length(),
            back_length: dimensions.rear_length(),
            x: pose.x,
            y: pose.y,
            yaw: pose.yaw,
            ..Default::default()
        }
        .bounding_box();
        self.objects
            .iter()
            .filter(|o| Some(o.id) != ignore)
            .any(|o| TtcParameters::from_object(o, 0.0, 0.0).bounding_box().intersects(&candidate))
    }
}
