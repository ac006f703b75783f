//! One agent's route state and the queries it answers along that route.
//!
//! # States
//!
//! ```text
//!  Initial ──set_road_graph──▶ Valid ──update (left the way)──▶ Invalid
//!                               ▲                                  │
//!                               └──────────set_road_graph──────────┘
//! ```
//!
//! While `Valid` the agent tracks `current`, the tree vertex it occupies,
//! and the *way to target*: the path from where the graph was installed to
//! the chosen leaf.  `update` advances `current` one vertex along the way
//! whenever the agent's front leaves the current road.

use std::f64::consts::PI;

use log::debug;

use tq_core::{
    Direction, LaneId, LaneType, MeasurementPoint, ObjectId, RoadPosition, RouteElement, Side, VertexId,
    WorldObject,
};
use tq_road::{
    leaves_below, reconstruct_path, LongitudinalDistance, Obstruction, RoadError, RouteQueryResult,
    RoutePath, RouteView, WorldQuery,
};

use crate::{EgoError, EgoResult};

/// Where an agent's route state machine stands.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RouteStatus {
    /// No graph installed yet.
    Initial,
    Valid,
    /// The agent left its route; only `set_road_graph` recovers.
    Invalid,
}

#[derive(Clone, Debug)]
struct Route {
    view:         RouteView,
    current:      VertexId,
    way:          RoutePath,
    /// `way` as a single-branch tree, for route queries along it.
    way_view:     RouteView,
    /// Index of `current` in `way`.
    cursor:       usize,
    alternatives: Vec<VertexId>,
    valid:        bool,
}

impl Route {
    #[inline]
    fn current_element(&self) -> &RouteElement {
        self.view.tree.element(self.current)
    }

    #[inline]
    fn way_start(&self) -> VertexId {
        VertexId(self.cursor as u32)
    }

    fn way_to(&self, target: VertexId) -> Option<RoutePath> {
        let way = reconstruct_path(&self.view.tree, self.current, target);
        if way.is_none() {
            debug!("target {target} is not reachable from {}", self.current);
        }
        way
    }

    fn follow(&mut self, way: RoutePath) {
        self.way_view = RouteView::linear(&way.elements);
        self.way = way;
        self.cursor = 0;
    }

    /// Follow the agent's front onto the next road of the way.
    fn update_position(&mut self, front_roads: &[String]) {
        if !self.valid || front_roads.contains(&self.current_element().road_id) {
            return;
        }
        let Some(next) = self.way.elements.get(self.cursor + 1) else {
            debug!("agent left {} with no road left on its way", self.current_element());
            self.valid = false;
            return;
        };
        if !front_roads.contains(&next.road_id) {
            debug!("agent is on none of {:?}, expected {next}", front_roads);
            self.valid = false;
            return;
        }
        let tree = &self.view.tree;
        match tree.successors(self.current).find(|&v| tree.element(v) == next) {
            Some(successor) => {
                self.current = successor;
                self.cursor += 1;
                self.alternatives = leaves_below(tree, successor);
            }
            None => self.valid = false,
        }
    }
}

/// Route-aware view of one agent.
///
/// The agent itself lives in the world; every query takes the world by
/// shared reference so the agent's position is read fresh.
#[derive(Clone, Debug)]
pub struct EgoAgent {
    agent_id:    ObjectId,
    route:       Option<Route>,
    main_locate: Option<RoadPosition>,
}

impl EgoAgent {
    pub fn new(agent_id: ObjectId) -> Self {
        Self { agent_id, route: None, main_locate: None }
    }

    #[inline]
    pub fn agent_id(&self) -> ObjectId {
        self.agent_id
    }

    pub fn agent<'w, W: WorldQuery + ?Sized>(&self, world: &'w W) -> EgoResult<&'w WorldObject> {
        world.object(self.agent_id).ok_or(EgoError::AgentNotFound(self.agent_id))
    }

    // ── Route state ───────────────────────────────────────────────────────

    /// Install a route tree, the vertex the agent occupies and the leaf it
    /// heads for.  The alternatives are the leaves below `current`; a target
    /// outside them leaves the route invalid.
    pub fn set_road_graph<W: WorldQuery + ?Sized>(
        &mut self,
        world:   &W,
        view:    RouteView,
        current: VertexId,
        target:  VertexId,
    ) -> EgoResult<()> {
        for v in [current, target] {
            if !view.tree.contains(v) {
                return Err(RoadError::UnknownVertex(v).into());
            }
        }
        let alternatives = leaves_below(&view.tree, current);
        let mut route = Route {
            view,
            current,
            way: RoutePath { vertices: Vec::new(), elements: Vec::new() },
            way_view: RouteView::linear(&[]),
            cursor: 0,
            alternatives,
            valid: true,
        };
        match route.way_to(target) {
            Some(way) => route.follow(way),
            None => route.valid = false,
        }
        self.route = Some(route);
        self.update(world);
        Ok(())
    }

    /// Re-derive the agent's place in its route from its current position.
    /// Call once per step.
    pub fn update<W: WorldQuery + ?Sized>(&mut self, world: &W) {
        let Some(route) = self.route.as_mut() else {
            return;
        };
        let object = world.object(self.agent_id);
        let front_roads = object.map(|o| o.roads(MeasurementPoint::Front));
        route.update_position(front_roads.as_deref().unwrap_or_default());
        self.main_locate = if route.valid {
            let road = &route.current_element().road_id;
            object.and_then(|o| o.position.main_locate_point.get(road)).copied()
        } else {
            None
        };
    }

    pub fn status(&self) -> RouteStatus {
        match &self.route {
            None => RouteStatus::Initial,
            Some(route) if route.valid => RouteStatus::Valid,
            Some(_) => RouteStatus::Invalid,
        }
    }

    #[inline]
    pub fn has_valid_route(&self) -> bool {
        self.status() == RouteStatus::Valid
    }

    /// Head for another leaf of the installed tree, chosen by its index in
    /// [`alternatives`](Self::alternatives).  On error the current way is
    /// kept.
    pub fn set_new_target(&mut self, alternative: usize) -> EgoResult<()> {
        let route = self.route_mut()?;
        let target = *route.alternatives.get(alternative).ok_or(EgoError::AlternativeOutOfRange {
            index: alternative,
            len:   route.alternatives.len(),
        })?;
        let way = route.way_to(target).ok_or(EgoError::UnreachableTarget(target))?;
        route.follow(way);
        Ok(())
    }

    fn route(&self) -> EgoResult<&Route> {
        match &self.route {
            None => Err(EgoError::NoRoute),
            Some(route) if route.valid => Ok(route),
            Some(_) => Err(EgoError::InvalidRoute),
        }
    }

    fn route_mut(&mut self) -> EgoResult<&mut Route> {
        match &mut self.route {
            None => Err(EgoError::NoRoute),
            Some(route) if route.valid => Ok(route),
            Some(_) => Err(EgoError::InvalidRoute),
        }
    }

    pub fn road_id(&self) -> EgoResult<&str> {
        Ok(&self.route()?.current_element().road_id)
    }

    pub fn current_element(&self) -> EgoResult<&RouteElement> {
        Ok(self.route()?.current_element())
    }

    pub fn current_vertex(&self) -> EgoResult<VertexId> {
        Ok(self.route()?.current)
    }

    pub fn route_view(&self) -> EgoResult<&RouteView> {
        Ok(&self.route()?.view)
    }

    /// Leaves still reachable from `current`, in tree order.
    pub fn alternatives(&self) -> EgoResult<&[VertexId]> {
        Ok(&self.route()?.alternatives)
    }

    pub fn way_to_target(&self) -> EgoResult<&RoutePath> {
        Ok(&self.route()?.way)
    }

    /// The road `steps` roads back along the way, if the way reaches back
    /// that far.
    pub fn previous_road(&self, steps: usize) -> EgoResult<Option<&RouteElement>> {
        let route = self.route()?;
        Ok(route.cursor.checked_sub(steps).map(|i| &route.way.elements[i]))
    }

    // ── Position ──────────────────────────────────────────────────────────

    /// The front-centre position on the current road.
    pub fn main_locate_position(&self) -> EgoResult<&RoadPosition> {
        let road = self.road_id()?;
        self.main_locate.as_ref().ok_or_else(|| EgoError::NotOnRoad(road.to_string()))
    }

    /// The reference point on the current road, or failing that on the
    /// nearest previous road of the way.
    pub fn reference_point_position<W: WorldQuery + ?Sized>(&self, world: &W) -> EgoResult<Option<RoadPosition>> {
        let route = self.route()?;
        let reference = &self.agent(world)?.position.reference_point;
        Ok(route.way.elements[..=route.cursor]
            .iter()
            .rev()
            .find_map(|element| reference.get(&element.road_id))
            .copied())
    }

    /// Absolute lane id of a lane given relative to the agent's lane
    /// (positive to the left in driving direction, lane `0` skipped).
    pub fn lane_id_from_relative(&self, relative: LaneId) -> EgoResult<LaneId> {
        let main = self.main_locate_position()?.lane_id;
        Ok(if self.current_element()?.in_forward_direction {
            main + relative + if relative >= -main { 1 } else { 0 }
        } else {
            main - relative + if relative >= main { -1 } else { 0 }
        })
    }

    pub fn direction(&self) -> EgoResult<Direction> {
        Ok(if self.current_element()?.in_forward_direction { Direction::Forward } else { Direction::Backward })
    }

    /// Heading relative to the driving direction of the current lane.
    pub fn relative_yaw(&self) -> EgoResult<f64> {
        let hdg = self.main_locate_position()?.hdg;
        Ok(match self.direction()? {
            Direction::Forward => hdg,
            Direction::Backward => (hdg + 2.0 * PI) % (2.0 * PI) - PI,
        })
    }

    /// Lateral offset from the lane centre, left positive in driving direction.
    pub fn position_lateral(&self) -> EgoResult<f64> {
        let t = self.main_locate_position()?.t;
        Ok(match self.direction()? {
            Direction::Forward => t,
            Direction::Backward => -t,
        })
    }

    pub fn lane_remainder<W: WorldQuery + ?Sized>(&self, world: &W, side: Side) -> EgoResult<f64> {
        let road = self.road_id()?;
        let touched = self
            .agent(world)?
            .position
            .touched_roads
            .get(road)
            .ok_or_else(|| EgoError::NotOnRoad(road.to_string()))?;
        Ok(match side {
            Side::Left => touched.remainder.left,
            Side::Right => touched.remainder.right,
        })
    }

    // ── Lane geometry ─────────────────────────────────────────────────────

    pub fn lane_width<W: WorldQuery + ?Sized>(&self, world: &W, relative_lane: LaneId) -> EgoResult<f64> {
        let s = self.main_locate_position()?.s;
        Ok(world.lane_width(self.road_id()?, self.lane_id_from_relative(relative_lane)?, s))
    }

    pub fn lane_curvature<W: WorldQuery + ?Sized>(&self, world: &W, relative_lane: LaneId) -> EgoResult<f64> {
        let s = self.main_locate_position()?.s;
        Ok(world.lane_curvature(self.road_id()?, self.lane_id_from_relative(relative_lane)?, s))
    }

    /// Width `distance` metres ahead along the way, `None` past its end.
    pub fn lane_width_ahead<W: WorldQuery + ?Sized>(
        &self,
        world:         &W,
        distance:      f64,
        relative_lane: LaneId,
    ) -> EgoResult<Option<f64>> {
        let (lane, s) = self.lane_and_s(relative_lane)?;
        let route = self.route()?;
        let result = world.lane_width_ahead(&route.way_view.tree, route.way_start(), lane, s, distance);
        Ok(single(result)?.flatten())
    }

    pub fn lane_curvature_ahead<W: WorldQuery + ?Sized>(
        &self,
        world:         &W,
        distance:      f64,
        relative_lane: LaneId,
    ) -> EgoResult<Option<f64>> {
        let (lane, s) = self.lane_and_s(relative_lane)?;
        let route = self.route()?;
        let result = world.lane_curvature_ahead(&route.way_view.tree, route.way_start(), lane, s, distance);
        Ok(single(result)?.flatten())
    }

    // ── Along the way to target ───────────────────────────────────────────

    /// Distance to where a drivable lane ends along the way.  Infinity when
    /// it does not end within `range`.
    pub fn distance_to_end_of_lane<W: WorldQuery + ?Sized>(
        &self,
        world:         &W,
        range:         f64,
        relative_lane: LaneId,
    ) -> EgoResult<f64> {
        self.distance_to_end_of_lane_of_types(world, range, relative_lane, &LaneType::DRIVABLE)
    }

    pub fn distance_to_end_of_lane_of_types<W: WorldQuery + ?Sized>(
        &self,
        world:         &W,
        range:         f64,
        relative_lane: LaneId,
        lane_types:    &[LaneType],
    ) -> EgoResult<f64> {
        let (lane, s) = self.lane_and_s(relative_lane)?;
        let route = self.route()?;
        let result = world.distance_to_end_of_lane(&route.way_view.tree, route.way_start(), lane, s, range, lane_types);
        Ok(single(result)?.unwrap_or(f64::INFINITY))
    }

    /// Other objects on a lane within `[s - backward, s + forward]` of the
    /// agent's front, nearest rear first.
    pub fn objects_in_range<W: WorldQuery + ?Sized>(
        &self,
        world:         &W,
        backward:      f64,
        forward:       f64,
        relative_lane: LaneId,
    ) -> EgoResult<Vec<ObjectId>> {
        let (lane, s) = self.lane_and_s(relative_lane)?;
        let route = self.route()?;
        let result = world.objects_in_range(&route.way_view.tree, route.way_start(), lane, s, backward, forward);
        Ok(self.without_self(single(result)?.unwrap_or_default()))
    }

    pub fn agents_in_range<W: WorldQuery + ?Sized>(
        &self,
        world:         &W,
        backward:      f64,
        forward:       f64,
        relative_lane: LaneId,
    ) -> EgoResult<Vec<ObjectId>> {
        let (lane, s) = self.lane_and_s(relative_lane)?;
        let route = self.route()?;
        let result = world.agents_in_range(&route.way_view.tree, route.way_start(), lane, s, backward, forward);
        Ok(self.without_self(single(result)?.unwrap_or_default()))
    }

    /// Longitudinal distance to `other` along the way.
    pub fn distance_to_object<W: WorldQuery + ?Sized>(
        &self,
        world: &W,
        other: ObjectId,
    ) -> EgoResult<LongitudinalDistance> {
        let reference_s = self.reference_point_position(world)?.map(|p| p.s);
        let route = self.route()?;
        let result = world.distance_between_objects(
            &route.way_view.tree,
            route.way_start(),
            self.agent_id,
            reference_s,
            other,
        );
        Ok(single(result)?.unwrap_or_default())
    }

    pub fn obstruction<W: WorldQuery + ?Sized>(&self, world: &W, other: ObjectId) -> EgoResult<Option<Obstruction>> {
        let route = self.route()?;
        let result = world.obstruction(&route.way_view.tree, route.way_start(), self.agent_id, other);
        Ok(single(result)?.flatten())
    }

    // ── Per alternative ───────────────────────────────────────────────────

    /// [`distance_to_end_of_lane`](Self::distance_to_end_of_lane) once per
    /// alternative, in alternative order.
    pub fn query_distance_to_end_of_lane<W: WorldQuery + ?Sized>(
        &self,
        world:         &W,
        range:         f64,
        relative_lane: LaneId,
    ) -> EgoResult<Vec<f64>> {
        let (lane, s) = self.lane_and_s(relative_lane)?;
        let route = self.route()?;
        let result =
            world.distance_to_end_of_lane(&route.view.tree, route.current, lane, s, range, &LaneType::DRIVABLE);
        per_alternative(route, result)
    }

    /// [`objects_in_range`](Self::objects_in_range) once per alternative.
    pub fn query_objects_in_range<W: WorldQuery + ?Sized>(
        &self,
        world:         &W,
        backward:      f64,
        forward:       f64,
        relative_lane: LaneId,
    ) -> EgoResult<Vec<Vec<ObjectId>>> {
        let (lane, s) = self.lane_and_s(relative_lane)?;
        let route = self.route()?;
        let result = world.objects_in_range(&route.view.tree, route.current, lane, s, backward, forward);
        Ok(per_alternative(route, result)?.into_iter().map(|ids| self.without_self(ids)).collect())
    }

    /// [`distance_to_object`](Self::distance_to_object) once per alternative.
    pub fn query_distance_to_object<W: WorldQuery + ?Sized>(
        &self,
        world: &W,
        other: ObjectId,
    ) -> EgoResult<Vec<LongitudinalDistance>> {
        let reference_s = self.reference_point_position(world)?.map(|p| p.s);
        let route = self.route()?;
        let result =
            world.distance_between_objects(&route.view.tree, route.current, self.agent_id, reference_s, other);
        per_alternative(route, result)
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn lane_and_s(&self, relative_lane: LaneId) -> EgoResult<(LaneId, f64)> {
        Ok((self.lane_id_from_relative(relative_lane)?, self.main_locate_position()?.s))
    }

    fn without_self(&self, mut ids: Vec<ObjectId>) -> Vec<ObjectId> {
        ids.retain(|&id| id != self.agent_id);
        ids
    }
}

/// The value for the only leaf of a single-branch view.
fn single<T>(result: RouteQueryResult<T>) -> EgoResult<Option<T>> {
    match result.len() {
        0 | 1 => Ok(result.into_values().next()),
        _ => Err(EgoError::InvalidRoute),
    }
}

fn per_alternative<T>(route: &Route, mut result: RouteQueryResult<T>) -> EgoResult<Vec<T>> {
    route
        .alternatives
        .iter()
        .map(|leaf| result.remove(leaf))
        .collect::<Option<Vec<T>>>()
        .ok_or(EgoError::InvalidRoute)
}
