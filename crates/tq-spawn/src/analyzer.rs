//! Where a new vehicle may appear, and how fast.
//!
//! A spawn attempt runs five stages, each a pure function of world queries:
//!
//! 1. [`valid_lane_spawning_ranges`] cuts the requested `[s_start, s_end]`
//!    around ego and scenario agents.
//! 2. [`next_spawn_position`] places the vehicle behind the nearest
//!    downstream agent, or at the range end if the lane ahead is free.
//! 3. [`spawn_velocity_to_prevent_crashing`] caps the velocity so the
//!    time-to-collision with the vehicle ahead meets the threshold.
//! 4. [`are_spawning_coordinates_valid`] rejects positions the vehicle may
//!    not occupy.
//! 5. [`spawn_will_cause_crash`] abandons spawns that lead to an unavoidable
//!    collision.
//!
//! Positions passed in and returned are road `s` on the spawn road.
//! Internally, distances along a route are taken in route coordinates (see
//! [`tq_road::world`]).  Rejections are logged and returned as `None` or
//! `false`; the caller decides whether to retry.
//!
//! [`valid_lane_spawning_ranges`]: SpawnPointAnalyzer::valid_lane_spawning_ranges
//! [`next_spawn_position`]: SpawnPointAnalyzer::next_spawn_position
//! [`spawn_velocity_to_prevent_crashing`]: SpawnPointAnalyzer::spawn_velocity_to_prevent_crashing
//! [`are_spawning_coordinates_valid`]: SpawnPointAnalyzer::are_spawning_coordinates_valid
//! [`spawn_will_cause_crash`]: SpawnPointAnalyzer::spawn_will_cause_crash

use log::{debug, warn};

use tq_core::{Dimensions, Direction, LaneId, LaneType, ObjectId, RouteElement, UniformSource};
use tq_kinematics::will_crash;
use tq_road::{route_segments, RouteSegment, SampledRoute, WorldQuery};

use crate::{SpawnConfig, SpawnError, SpawnResult};

/// A lane interval a new vehicle may be placed in.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneSpawningRange {
    pub lane_id: LaneId,
    pub s_start: f64,
    pub s_end:   f64,
}

impl LaneSpawningRange {
    pub fn new(lane_id: LaneId, s_start: f64, s_end: f64) -> Self {
        Self { lane_id, s_start, s_end }
    }

    #[inline]
    pub fn bounds(&self) -> (f64, f64) {
        (self.s_start, self.s_end)
    }
}

/// Spawn-point analysis over a borrowed world.
pub struct SpawnPointAnalyzer<'w, W: WorldQuery + ?Sized> {
    world:  &'w W,
    config: SpawnConfig,
}

impl<'w, W: WorldQuery + ?Sized> SpawnPointAnalyzer<'w, W> {
    pub fn new(world: &'w W) -> Self {
        Self { world, config: SpawnConfig::default() }
    }

    pub fn with_config(world: &'w W, config: SpawnConfig) -> SpawnResult<Self> {
        config.validate()?;
        Ok(Self { world, config })
    }

    #[inline]
    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    // ── Route and road checks ─────────────────────────────────────────────

    /// Whether `road` is driven in the direction of `lane` and the lane has
    /// one of `lane_types` at `s`.
    pub fn validate_road_id_in_direction(
        &self,
        road:       &str,
        lane:       LaneId,
        s:          f64,
        lane_types: &[LaneType],
    ) -> bool {
        if !self.world.is_directional_road_existing(road, lane < 0) {
            warn!("invalid spawn information: road {road} does not exist for lane {lane}, ignored");
            return false;
        }
        self.world.is_lane_type_valid(road, lane, s, lane_types)
    }

    /// Route tree from `(road, lane direction)` with a target drawn by edge
    /// weight.
    pub fn sample_route<R: UniformSource + ?Sized>(
        &self,
        road: &str,
        lane: LaneId,
        rng:  &mut R,
    ) -> SpawnResult<SampledRoute> {
        let element = RouteElement::for_lane(road, lane);
        let view = self
            .world
            .road_graph(&element, self.config.max_road_graph_depth)
            .ok_or(SpawnError::UnknownRouteElement(element))?;
        let weights = self.world.edge_weights(&view.tree);
        Ok(SampledRoute::sample(view, &weights, rng)?)
    }

    // ── Stage 1: valid ranges ─────────────────────────────────────────────

    /// Sub-ranges of `[s_start, s_end]` on each of `valid_lanes` that are not
    /// blocked by ego or scenario agents.
    ///
    /// Lane sections are visited from the end of the road backwards, so the
    /// ranges furthest downstream come first.
    pub fn valid_lane_spawning_ranges(
        &self,
        road:        &str,
        s_start:     f64,
        s_end:       f64,
        valid_lanes: &[LaneId],
        lane_types:  &[LaneType],
    ) -> Vec<LaneSpawningRange> {
        let mut ranges = Vec::new();
        let mut sections = self.world.lane_sections(road);
        sections.reverse();

        for section in &sections {
            if section.start_s > s_end || section.end_s < s_start {
                continue;
            }
            let start = s_start.max(section.start_s);
            let end = s_end.min(section.end_s);

            for &lane in &section.lane_ids {
                if !valid_lanes.contains(&lane) {
                    continue;
                }
                if !self.validate_road_id_in_direction(road, lane, start, lane_types) {
                    continue;
                }
                match self.privileged_extent(road, lane, start) {
                    None => ranges.push(LaneSpawningRange::new(lane, start, end)),
                    Some((rear, front)) => ranges.extend(Self::valid_spawning_ranges_for_range(
                        lane,
                        start,
                        end,
                        rear - self.config.epsilon,
                        front + self.config.epsilon,
                    )),
                }
            }
        }
        ranges
    }

    /// `[s_start, s_end]` minus the span between the first and the last
    /// privileged agent.
    ///
    /// Empty when the agents surround the range, the whole range when both
    /// lie on the same side of it, otherwise the part before the first
    /// and/or after the last agent.
    pub fn valid_spawning_ranges_for_range(
        lane:          LaneId,
        s_start:       f64,
        s_end:         f64,
        first_agent_s: f64,
        last_agent_s:  f64,
    ) -> Vec<LaneSpawningRange> {
        if first_agent_s < s_start && last_agent_s > s_end {
            return Vec::new();
        }
        if (first_agent_s < s_start && last_agent_s < s_start)
            || (first_agent_s > s_end && last_agent_s > s_end)
        {
            return vec![LaneSpawningRange::new(lane, s_start, s_end)];
        }

        let inside = |s: f64| s_start < s && s < s_end;
        let mut ranges = Vec::with_capacity(2);
        if inside(first_agent_s) {
            ranges.push(LaneSpawningRange::new(lane, s_start, first_agent_s));
        }
        if inside(last_agent_s) {
            ranges.push(LaneSpawningRange::new(lane, last_agent_s, s_end));
        }
        ranges
    }

    /// Road interval from the rearmost to the foremost ego/scenario agent on
    /// `lane` of `road`.
    fn privileged_extent(&self, road: &str, lane: LaneId, s: f64) -> Option<(f64, f64)> {
        let view = self.world.road_graph(&RouteElement::for_lane(road, lane), 0)?;
        let found = self
            .world
            .agents_in_range(&view.tree, view.root, lane, s, f64::INFINITY, f64::INFINITY);

        found
            .get(&view.root)
            .into_iter()
            .flatten()
            .filter_map(|&id| self.world.object(id))
            .filter(|o| o.category.is_privileged())
            .filter_map(|o| o.position.touched_roads.get(road))
            .fold(None, |extent, touched| {
                Some(match extent {
                    Some((rear, front)) => (touched.s_start.min(rear), touched.s_end.max(front)),
                    None => (touched.s_start, touched.s_end),
                })
            })
    }

    // ── Stage 2: position ─────────────────────────────────────────────────

    /// Reference-point `s` for a new vehicle in `bounds`, or `None` if it
    /// does not fit.
    ///
    /// With no agent within `v * gap` of the range end, the vehicle's front
    /// is put at the range end, pulled back so that `v * ttc_end_of_lane`
    /// of lane remain.  Otherwise it is put [`SpawnConfig::separation`]
    /// behind the rear of the nearest agent.
    #[allow(clippy::too_many_arguments)]
    pub fn next_spawn_position(
        &self,
        road:       &str,
        lane:       LaneId,
        bounds:     (f64, f64),
        dimensions: &Dimensions,
        velocity:   f64,
        gap_secs:   f64,
        route:      &SampledRoute,
        lane_types: &[LaneType],
    ) -> Option<f64> {
        let start = self.start_segment(route)?;
        let (low, high) = start.route_interval(bounds.0, bounds.1);
        let front_length = dimensions.front_length();
        let max_search = high + velocity * gap_secs;

        let first_ahead = self
            .world
            .agents_in_range(&route.view.tree, route.root(), lane, start.to_road(low), 0.0, max_search - low)
            .remove(&route.target)
            .and_then(|ids| ids.into_iter().next())
            .and_then(|id| Some((id, self.route_interval(route, id)?)));

        let spawn = match first_ahead {
            Some((id, (rear, _))) if rear <= max_search => {
                let object = self.world.object(id)?;
                let considered = object.dimensions.rear_length() + front_length;
                rear - self.config.separation(gap_secs, velocity, considered)
            }
            _ => {
                let to_end = self
                    .world
                    .distance_to_end_of_lane(
                        &route.view.tree,
                        route.root(),
                        lane,
                        start.to_road(high - self.config.epsilon),
                        f64::INFINITY,
                        lane_types,
                    )
                    .get(&route.target)
                    .copied()
                    .unwrap_or(f64::INFINITY);
                let required = velocity * self.config.ttc_end_of_lane;
                let shortfall = (required - to_end).max(0.0);
                high - front_length - shortfall
            }
        };

        if spawn - dimensions.rear_length() < low {
            debug!("no spawn position on {road}:{lane} within [{}, {}]", bounds.0, bounds.1);
            return None;
        }
        Some(start.to_road(spawn))
    }

    // ── Stage 3: velocity ─────────────────────────────────────────────────

    /// `velocity`, or less if the vehicle would close in on the agent ahead
    /// faster than the TTC threshold allows.
    ///
    /// The capped value `v_opp + distance / ttc_threshold` makes the
    /// threshold hold exactly.
    pub fn spawn_velocity_to_prevent_crashing(
        &self,
        lane:       LaneId,
        s:          f64,
        dimensions: &Dimensions,
        velocity:   f64,
        route:      &SampledRoute,
    ) -> f64 {
        let Some(start) = self.start_segment(route) else {
            return velocity;
        };
        let position = start.to_route(s);
        let front = position + dimensions.front_length();
        let search_ahead = front + velocity * self.config.ttc_threshold - position;

        let opponent = self
            .world
            .agents_in_range(&route.view.tree, route.root(), lane, s, dimensions.rear_length(), search_ahead)
            .remove(&route.target)
            .and_then(|ids| ids.into_iter().next());
        let Some(id) = opponent else {
            return velocity;
        };
        let (Some(object), Some((opponent_rear, _))) = (self.world.object(id), self.route_interval(route, id)) else {
            return velocity;
        };

        let opponent_velocity = object.absolute_velocity();
        let relative_velocity = velocity - opponent_velocity;
        if relative_velocity <= 0.0 {
            return velocity;
        }
        let relative_distance = opponent_rear - front;
        if relative_distance / relative_velocity < self.config.ttc_threshold {
            let capped = opponent_velocity + relative_distance / self.config.ttc_threshold;
            debug!("spawn velocity on lane {lane} capped from {velocity} to {capped}");
            return capped;
        }
        velocity
    }

    // ── Stage 4: coordinates ──────────────────────────────────────────────

    /// Whether a vehicle may be placed at `(s, offset)` on `lane`.
    ///
    /// Rejects lanes left of the reference line, positions off the lane,
    /// offsets that put the vehicle mostly onto another lane or onto a
    /// missing neighbour, an agent inside the minimum distance, and
    /// positions where the vehicle's front would overhang the lane's end.
    pub fn are_spawning_coordinates_valid(
        &self,
        road:       &str,
        lane:       LaneId,
        s:          f64,
        offset:     f64,
        route:      &SampledRoute,
        dimensions: &Dimensions,
    ) -> bool {
        if lane >= 0 {
            debug!("spawning on left lane {lane} of {road} is not supported");
            return false;
        }
        if !self.world.is_s_valid_on_lane(road, lane, s) {
            debug!("s {s} is not valid on {road}:{lane}");
            return false;
        }
        if !self.is_offset_valid_for_lane(road, lane, s, offset, dimensions.width) {
            debug!("offset {offset} is not valid on {road}:{lane}");
            return false;
        }
        if !self.valid_minimum_spawning_distance_to_object_in_front(lane, s, route, dimensions) {
            debug!("minimum distance to the next agent not met on {road}:{lane}");
            return false;
        }
        let lane_type: Vec<LaneType> = self.world.lane_type(road, lane, s).into_iter().collect();
        let to_end = self
            .world
            .distance_to_end_of_lane(&route.view.tree, route.root(), lane, s, f64::INFINITY, &lane_type)
            .get(&route.target)
            .copied()
            .unwrap_or(0.0);
        if to_end < dimensions.front_length() {
            debug!("{road}:{lane} ends {to_end} m ahead of s {s}");
            return false;
        }
        true
    }

    /// Whether a vehicle of `vehicle_width` at `offset` from the lane centre
    /// stays at least half on `lane` and any overhang lands on an existing
    /// neighbour.
    pub fn is_offset_valid_for_lane(
        &self,
        road:          &str,
        lane:          LaneId,
        s:             f64,
        offset:        f64,
        vehicle_width: f64,
    ) -> bool {
        if !self.world.is_s_valid_on_lane(road, lane, s) {
            return false;
        }
        let lane_width = self.world.lane_width(road, lane, s);
        if vehicle_width > lane_width + offset.abs() {
            debug!("{road}:{lane} is {lane_width} m wide, vehicle {vehicle_width} m");
            return false;
        }
        if (lane_width - vehicle_width) * 0.5 >= offset.abs() {
            return true;
        }
        if offset.abs() > lane_width * 0.5 {
            return false;
        }
        let neighbour = if offset >= 0.0 { lane + 1 } else { lane - 1 };
        self.world.is_s_valid_on_lane(road, neighbour, s)
    }

    /// No agent within the vehicle's rear length behind `s`, nor within its
    /// front length plus the separation buffer ahead.
    pub fn valid_minimum_spawning_distance_to_object_in_front(
        &self,
        lane:       LaneId,
        s:          f64,
        route:      &SampledRoute,
        dimensions: &Dimensions,
    ) -> bool {
        let ahead = dimensions.front_length() + self.config.minimum_separation_buffer;
        self.world
            .agents_in_range(&route.view.tree, route.root(), lane, s, dimensions.rear_length(), ahead)
            .get(&route.target)
            .is_none_or(|ids| ids.is_empty())
    }

    /// Whether the box of a new vehicle at `(s, offset)` overlaps an
    /// existing object.  A position the world cannot resolve counts as
    /// overlapping.
    pub fn new_agent_intersects_with_existing_agent(
        &self,
        road:       &str,
        lane:       LaneId,
        s:          f64,
        offset:     f64,
        dimensions: &Dimensions,
    ) -> bool {
        match self.world.lane_to_world(road, lane, s, offset) {
            Some(pose) => self.world.intersects_with_object(pose, dimensions, None),
            None => true,
        }
    }

    /// Driving lanes right of `lane` at `s`, in its driving direction.
    pub fn right_lane_count(&self, road: &str, lane: LaneId, s: f64) -> usize {
        let sections = self.world.lane_sections(road);
        let Some(section) = sections.iter().find(|sec| sec.contains_s(s)) else {
            return 0;
        };
        section
            .lane_ids
            .iter()
            .filter(|&&id| id.signum() == lane.signum() && id.abs() > lane.abs())
            .filter(|&&id| self.world.lane_type(road, id, s) == Some(LaneType::Driving))
            .count()
    }

    // ── Stage 5: crash check ──────────────────────────────────────────────

    /// Whether a vehicle spawned at `s` with `velocity` will hit the nearest
    /// object in `direction` even if both brake as assumed.
    ///
    /// Searching forward, the new vehicle is the rear one; searching
    /// backward, the object behind it is.
    pub fn spawn_will_cause_crash(
        &self,
        lane:       LaneId,
        s:          f64,
        dimensions: &Dimensions,
        velocity:   f64,
        direction:  Direction,
        route:      &SampledRoute,
    ) -> bool {
        let Some(start) = self.start_segment(route) else {
            return false;
        };
        let forward = direction == Direction::Forward;
        let (behind, ahead) = if forward { (0.0, f64::INFINITY) } else { (f64::INFINITY, 0.0) };
        let Some(ids) = self
            .world
            .objects_in_range(&route.view.tree, route.root(), lane, s, behind, ahead)
            .remove(&route.target)
        else {
            return false;
        };
        let opponent = if forward { ids.first() } else { ids.last() };
        let Some(&id) = opponent else {
            return false;
        };
        let (Some(object), Some((opponent_rear, opponent_front))) =
            (self.world.object(id), self.route_interval(route, id))
        else {
            return false;
        };

        let position = start.to_route(s);
        let opponent_velocity = object.absolute_velocity();
        let (gap, v_rear, v_front) = if forward {
            (opponent_rear - (position + dimensions.front_length()), velocity, opponent_velocity)
        } else {
            ((position - dimensions.rear_length()) - opponent_front, opponent_velocity, velocity)
        };

        let crash = will_crash(
            gap,
            v_rear,
            self.config.assumed_braking_acceleration,
            v_front,
            self.config.assumed_front_acceleration,
            self.config.assumed_time_to_brake,
        );
        if crash {
            debug!("spawn at s {s} on lane {lane} would crash into object {id}");
        }
        crash
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    /// The spawn road as the first segment of the sampled path.
    fn start_segment(&self, route: &SampledRoute) -> Option<RouteSegment> {
        route_segments(self.world, &route.view.tree, route.root(), route.target)
            .into_iter()
            .next()
    }

    fn route_interval(&self, route: &SampledRoute, id: ObjectId) -> Option<(f64, f64)> {
        self.world
            .object_route_interval(&route.view.tree, route.root(), id)
            .remove(&route.target)
            .flatten()
    }
}
