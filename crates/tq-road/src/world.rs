//! The road-network provider seam.
//!
//! A provider implements the per-road primitives of [`WorldQuery`] (lane
//! layout, geometry, objects on a lane interval).  The route-aware queries
//! are provided methods built on top of them: each walks every root-to-leaf
//! path below a start vertex and returns one result per leaf.
//!
//! # Route coordinates
//!
//! Route-aware queries measure distances in *route coordinates*: metres
//! along the route, in driving direction, from the start of the first road
//! on the path.  A [`RouteSegment`] maps between one road's `s` and route
//! coordinates.  Lane ids are given in the first road's convention and are
//! mirrored on roads driven in the opposite direction.

use std::collections::BTreeMap;

use tq_core::{
    Dimensions, LaneId, LaneSection, LaneType, ObjectId, RouteElement, VertexId, WorldObject,
};

use crate::graph::RoadGraph;
use crate::route_view::{build_route_view, leaves_below, RouteView};
use crate::sampler::{reconstruct_path, EdgeWeights};

/// One value per leaf of the queried subtree.
pub type RouteQueryResult<T> = BTreeMap<VertexId, T>;

// ── Result types ──────────────────────────────────────────────────────────────

/// Longitudinal distance from one object to another along a route.
/// Positive when the other object is ahead.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct LongitudinalDistance {
    /// Gap between the facing bounding-box edges; `0` when they overlap.
    pub net_distance:    Option<f64>,
    /// Distance between the two reference points.
    pub reference_point: Option<f64>,
}

/// Lateral extent of another object relative to an observer, in the
/// observer's driving frame (left positive).
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Obstruction {
    pub left:  f64,
    pub right: f64,
}

impl Obstruction {
    /// Whether the object overlaps a corridor of `half_width` around the
    /// observer.
    pub fn blocks(&self, half_width: f64) -> bool {
        self.right < half_width && self.left > -half_width
    }
}

/// Inertial pose.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct Pose {
    pub x:   f64,
    pub y:   f64,
    pub yaw: f64,
}

// ── Route coordinates ─────────────────────────────────────────────────────────

/// One road on a route path and its place in route coordinates.
#[derive(Clone, PartialEq, Debug)]
pub struct RouteSegment {
    pub element: RouteElement,
    /// Route coordinate where driving on this road begins.
    pub offset:  f64,
    pub length:  f64,
}

impl RouteSegment {
    #[inline]
    pub fn end(&self) -> f64 {
        self.offset + self.length
    }

    /// Road `s` to route coordinate.
    #[inline]
    pub fn to_route(&self, s: f64) -> f64 {
        if self.element.in_forward_direction {
            self.offset + s
        } else {
            self.offset + self.length - s
        }
    }

    /// Route coordinate to road `s`.
    #[inline]
    pub fn to_road(&self, coordinate: f64) -> f64 {
        let along = coordinate - self.offset;
        if self.element.in_forward_direction { along } else { self.length - along }
    }

    #[inline]
    pub fn contains(&self, coordinate: f64) -> bool {
        self.offset <= coordinate && coordinate <= self.end()
    }

    /// A road interval `[s_start, s_end]` as an ordered route interval.
    pub fn route_interval(&self, s_start: f64, s_end: f64) -> (f64, f64) {
        let a = self.to_route(s_start);
        let b = self.to_route(s_end);
        (a.min(b), a.max(b))
    }

    /// `lane` given in `root`'s convention, expressed on this road.
    #[inline]
    pub fn lane_on(&self, root: &RouteElement, lane: LaneId) -> LaneId {
        if self.element.in_forward_direction == root.in_forward_direction { lane } else { -lane }
    }

    /// Lateral offset `t` in driving frame (left positive).
    #[inline]
    pub fn lateral(&self, t: f64) -> f64 {
        if self.element.in_forward_direction { t } else { -t }
    }
}

/// Segments of the path from `start` to `leaf`.  Empty if `leaf` is not
/// below `start`.
pub fn route_segments<W: WorldQuery + ?Sized>(
    world: &W,
    tree:  &RoadGraph,
    start: VertexId,
    leaf:  VertexId,
) -> Vec<RouteSegment> {
    let Some(path) = reconstruct_path(tree, start, leaf) else {
        return Vec::new();
    };
    let mut offset = 0.0;
    path.elements
        .into_iter()
        .map(|element| {
            let length = world.road_length(&element.road_id).unwrap_or(0.0);
            let segment = RouteSegment { element, offset, length };
            offset += length;
            segment
        })
        .collect()
}

fn segment_at(segments: &[RouteSegment], coordinate: f64) -> Option<&RouteSegment> {
    segments.iter().find(|seg| seg.contains(coordinate))
}

// ── WorldQuery ────────────────────────────────────────────────────────────────

/// Read-only view of the road network and the objects on it.
///
/// All queries borrow the world immutably, so nothing can move while a
/// query runs.
pub trait WorldQuery {
    // ── Objects ───────────────────────────────────────────────────────────

    fn objects(&self) -> &[WorldObject];

    fn object(&self, id: ObjectId) -> Option<&WorldObject> {
        self.objects().iter().find(|o| o.id == id)
    }

    fn object_by_name(&self, name: &str) -> Option<&WorldObject> {
        self.objects().iter().find(|o| o.name == name)
    }

    fn agents(&self) -> Vec<&WorldObject> {
        self.objects().iter().filter(|o| o.is_agent()).collect()
    }

    // ── Network ───────────────────────────────────────────────────────────

    /// The full (possibly cyclic) road network.
    fn network(&self) -> &RoadGraph;

    /// Route tree rooted at `start`, or `None` if `start` is not part of the
    /// network.
    fn road_graph(&self, start: &RouteElement, max_depth: usize) -> Option<RouteView> {
        let network = self.network();
        let vertex = network.vertex_of(start)?;
        build_route_view(network, vertex, max_depth)
    }

    /// Branch weights for sampling over `tree`.
    fn edge_weights(&self, tree: &RoadGraph) -> EdgeWeights {
        EdgeWeights::uniform(tree)
    }

    fn is_directional_road_existing(&self, road: &str, in_forward_direction: bool) -> bool {
        self.network()
            .vertex_of(&RouteElement::new(road, in_forward_direction))
            .is_some()
    }

    // ── Per-road primitives ───────────────────────────────────────────────

    fn road_length(&self, road: &str) -> Option<f64>;

    /// Lane sections of `road`, ordered by `start_s`.
    fn lane_sections(&self, road: &str) -> Vec<LaneSection>;

    /// Type of `lane` at `s`, or `None` if the lane does not exist there.
    fn lane_type(&self, road: &str, lane: LaneId, s: f64) -> Option<LaneType>;

    /// Width of `lane` at `s`; `0` if it does not exist.
    fn lane_width(&self, road: &str, lane: LaneId, s: f64) -> f64;

    /// Curvature of `lane` at `s` in road direction; `0` if it does not exist.
    fn lane_curvature(&self, road: &str, lane: LaneId, s: f64) -> f64;

    /// Inertial pose of a lane-relative point (`t` measured from the lane
    /// centre, yaw along the lane's driving direction).
    fn lane_to_world(&self, road: &str, lane: LaneId, s: f64, t: f64) -> Option<Pose>;

    /// Objects whose touched interval on `road` covers `lane` and overlaps
    /// `[s_start, s_end]`.
    fn objects_on_lane(&self, road: &str, lane: LaneId, s_start: f64, s_end: f64) -> Vec<ObjectId>;

    /// Whether a box at `pose` overlaps any object other than `ignore`.
    fn intersects_with_object(
        &self,
        pose:       Pose,
        dimensions: &Dimensions,
        ignore:     Option<ObjectId>,
    ) -> bool;

    /// Road-frame `t` of the centre of `lane` at `s`, summing the widths of
    /// the lanes between it and the reference line.
    fn lane_center_t(&self, road: &str, lane: LaneId, s: f64) -> f64 {
        let inner: f64 = (1..lane.abs()).map(|i| self.lane_width(road, i * lane.signum(), s)).sum();
        let centre = inner + 0.5 * self.lane_width(road, lane, s);
        if lane < 0 { -centre } else { centre }
    }

    fn is_s_valid_on_lane(&self, road: &str, lane: LaneId, s: f64) -> bool {
        match self.road_length(road) {
            Some(length) => (0.0..=length).contains(&s) && self.lane_type(road, lane, s).is_some(),
            None => false,
        }
    }

    fn is_lane_type_valid(&self, road: &str, lane: LaneId, s: f64, valid: &[LaneType]) -> bool {
        self.lane_type(road, lane, s).is_some_and(|t| valid.contains(&t))
    }

    // ── Route-aware queries ───────────────────────────────────────────────

    /// Objects on `lane` within `[s - backward, s + forward]` along each
    /// path, ordered by their rear route coordinate.  Backward search does
    /// not leave the start road.
    fn objects_in_range(
        &self,
        tree:     &RoadGraph,
        start:    VertexId,
        lane:     LaneId,
        s:        f64,
        backward: f64,
        forward:  f64,
    ) -> RouteQueryResult<Vec<ObjectId>> {
        let mut result = RouteQueryResult::new();
        if !tree.contains(start) {
            return result;
        }
        let root = tree.element(start).clone();
        for leaf in leaves_below(tree, start) {
            let segments = route_segments(self, tree, start, leaf);
            let Some(first) = segments.first() else { continue };
            let origin = first.to_route(s);
            let (low, high) = (origin - backward, origin + forward);

            let mut found: Vec<(f64, ObjectId)> = Vec::new();
            for seg in &segments {
                if seg.offset > high || seg.end() < low {
                    continue;
                }
                let a = seg.to_road(low.max(seg.offset));
                let b = seg.to_road(high.min(seg.end()));
                let road = &seg.element.road_id;
                for id in self.objects_on_lane(road, seg.lane_on(&root, lane), a.min(b), a.max(b)) {
                    if found.iter().any(|&(_, seen)| seen == id) {
                        continue;
                    }
                    let rear = self
                        .object(id)
                        .and_then(|o| o.position.touched_roads.get(road))
                        .map(|i| seg.route_interval(i.s_start, i.s_end).0)
                        .unwrap_or(seg.offset);
                    found.push((rear, id));
                }
            }
            found.sort_by(|a, b| a.0.total_cmp(&b.0));
            result.insert(leaf, found.into_iter().map(|(_, id)| id).collect());
        }
        result
    }

    /// Like [`objects_in_range`](Self::objects_in_range), agents only.
    fn agents_in_range(
        &self,
        tree:     &RoadGraph,
        start:    VertexId,
        lane:     LaneId,
        s:        f64,
        backward: f64,
        forward:  f64,
    ) -> RouteQueryResult<Vec<ObjectId>> {
        let mut result = self.objects_in_range(tree, start, lane, s, backward, forward);
        for ids in result.values_mut() {
            ids.retain(|&id| self.object(id).is_some_and(|o| o.is_agent()));
        }
        result
    }

    /// Distance from `s` to where `lane` ends or stops having one of
    /// `lane_types`.  A lane still present at the end of a path ends there.
    /// Distances beyond `max_search` are reported as infinity.
    fn distance_to_end_of_lane(
        &self,
        tree:       &RoadGraph,
        start:      VertexId,
        lane:       LaneId,
        s:          f64,
        max_search: f64,
        lane_types: &[LaneType],
    ) -> RouteQueryResult<f64> {
        let mut result = RouteQueryResult::new();
        if !tree.contains(start) {
            return result;
        }
        let root = tree.element(start).clone();
        for leaf in leaves_below(tree, start) {
            let segments = route_segments(self, tree, start, leaf);
            let (Some(first), Some(last)) = (segments.first(), segments.last()) else { continue };
            let origin = first.to_route(s);

            let mut end = None;
            'path: for seg in &segments {
                let road = &seg.element.road_id;
                let lane_here = seg.lane_on(&root, lane);
                let mut sections = self.lane_sections(road);
                if !seg.element.in_forward_direction {
                    sections.reverse();
                }
                for section in &sections {
                    let (low, high) = seg.route_interval(section.start_s, section.end_s);
                    if high < origin {
                        continue;
                    }
                    let mid = 0.5 * (section.start_s + section.end_s);
                    let usable = section.lane_ids.contains(&lane_here)
                        && self.is_lane_type_valid(road, lane_here, mid, lane_types);
                    if !usable {
                        end = Some(low.max(origin));
                        break 'path;
                    }
                }
            }

            let distance = end.unwrap_or_else(|| last.end()) - origin;
            let distance = if distance > max_search { f64::INFINITY } else { distance };
            result.insert(leaf, distance);
        }
        result
    }

    /// Width of `lane` `distance` metres ahead of `s`, or `None` if the lane
    /// or the route does not reach that far.
    fn lane_width_ahead(
        &self,
        tree:     &RoadGraph,
        start:    VertexId,
        lane:     LaneId,
        s:        f64,
        distance: f64,
    ) -> RouteQueryResult<Option<f64>> {
        lane_property_ahead(self, tree, start, lane, s, distance, |_, road, lane, s| {
            self.lane_width(road, lane, s)
        })
    }

    /// Curvature of `lane` `distance` metres ahead of `s`, signed in driving
    /// direction.
    fn lane_curvature_ahead(
        &self,
        tree:     &RoadGraph,
        start:    VertexId,
        lane:     LaneId,
        s:        f64,
        distance: f64,
    ) -> RouteQueryResult<Option<f64>> {
        lane_property_ahead(self, tree, start, lane, s, distance, |seg, road, lane, s| {
            let curvature = self.lane_curvature(road, lane, s);
            if seg.element.in_forward_direction { curvature } else { -curvature }
        })
    }

    /// The part of the route an object covers, as `(rear, front)` route
    /// coordinates.
    fn object_route_interval(
        &self,
        tree:   &RoadGraph,
        start:  VertexId,
        object: ObjectId,
    ) -> RouteQueryResult<Option<(f64, f64)>> {
        let mut result = RouteQueryResult::new();
        let Some(obj) = self.object(object) else {
            for leaf in leaves_below(tree, start) {
                result.insert(leaf, None);
            }
            return result;
        };
        for leaf in leaves_below(tree, start) {
            let segments = route_segments(self, tree, start, leaf);
            result.insert(leaf, interval_on_route(obj, &segments));
        }
        result
    }

    /// Distance from `from` to `to` along each path.  `from_reference_s`
    /// is the observer's reference-point `s` on the start road.
    fn distance_between_objects(
        &self,
        tree:             &RoadGraph,
        start:            VertexId,
        from:             ObjectId,
        from_reference_s: Option<f64>,
        to:               ObjectId,
    ) -> RouteQueryResult<LongitudinalDistance> {
        let mut result = RouteQueryResult::new();
        let (own, other) = (self.object(from), self.object(to));
        for leaf in leaves_below(tree, start) {
            let segments = route_segments(self, tree, start, leaf);
            let own_interval = own.and_then(|o| interval_on_route(o, &segments));
            let other_interval = other.and_then(|o| interval_on_route(o, &segments));

            let net_distance = match (own_interval, other_interval) {
                (Some((own_rear, own_front)), Some((other_rear, other_front))) => {
                    Some(if other_rear > own_front {
                        other_rear - own_front
                    } else if other_front < own_rear {
                        other_front - own_rear
                    } else {
                        0.0
                    })
                }
                _ => None,
            };

            let own_reference = from_reference_s
                .and_then(|s| segments.first().map(|seg| seg.to_route(s)));
            let other_reference = other.and_then(|o| {
                segments.iter().find_map(|seg| {
                    o.position.reference_point.get(&seg.element.road_id).map(|p| seg.to_route(p.s))
                })
            });
            let reference_point = match (own_reference, other_reference) {
                (Some(a), Some(b)) => Some(b - a),
                _ => None,
            };

            result.insert(leaf, LongitudinalDistance { net_distance, reference_point });
        }
        result
    }

    /// Lateral extent of `to` relative to the main locate point of `from`.
    /// Positions store `t` from their lane centre; both are converted to
    /// road-frame `t` first.
    fn obstruction(
        &self,
        tree:  &RoadGraph,
        start: VertexId,
        from:  ObjectId,
        to:    ObjectId,
    ) -> RouteQueryResult<Option<Obstruction>> {
        let mut result = RouteQueryResult::new();
        if !tree.contains(start) {
            return result;
        }
        let root = tree.element(start);
        let road_t = |road: &str, p: &tq_core::RoadPosition| self.lane_center_t(road, p.lane_id, p.s) + p.t;
        let observer_t = self.object(from).and_then(|o| {
            o.position
                .main_locate_point
                .get(&root.road_id)
                .or_else(|| o.position.reference_point.get(&root.road_id))
                .map(|p| {
                    let t = road_t(&root.road_id, p);
                    if root.in_forward_direction { t } else { -t }
                })
        });
        let other = self.object(to);

        for leaf in leaves_below(tree, start) {
            let segments = route_segments(self, tree, start, leaf);
            let obstruction = match (observer_t, other) {
                (Some(observer_t), Some(other)) => segments.iter().find_map(|seg| {
                    let p = other.position.reference_point.get(&seg.element.road_id)?;
                    let d = &other.dimensions;
                    let half = 0.5 * (d.width * p.hdg.cos().abs() + d.length * p.hdg.sin().abs());
                    let centre = seg.lateral(road_t(&seg.element.road_id, p));
                    Some(Obstruction {
                        left:  centre + half - observer_t,
                        right: centre - half - observer_t,
                    })
                }),
                _ => None,
            };
            result.insert(leaf, obstruction);
        }
        result
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Union of an object's touched intervals over the roads of a path, using
/// the first occurrence of each road.
fn interval_on_route(object: &WorldObject, segments: &[RouteSegment]) -> Option<(f64, f64)> {
    let mut seen: Vec<&str> = Vec::new();
    let mut interval: Option<(f64, f64)> = None;
    for seg in segments {
        let road = seg.element.road_id.as_str();
        if seen.contains(&road) {
            continue;
        }
        seen.push(road);
        if let Some(touched) = object.position.touched_roads.get(road) {
            let (rear, front) = seg.route_interval(touched.s_start, touched.s_end);
            interval = Some(match interval {
                Some((r, f)) => (r.min(rear), f.max(front)),
                None => (rear, front),
            });
        }
    }
    interval
}

fn lane_property_ahead<W, F>(
    world:    &W,
    tree:     &RoadGraph,
    start:    VertexId,
    lane:     LaneId,
    s:        f64,
    distance: f64,
    property: F,
) -> RouteQueryResult<Option<f64>>
where
    W: WorldQuery + ?Sized,
    F: Fn(&RouteSegment, &str, LaneId, f64) -> f64,
{
    let mut result = RouteQueryResult::new();
    if !tree.contains(start) {
        return result;
    }
    let root = tree.element(start).clone();
    for leaf in leaves_below(tree, start) {
        let segments = route_segments(world, tree, start, leaf);
        let value = segments.first().and_then(|first| {
            let target = first.to_route(s) + distance;
            let seg = segment_at(&segments, target)?;
            let road = seg.element.road_id.as_str();
            let lane_here = seg.lane_on(&root, lane);
            let s_here = seg.to_road(target);
            world.lane_type(road, lane_here, s_here)?;
            Some(property(seg, road, lane_here, s_here))
        });
        result.insert(leaf, value);
    }
    result
}
