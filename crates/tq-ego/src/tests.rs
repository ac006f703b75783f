//! Unit tests for tq-ego.

#[cfg(test)]
mod helpers {
    use tq_core::{AgentCategory, Dimensions, ObjectId, RouteElement};
    use tq_road::{RouteView, WorldQuery};
    use tq_scenery::{LaneSpec, ObjectPlacement, RoadSpec, Scenery};

    pub fn fwd(road: &str) -> RouteElement {
        RouteElement::new(road, true)
    }

    pub fn car() -> Dimensions {
        Dimensions { length: 4.0, width: 2.0, distance_reference_to_leading_edge: 3.0 }
    }

    fn two_lanes(id: &str, x: f64, heading: f64) -> RoadSpec {
        RoadSpec::straight(id, 100.0)
            .at(x, 0.0, heading)
            .lanes(vec![LaneSpec::driving(-1, 3.5), LaneSpec::driving(-2, 3.5)])
    }

    /// `A -> B -> {C, D}`, 100 m each.  A also has an oncoming lane; C has
    /// lane -1 only.
    ///
    /// Objects: 0 = ego on A:-1 at s 50, 1 = lead car on B:-1 at s 30,
    /// 2 = car on D:-1 at s 20.
    pub fn world() -> Scenery {
        let a = RoadSpec::straight("A", 100.0).lanes(vec![
            LaneSpec::driving(-1, 3.5),
            LaneSpec::driving(-2, 3.5),
            LaneSpec::driving(1, 3.5),
        ]);
        let c = RoadSpec::straight("C", 100.0).at(200.0, 0.0, 0.0).lanes(vec![LaneSpec::driving(-1, 3.5)]);
        let mut world = Scenery::builder()
            .road(a)
            .road(two_lanes("B", 100.0, 0.0))
            .road(c)
            .road(two_lanes("D", 200.0, 0.2))
            .connect(fwd("A"), fwd("B"))
            .connect(fwd("B"), fwd("C"))
            .connect(fwd("B"), fwd("D"))
            .build()
            .unwrap();
        for (name, category, road, s) in [
            ("ego", AgentCategory::Ego, "A", 50.0),
            ("lead", AgentCategory::Common, "B", 30.0),
            ("other", AgentCategory::Common, "D", 20.0),
        ] {
            world.place(ObjectPlacement::new(name, category, road, -1, s, car()).speed(20.0)).unwrap();
        }
        world
    }

    pub fn view(world: &Scenery) -> RouteView {
        world.road_graph(&fwd("A"), 10).unwrap()
    }

    pub const EGO: ObjectId = ObjectId(0);
    pub const LEAD: ObjectId = ObjectId(1);
    pub const OTHER: ObjectId = ObjectId(2);
}

// ── Route state machine ───────────────────────────────────────────────────────

#[cfg(test)]
mod route_state {
    use tq_core::VertexId;
    use tq_road::WorldQuery;

    use super::helpers::{fwd, view, world, EGO};
    use crate::{EgoAgent, EgoError, RouteStatus};

    #[test]
    fn initial_agent_has_no_route() {
        let world = world();
        let mut ego = EgoAgent::new(EGO);
        assert_eq!(ego.status(), RouteStatus::Initial);
        assert!(!ego.has_valid_route());
        assert!(matches!(ego.road_id(), Err(EgoError::NoRoute)));
        assert!(matches!(ego.main_locate_position(), Err(EgoError::NoRoute)));
        assert!(matches!(ego.set_new_target(0), Err(EgoError::NoRoute)));
        ego.update(&world);
        assert_eq!(ego.status(), RouteStatus::Initial);
    }

    #[test]
    fn set_road_graph_installs_way_and_alternatives() {
        let world = world();
        let view = view(&world);
        let mut ego = EgoAgent::new(EGO);
        ego.set_road_graph(&world, view.clone(), view.root, VertexId(2)).unwrap();

        assert_eq!(ego.status(), RouteStatus::Valid);
        assert_eq!(ego.road_id().unwrap(), "A");
        assert_eq!(ego.alternatives().unwrap(), &[VertexId(2), VertexId(3)]);
        assert_eq!(ego.way_to_target().unwrap().elements, vec![fwd("A"), fwd("B"), fwd("C")]);
        let main = ego.main_locate_position().unwrap();
        assert_eq!((main.lane_id, main.s), (-1, 53.0));
        assert_eq!(ego.previous_road(0).unwrap(), Some(&fwd("A")));
        assert_eq!(ego.previous_road(1).unwrap(), None);
    }

    #[test]
    fn unknown_vertices_are_rejected() {
        let world = world();
        let view = view(&world);
        let mut ego = EgoAgent::new(EGO);
        let result = ego.set_road_graph(&world, view.clone(), view.root, VertexId(40));
        assert!(matches!(result, Err(EgoError::Road(_))));
        assert_eq!(ego.status(), RouteStatus::Initial);
    }

    #[test]
    fn update_follows_the_way() {
        let mut world = world();
        let view = view(&world);
        let mut ego = EgoAgent::new(EGO);
        ego.set_road_graph(&world, view.clone(), view.root, VertexId(2)).unwrap();

        world.relocate(EGO, "A", -1, 90.0).unwrap();
        ego.update(&world);
        assert_eq!(ego.road_id().unwrap(), "A");
        assert_eq!(ego.main_locate_position().unwrap().s, 93.0);

        world.relocate(EGO, "B", -1, 10.0).unwrap();
        ego.update(&world);
        assert!(ego.has_valid_route());
        assert_eq!(ego.road_id().unwrap(), "B");
        assert_eq!(ego.current_vertex().unwrap(), VertexId(1));
        assert_eq!(ego.previous_road(1).unwrap(), Some(&fwd("A")));
        assert_eq!(ego.alternatives().unwrap(), &[VertexId(2), VertexId(3)]);

        world.relocate(EGO, "C", -1, 5.0).unwrap();
        ego.update(&world);
        assert_eq!(ego.road_id().unwrap(), "C");
        assert_eq!(ego.alternatives().unwrap(), &[VertexId(2)]);
        assert_eq!(ego.previous_road(2).unwrap(), Some(&fwd("A")));
    }

    #[test]
    fn leaving_the_way_invalidates() {
        let mut world = world();
        let view = view(&world);
        let mut ego = EgoAgent::new(EGO);
        ego.set_road_graph(&world, view.clone(), view.root, VertexId(2)).unwrap();

        world.relocate(EGO, "B", -1, 10.0).unwrap();
        ego.update(&world);
        world.relocate(EGO, "D", -1, 10.0).unwrap();
        ego.update(&world);
        assert_eq!(ego.status(), RouteStatus::Invalid);
        assert!(matches!(ego.road_id(), Err(EgoError::InvalidRoute)));
        assert!(matches!(ego.distance_to_end_of_lane(&world, 100.0, 0), Err(EgoError::InvalidRoute)));
        assert!(matches!(ego.set_new_target(1), Err(EgoError::InvalidRoute)));

        // Stays invalid until a new graph is installed.
        world.relocate(EGO, "B", -1, 20.0).unwrap();
        ego.update(&world);
        assert_eq!(ego.status(), RouteStatus::Invalid);

        let fresh = world.road_graph(&fwd("B"), 10).unwrap();
        let leaf = fresh.leaves()[1];
        ego.set_road_graph(&world, fresh.clone(), fresh.root, leaf).unwrap();
        assert_eq!(ego.road_id().unwrap(), "B");
    }

    #[test]
    fn skipping_a_road_invalidates() {
        let mut world = world();
        let view = view(&world);
        let mut ego = EgoAgent::new(EGO);
        ego.set_road_graph(&world, view.clone(), view.root, VertexId(2)).unwrap();
        world.relocate(EGO, "C", -1, 10.0).unwrap();
        ego.update(&world);
        assert!(!ego.has_valid_route());
    }

    #[test]
    fn end_of_way_invalidates() {
        let mut world = world();
        let view = world.road_graph(&fwd("A"), 0).unwrap();
        let mut ego = EgoAgent::new(EGO);
        ego.set_road_graph(&world, view.clone(), view.root, view.root).unwrap();
        assert!(ego.has_valid_route());
        world.relocate(EGO, "B", -1, 10.0).unwrap();
        ego.update(&world);
        assert!(!ego.has_valid_route());
    }

    #[test]
    fn new_target_switches_branch() {
        let mut world = world();
        let view = view(&world);
        let mut ego = EgoAgent::new(EGO);
        ego.set_road_graph(&world, view.clone(), view.root, VertexId(2)).unwrap();

        ego.set_new_target(1).unwrap();
        assert_eq!(ego.way_to_target().unwrap().elements, vec![fwd("A"), fwd("B"), fwd("D")]);
        assert!(matches!(
            ego.set_new_target(2),
            Err(EgoError::AlternativeOutOfRange { index: 2, len: 2 })
        ));

        for road in ["B", "D"] {
            world.relocate(EGO, road, -1, 10.0).unwrap();
            ego.update(&world);
        }
        assert_eq!(ego.road_id().unwrap(), "D");
    }

    #[test]
    fn installing_below_the_root_limits_alternatives() {
        let mut world = world();
        let view = view(&world);
        world.relocate(EGO, "C", -1, 5.0).unwrap();
        let mut ego = EgoAgent::new(EGO);
        ego.set_road_graph(&world, view.clone(), VertexId(2), VertexId(2)).unwrap();

        assert!(ego.has_valid_route());
        assert_eq!(ego.road_id().unwrap(), "C");
        assert_eq!(ego.alternatives().unwrap(), &[VertexId(2)]);
        assert_eq!(ego.way_to_target().unwrap().elements, vec![fwd("C")]);
        assert_eq!(ego.query_distance_to_end_of_lane(&world, 500.0, 0).unwrap(), vec![92.0]);

        assert!(matches!(
            ego.set_new_target(1),
            Err(EgoError::AlternativeOutOfRange { index: 1, len: 1 })
        ));
        assert_eq!(ego.status(), RouteStatus::Valid);
        assert_eq!(ego.way_to_target().unwrap().elements, vec![fwd("C")]);
        ego.set_new_target(0).unwrap();
        assert!(ego.has_valid_route());
    }

    #[test]
    fn target_outside_the_subtree_invalidates() {
        let mut world = world();
        let view = view(&world);
        world.relocate(EGO, "C", -1, 5.0).unwrap();
        let mut ego = EgoAgent::new(EGO);
        ego.set_road_graph(&world, view.clone(), VertexId(2), VertexId(3)).unwrap();
        assert_eq!(ego.status(), RouteStatus::Invalid);
    }

    #[test]
    fn missing_agent_invalidates() {
        let world = world();
        let view = view(&world);
        let mut ego = EgoAgent::new(tq_core::ObjectId(99));
        ego.set_road_graph(&world, view.clone(), view.root, VertexId(2)).unwrap();
        assert!(!ego.has_valid_route());
    }
}

// ── Position queries ──────────────────────────────────────────────────────────

#[cfg(test)]
mod position {
    use tq_core::{AgentCategory, RouteElement, Side, VertexId};
    use tq_road::WorldQuery;
    use tq_scenery::ObjectPlacement;

    use super::helpers::{car, view, world, EGO};
    use crate::EgoAgent;

    #[test]
    fn relative_lanes_forward() {
        let world = world();
        let view = view(&world);
        let mut ego = EgoAgent::new(EGO);
        ego.set_road_graph(&world, view.clone(), view.root, VertexId(2)).unwrap();
        assert_eq!(ego.lane_id_from_relative(0).unwrap(), -1);
        assert_eq!(ego.lane_id_from_relative(-1).unwrap(), -2);
        assert_eq!(ego.lane_id_from_relative(1).unwrap(), 1);
        assert_eq!(ego.relative_yaw().unwrap(), 0.0);
        assert_eq!(ego.position_lateral().unwrap(), 0.0);
        assert!((ego.lane_remainder(&world, Side::Left).unwrap() - 0.75).abs() < 1e-12);
        assert_eq!(ego.reference_point_position(&world).unwrap().map(|p| p.s), Some(50.0));
    }

    #[test]
    fn relative_lanes_backward() {
        let mut world = world();
        let id = world
            .place(ObjectPlacement::new("oncoming", AgentCategory::Common, "A", 1, 50.0, car()).offset(0.5))
            .unwrap();
        let view = world.road_graph(&RouteElement::new("A", false), 10).unwrap();
        let mut ego = EgoAgent::new(id);
        ego.set_road_graph(&world, view.clone(), view.root, view.root).unwrap();

        assert_eq!(ego.lane_id_from_relative(0).unwrap(), 1);
        assert_eq!(ego.lane_id_from_relative(1).unwrap(), -1);
        assert_eq!(ego.lane_id_from_relative(-1).unwrap(), 2);
        assert!(ego.relative_yaw().unwrap().abs() < 1e-9);
        assert!((ego.position_lateral().unwrap() - 0.5).abs() < 1e-9);
        assert!((ego.main_locate_position().unwrap().s - 47.0).abs() < 1e-9);
    }

    #[test]
    fn lane_geometry_at_and_ahead() {
        let world = world();
        let view = view(&world);
        let mut ego = EgoAgent::new(EGO);
        ego.set_road_graph(&world, view.clone(), view.root, VertexId(2)).unwrap();
        assert_eq!(ego.lane_width(&world, 0).unwrap(), 3.5);
        assert_eq!(ego.lane_width(&world, -2).unwrap(), 0.0);
        assert_eq!(ego.lane_curvature(&world, 0).unwrap(), 0.0);
        assert_eq!(ego.lane_width_ahead(&world, 60.0, -1).unwrap(), Some(3.5));
        // C has no lane -2.
        assert_eq!(ego.lane_width_ahead(&world, 160.0, -1).unwrap(), None);
        assert_eq!(ego.lane_width_ahead(&world, 500.0, 0).unwrap(), None);
        assert_eq!(ego.lane_curvature_ahead(&world, 60.0, 0).unwrap(), Some(0.0));
    }
}

// ── Route queries ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod route_queries {
    use tq_core::VertexId;

    use super::helpers::{view, world, EGO, LEAD, OTHER};
    use crate::{alternatives_sorted, alternatives_where, EgoAgent};

    fn ego_heading_for_c(world: &tq_scenery::Scenery) -> EgoAgent {
        let view = view(world);
        let mut ego = EgoAgent::new(EGO);
        ego.set_road_graph(world, view.clone(), view.root, VertexId(2)).unwrap();
        ego
    }

    #[test]
    fn distance_to_end_of_lane_along_way() {
        let world = world();
        let ego = ego_heading_for_c(&world);
        assert_eq!(ego.distance_to_end_of_lane(&world, 500.0, 0).unwrap(), 247.0);
        assert_eq!(ego.distance_to_end_of_lane(&world, 500.0, -1).unwrap(), 147.0);
        assert!(ego.distance_to_end_of_lane(&world, 100.0, 0).unwrap().is_infinite());
    }

    #[test]
    fn distance_to_end_of_lane_per_alternative() {
        let world = world();
        let ego = ego_heading_for_c(&world);
        let ends = ego.query_distance_to_end_of_lane(&world, 500.0, -1).unwrap();
        assert_eq!(ends, vec![147.0, 247.0]);
        assert_eq!(alternatives_sorted(&ends, |_| true, |a, b| b.total_cmp(a)), vec![1, 0]);
        assert_eq!(alternatives_where(&ends, |&d| d > 200.0), vec![1]);
    }

    #[test]
    fn objects_in_range_excludes_self() {
        let world = world();
        let ego = ego_heading_for_c(&world);
        assert_eq!(ego.objects_in_range(&world, 10.0, 100.0, 0).unwrap(), vec![LEAD]);
        assert_eq!(ego.agents_in_range(&world, 10.0, 100.0, 0).unwrap(), vec![LEAD]);
        assert!(ego.objects_in_range(&world, 10.0, 50.0, 0).unwrap().is_empty());
        assert!(ego.objects_in_range(&world, 10.0, 300.0, -1).unwrap().is_empty());

        let per_alternative = ego.query_objects_in_range(&world, 10.0, 200.0, 0).unwrap();
        assert_eq!(per_alternative, vec![vec![LEAD], vec![LEAD, OTHER]]);
        assert_eq!(alternatives_where(&per_alternative, |ids| ids.contains(&OTHER)), vec![1]);
    }

    #[test]
    fn distance_and_obstruction_to_lead() {
        let world = world();
        let ego = ego_heading_for_c(&world);
        let d = ego.distance_to_object(&world, LEAD).unwrap();
        assert_eq!(d.net_distance, Some(76.0));
        assert_eq!(d.reference_point, Some(80.0));

        let other = ego.distance_to_object(&world, OTHER).unwrap();
        assert_eq!(other.net_distance, None);
        let per_alternative = ego.query_distance_to_object(&world, OTHER).unwrap();
        assert_eq!(per_alternative[0].net_distance, None);
        assert_eq!(per_alternative[1].net_distance, Some(166.0));

        let o = ego.obstruction(&world, LEAD).unwrap().unwrap();
        assert!((o.left - 1.0).abs() < 1e-9 && (o.right + 1.0).abs() < 1e-9);
        assert!(ego.obstruction(&world, OTHER).unwrap().is_none());
    }
}

// ── Alternative selection ─────────────────────────────────────────────────────

#[cfg(test)]
mod alternatives {
    use crate::{alternatives_sorted, alternatives_where};

    #[test]
    fn filter_keeps_alternative_order() {
        let results = [5.0, 1.0, 7.0, 3.0];
        assert_eq!(alternatives_where(&results, |&r| r > 2.0), vec![0, 2, 3]);
        assert!(alternatives_where(&results, |&r| r > 10.0).is_empty());
    }

    #[test]
    fn sort_is_stable_over_survivors() {
        let results: [(f64, bool); 4] = [(1.0, true), (3.0, false), (1.0, true), (0.5, true)];
        let picked = alternatives_sorted(&results, |r| r.1, |a, b| a.0.total_cmp(&b.0));
        assert_eq!(picked, vec![3, 0, 2]);
    }

    #[test]
    fn zipped_queries_combine() {
        let distances: [f64; 3] = [100.0, 40.0, 250.0];
        let free = [true, true, false];
        let paired: Vec<_> = distances.iter().zip(free.iter()).collect();
        let picked = alternatives_sorted(&paired, |p| *p.1, |a, b| b.0.total_cmp(a.0));
        assert_eq!(picked, vec![0, 1]);
    }
}
