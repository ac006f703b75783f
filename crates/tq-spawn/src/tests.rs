//! Unit tests for tq-spawn.

#[cfg(test)]
mod helpers {
    use tq_core::{AgentCategory, Dimensions, LaneType, SimRng};
    use tq_road::{SampledRoute, WorldQuery};
    use tq_scenery::{LaneSpec, ObjectPlacement, RoadSpec, Scenery};

    use crate::SpawnPointAnalyzer;

    pub fn car() -> Dimensions {
        Dimensions { length: 4.0, width: 2.0, distance_reference_to_leading_edge: 3.0 }
    }

    /// `A` (200 m: -1, -2, -3 shoulder, +1) -> `B` (300 m: -1, -2), and a
    /// lone `E` (200 m: -1) that ends in nothing.
    pub fn world(objects: &[(AgentCategory, &str, f64, f64)]) -> Scenery {
        let a = RoadSpec::straight("A", 200.0).lanes(vec![
            LaneSpec::driving(-1, 3.5),
            LaneSpec::driving(-2, 3.5),
            LaneSpec::new(-3, 2.5, LaneType::Shoulder),
            LaneSpec::driving(1, 3.5),
        ]);
        let b = RoadSpec::straight("B", 300.0)
            .at(200.0, 0.0, 0.0)
            .lanes(vec![LaneSpec::driving(-1, 3.5), LaneSpec::driving(-2, 3.5)]);
        let e = RoadSpec::straight("E", 200.0)
            .at(0.0, 100.0, 0.0)
            .lanes(vec![LaneSpec::driving(-1, 3.5)]);
        let mut world = Scenery::builder()
            .road(a)
            .road(b)
            .road(e)
            .connect(tq_core::RouteElement::new("A", true), tq_core::RouteElement::new("B", true))
            .build()
            .unwrap();
        for (i, &(category, road, s, speed)) in objects.iter().enumerate() {
            let name = format!("object{i}");
            world.place(ObjectPlacement::new(name, category, road, -1, s, car()).speed(speed)).unwrap();
        }
        world
    }

    pub fn route<W: WorldQuery>(world: &W, road: &str) -> SampledRoute {
        SpawnPointAnalyzer::new(world).sample_route(road, -1, &mut SimRng::new(7)).unwrap()
    }

    pub fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod config {
    use crate::{SpawnConfig, SpawnError, SpawnPointAnalyzer};

    use super::helpers::world;

    #[test]
    fn default_config_is_valid() {
        let config = SpawnConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.minimum_separation_buffer, 5.0);
        assert_eq!(config.ttc_threshold, 2.0);
        assert_eq!(config.max_road_graph_depth, 10);
    }

    #[test]
    fn positive_braking_is_rejected() {
        let config = SpawnConfig { assumed_braking_acceleration: 2.0, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(SpawnError::InvalidConfig { field: "assumed_braking_acceleration", .. })
        ));
        let world = world(&[]);
        assert!(SpawnPointAnalyzer::with_config(&world, config).is_err());
    }

    #[test]
    fn nan_threshold_is_rejected() {
        let config = SpawnConfig { ttc_threshold: f64::NAN, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn separation_uses_the_larger_of_gap_and_buffer() {
        let config = SpawnConfig::default();
        assert_eq!(config.separation(2.0, 20.0, 4.0), 44.0);
        assert_eq!(config.separation(0.1, 10.0, 4.0), 9.0);
    }
}

// ── Stage 1: valid ranges ─────────────────────────────────────────────────────

#[cfg(test)]
mod ranges {
    use tq_core::{AgentCategory, LaneType};
    use tq_scenery::{LaneSpec, RoadSpec, Scenery};

    use super::helpers::world;
    use crate::{LaneSpawningRange, SpawnPointAnalyzer};

    type Analyzer<'w> = SpawnPointAnalyzer<'w, Scenery>;

    #[test]
    fn range_surrounded_by_agents_is_empty() {
        assert!(Analyzer::valid_spawning_ranges_for_range(-1, 10.0, 20.0, 5.0, 25.0).is_empty());
    }

    #[test]
    fn agents_outside_the_range_leave_it_whole() {
        let whole = vec![LaneSpawningRange::new(-1, 10.0, 20.0)];
        assert_eq!(Analyzer::valid_spawning_ranges_for_range(-1, 10.0, 20.0, 2.0, 5.0), whole);
        assert_eq!(Analyzer::valid_spawning_ranges_for_range(-1, 10.0, 20.0, 25.0, 30.0), whole);
    }

    #[test]
    fn agents_inside_the_range_split_it() {
        assert_eq!(
            Analyzer::valid_spawning_ranges_for_range(-1, 10.0, 20.0, 15.0, 30.0),
            vec![LaneSpawningRange::new(-1, 10.0, 15.0)]
        );
        assert_eq!(
            Analyzer::valid_spawning_ranges_for_range(-1, 10.0, 20.0, 5.0, 17.0),
            vec![LaneSpawningRange::new(-1, 17.0, 20.0)]
        );
        assert_eq!(
            Analyzer::valid_spawning_ranges_for_range(-1, 10.0, 20.0, 12.0, 18.0),
            vec![LaneSpawningRange::new(-1, 10.0, 12.0), LaneSpawningRange::new(-1, 18.0, 20.0)]
        );
    }

    #[test]
    fn lane_occupied_edge_to_edge_by_scenario_agent_has_no_ranges() {
        // The car at s 50 covers [49, 53].
        let world = world(&[(AgentCategory::Scenario, "A", 50.0, 0.0)]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let ranges = analyzer.valid_lane_spawning_ranges("A", 49.0, 53.0, &[-1], &LaneType::DRIVABLE);
        assert!(ranges.is_empty());
    }

    #[test]
    fn scenario_agent_splits_lane_range() {
        let world = world(&[(AgentCategory::Ego, "A", 100.0, 0.0)]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let ranges = analyzer.valid_lane_spawning_ranges("A", 0.0, 200.0, &[-1], &LaneType::DRIVABLE);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].s_start, 0.0);
        assert!((ranges[0].s_end - 98.999).abs() < 1e-9);
        assert!((ranges[1].s_start - 103.001).abs() < 1e-9);
        assert_eq!(ranges[1].s_end, 200.0);
    }

    #[test]
    fn common_agents_do_not_block_ranges() {
        let world = world(&[(AgentCategory::Common, "A", 50.0, 0.0)]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let ranges = analyzer.valid_lane_spawning_ranges("A", 0.0, 200.0, &[-1, -2], &LaneType::DRIVABLE);
        assert_eq!(
            ranges,
            vec![LaneSpawningRange::new(-1, 0.0, 200.0), LaneSpawningRange::new(-2, 0.0, 200.0)]
        );
    }

    #[test]
    fn unsupported_lane_type_is_skipped() {
        let world = world(&[]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let ranges = analyzer.valid_lane_spawning_ranges("A", 0.0, 200.0, &[-1, -2, -3], &LaneType::DRIVABLE);
        assert!(ranges.iter().all(|r| r.lane_id != -3));
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn sections_are_visited_from_the_road_end() {
        let road = RoadSpec::straight("S", 200.0)
            .section(0.0, 100.0, vec![LaneSpec::driving(-1, 3.5)])
            .section(100.0, 200.0, vec![LaneSpec::driving(-1, 3.5)]);
        let world = Scenery::builder().road(road).build().unwrap();
        let analyzer = SpawnPointAnalyzer::new(&world);
        let ranges = analyzer.valid_lane_spawning_ranges("S", 50.0, 150.0, &[-1], &LaneType::DRIVABLE);
        assert_eq!(
            ranges,
            vec![LaneSpawningRange::new(-1, 100.0, 150.0), LaneSpawningRange::new(-1, 50.0, 100.0)]
        );
    }
}

// ── Stage 2: position ─────────────────────────────────────────────────────────

#[cfg(test)]
mod position {
    use tq_core::{AgentCategory, LaneType};

    use super::helpers::{approx, car, route, world};
    use crate::SpawnPointAnalyzer;

    #[test]
    fn free_lane_spawns_at_range_end() {
        let world = world(&[]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = route(&world, "A");
        let s = analyzer
            .next_spawn_position("A", -1, (0.0, 200.0), &car(), 30.0, 2.0, &route, &LaneType::DRIVABLE)
            .unwrap();
        assert!(approx(s, 197.0));
    }

    #[test]
    fn free_lane_keeps_distance_to_lane_end() {
        // E ends at 200; at 30 m/s the vehicle needs 120 m of lane.
        let world = world(&[]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = route(&world, "E");
        let s = analyzer
            .next_spawn_position("E", -1, (0.0, 200.0), &car(), 30.0, 2.0, &route, &LaneType::DRIVABLE)
            .unwrap();
        assert!((s - 77.001).abs() < 1e-6);
    }

    #[test]
    fn spawns_separation_behind_next_agent() {
        // Rear at 149, separation max(2 * 20 + 4, 5 + 4) = 44.
        let world = world(&[(AgentCategory::Common, "A", 150.0, 20.0)]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = route(&world, "A");
        let s = analyzer
            .next_spawn_position("A", -1, (0.0, 200.0), &car(), 20.0, 2.0, &route, &LaneType::DRIVABLE)
            .unwrap();
        assert!(approx(s, 105.0));
    }

    #[test]
    fn no_position_when_vehicle_does_not_fit() {
        let world = world(&[(AgentCategory::Common, "A", 150.0, 20.0)]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = route(&world, "A");
        let s = analyzer.next_spawn_position(
            "A",
            -1,
            (120.0, 140.0),
            &car(),
            20.0,
            2.0,
            &route,
            &LaneType::DRIVABLE,
        );
        assert_eq!(s, None);
    }
}

// ── Stage 3: velocity ─────────────────────────────────────────────────────────

#[cfg(test)]
mod velocity {
    use tq_core::AgentCategory;

    use super::helpers::{approx, car, route, world};
    use crate::SpawnPointAnalyzer;

    #[test]
    fn closing_on_slow_agent_caps_velocity() {
        // Gap 59 - 53 = 6 m closing at 20 m/s: capped to 10 + 6 / 2.
        let world = world(&[(AgentCategory::Common, "A", 60.0, 10.0)]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = route(&world, "A");
        let v = analyzer.spawn_velocity_to_prevent_crashing(-1, 50.0, &car(), 30.0, &route);
        assert!(approx(v, 13.0));
    }

    #[test]
    fn slower_spawn_keeps_velocity() {
        let world = world(&[(AgentCategory::Common, "A", 60.0, 10.0)]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = route(&world, "A");
        assert_eq!(analyzer.spawn_velocity_to_prevent_crashing(-1, 50.0, &car(), 5.0, &route), 5.0);
    }

    #[test]
    fn agent_beyond_horizon_is_ignored() {
        let world = world(&[(AgentCategory::Common, "A", 150.0, 0.0)]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = route(&world, "A");
        assert_eq!(analyzer.spawn_velocity_to_prevent_crashing(-1, 50.0, &car(), 30.0, &route), 30.0);
    }
}

// ── Stage 4: coordinates ──────────────────────────────────────────────────────

#[cfg(test)]
mod coordinates {
    use tq_core::AgentCategory;

    use super::helpers::{car, route, world};
    use crate::SpawnPointAnalyzer;

    #[test]
    fn free_position_is_valid() {
        let world = world(&[]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = route(&world, "A");
        assert!(analyzer.are_spawning_coordinates_valid("A", -1, 50.0, 0.0, &route, &car()));
    }

    #[test]
    fn left_lane_is_rejected() {
        let world = world(&[]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = route(&world, "A");
        assert!(!analyzer.are_spawning_coordinates_valid("A", 1, 50.0, 0.0, &route, &car()));
    }

    #[test]
    fn s_off_the_road_is_rejected() {
        let world = world(&[]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = route(&world, "A");
        assert!(!analyzer.are_spawning_coordinates_valid("A", -1, 250.0, 0.0, &route, &car()));
    }

    #[test]
    fn agent_within_minimum_distance_is_rejected() {
        // Front length 3 + buffer 5 reaches 58; the agent's rear is at 57.
        let world = world(&[(AgentCategory::Common, "A", 58.0, 0.0)]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = route(&world, "A");
        assert!(!analyzer.valid_minimum_spawning_distance_to_object_in_front(-1, 50.0, &route, &car()));
        assert!(!analyzer.are_spawning_coordinates_valid("A", -1, 50.0, 0.0, &route, &car()));
        assert!(analyzer.valid_minimum_spawning_distance_to_object_in_front(-1, 40.0, &route, &car()));
    }

    #[test]
    fn position_at_lane_end_is_rejected() {
        let world = world(&[]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = route(&world, "E");
        assert!(!analyzer.are_spawning_coordinates_valid("E", -1, 199.0, 0.0, &route, &car()));
        assert!(analyzer.are_spawning_coordinates_valid("E", -1, 190.0, 0.0, &route, &car()));
    }

    #[test]
    fn offset_inside_lane_is_valid() {
        let world = world(&[]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        assert!(analyzer.is_offset_valid_for_lane("A", -1, 50.0, 0.5, 2.0));
    }

    #[test]
    fn overhang_needs_existing_neighbour() {
        let world = world(&[]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        // Left of lane -1 is the reference line, right of it lane -2.
        assert!(!analyzer.is_offset_valid_for_lane("A", -1, 50.0, 1.0, 2.0));
        assert!(analyzer.is_offset_valid_for_lane("A", -1, 50.0, -1.0, 2.0));
    }

    #[test]
    fn offset_beyond_half_lane_is_rejected() {
        let world = world(&[]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        assert!(!analyzer.is_offset_valid_for_lane("A", -1, 50.0, -2.0, 2.0));
    }

    #[test]
    fn vehicle_wider_than_lane_is_rejected() {
        let world = world(&[]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        assert!(!analyzer.is_offset_valid_for_lane("A", -1, 50.0, 0.0, 6.0));
    }

    #[test]
    fn new_agent_overlapping_existing_one_is_detected() {
        let world = world(&[(AgentCategory::Common, "A", 50.0, 0.0)]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        assert!(analyzer.new_agent_intersects_with_existing_agent("A", -1, 51.0, 0.0, &car()));
        assert!(!analyzer.new_agent_intersects_with_existing_agent("A", -2, 50.0, 0.0, &car()));
        assert!(analyzer.new_agent_intersects_with_existing_agent("nowhere", -1, 50.0, 0.0, &car()));
    }
}

// ── Stage 5: crash check ──────────────────────────────────────────────────────

#[cfg(test)]
mod crash {
    use tq_core::{AgentCategory, Direction};

    use super::helpers::{car, route, world};
    use crate::SpawnPointAnalyzer;

    #[test]
    fn fast_spawn_behind_stopped_agent_crashes() {
        let world = world(&[(AgentCategory::Common, "A", 60.0, 0.0)]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = route(&world, "A");
        assert!(analyzer.spawn_will_cause_crash(-1, 50.0, &car(), 30.0, Direction::Forward, &route));
    }

    #[test]
    fn spawn_well_behind_faster_agent_is_safe() {
        let world = world(&[(AgentCategory::Common, "A", 150.0, 30.0)]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = route(&world, "A");
        assert!(!analyzer.spawn_will_cause_crash(-1, 50.0, &car(), 10.0, Direction::Forward, &route));
    }

    #[test]
    fn fast_agent_behind_stopped_spawn_crashes() {
        // Follower covers [19, 23]; the new vehicle's rear is at 29.
        let world = world(&[(AgentCategory::Common, "A", 20.0, 30.0)]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = route(&world, "A");
        assert!(analyzer.spawn_will_cause_crash(-1, 30.0, &car(), 0.0, Direction::Backward, &route));
    }

    #[test]
    fn empty_lane_never_crashes() {
        let world = world(&[]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = route(&world, "A");
        assert!(!analyzer.spawn_will_cause_crash(-1, 30.0, &car(), 30.0, Direction::Forward, &route));
        assert!(!analyzer.spawn_will_cause_crash(-1, 30.0, &car(), 30.0, Direction::Backward, &route));
    }
}

// ── Route and road checks ─────────────────────────────────────────────────────

#[cfg(test)]
mod road {
    use tq_core::{LaneType, SimRng};
    use tq_road::WorldQuery;

    use super::helpers::world;
    use crate::{SpawnError, SpawnPointAnalyzer};

    #[test]
    fn sampled_route_ends_at_a_leaf() {
        let world = world(&[]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let route = analyzer.sample_route("A", -1, &mut SimRng::new(3)).unwrap();
        assert_eq!(route.view.leaves(), vec![route.target]);
        assert_eq!(route.view.tree.element(route.target).road_id, "B");
        assert!(world.is_directional_road_existing("A", true));
    }

    #[test]
    fn unknown_road_cannot_be_sampled() {
        let world = world(&[]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        let err = analyzer.sample_route("Z", -1, &mut SimRng::new(3)).unwrap_err();
        assert!(matches!(err, SpawnError::UnknownRouteElement(e) if e.road_id == "Z"));
    }

    #[test]
    fn road_without_lanes_in_direction_is_invalid() {
        let world = world(&[]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        assert!(analyzer.validate_road_id_in_direction("A", -1, 10.0, &LaneType::DRIVABLE));
        assert!(!analyzer.validate_road_id_in_direction("E", 1, 10.0, &LaneType::DRIVABLE));
        assert!(!analyzer.validate_road_id_in_direction("A", -3, 10.0, &LaneType::DRIVABLE));
    }

    #[test]
    fn right_lane_count_skips_non_driving_lanes() {
        let world = world(&[]);
        let analyzer = SpawnPointAnalyzer::new(&world);
        assert_eq!(analyzer.right_lane_count("A", -1, 10.0), 1);
        assert_eq!(analyzer.right_lane_count("A", -2, 10.0), 0);
        assert_eq!(analyzer.right_lane_count("A", 1, 10.0), 0);
    }
}
