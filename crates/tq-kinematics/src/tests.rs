//! Unit tests for tq-kinematics.

#[cfg(test)]
mod brake {
    use crate::{calculate_net_time_gap, will_crash, will_crash_during_brake};

    #[test]
    fn identical_kinematics_never_crash() {
        for gap in [0.1, 1.0, 25.0, 400.0] {
            for (v, a) in [(10.0, -5.0), (30.0, -2.0), (0.0, -1.0), (15.0, 0.0)] {
                assert!(!will_crash_during_brake(gap, v, a, v, a), "gap {gap} v {v} a {a}");
            }
        }
    }

    #[test]
    fn closing_with_equal_deceleration_crashes() {
        assert!(will_crash_during_brake(10.0, 20.0, -5.0, 10.0, -5.0));
    }

    #[test]
    fn closing_outside_brake_window_is_safe() {
        // Linear intersection at 5 s, rear stops after 2 s.
        assert!(!will_crash_during_brake(50.0, 10.0, -5.0, 0.0, -5.0));
    }

    #[test]
    fn front_stopping_first_crashes_when_rear_overruns() {
        // Front parks at 5.25 m, rear needs 10 m.
        assert!(will_crash_during_brake(5.0, 10.0, -5.0, 2.0, -8.0));
    }

    #[test]
    fn front_stopping_first_is_safe_when_rear_stops_short() {
        // Front parks at 20.25 m, rear needs 10 m.
        assert!(!will_crash_during_brake(20.0, 10.0, -5.0, 2.0, -8.0));
    }

    #[test]
    fn negative_discriminant_never_meets() {
        assert!(!will_crash_during_brake(10.0, 5.0, -2.0, 10.0, 0.0));
    }

    #[test]
    fn gap_closed_during_reaction_time() {
        assert!(will_crash(5.0, 20.0, -6.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn large_gap_at_equal_speed_is_safe() {
        assert!(!will_crash(100.0, 10.0, -6.0, 10.0, 0.0, 1.0));
    }

    #[test]
    fn hard_braking_front_causes_crash() {
        assert!(will_crash(10.0, 10.0, -6.0, 10.0, -10.0, 1.0));
    }

    #[test]
    fn net_time_gap_boundaries() {
        assert_eq!(calculate_net_time_gap(10.0, -1.0), -1.0);
        assert_eq!(calculate_net_time_gap(10.0, 0.0), 0.0);
        assert_eq!(calculate_net_time_gap(0.5, 10.0), 10.0);
        assert_eq!(calculate_net_time_gap(1.0, 10.0), 10.0);
        assert_eq!(calculate_net_time_gap(10.0, 100.0), 10.0);
    }
}

#[cfg(test)]
mod ttc {
    use std::f64::consts::FRAC_PI_2;

    use tq_core::{AgentCategory, Dimensions, Kinematics, ObjectId, ObjectPosition, WorldObject};

    use crate::{
        calculate_object_ttc, object_ttc, simulate_ttc, TtcConfig, TtcParameters, NO_COLLISION,
    };

    fn car(x: f64, y: f64, vx: f64) -> TtcParameters {
        TtcParameters {
            length: 4.0,
            width: 2.0,
            front_length: 2.0,
            back_length: 2.0,
            x,
            y,
            velocity_x: vx,
            ..Default::default()
        }
    }

    #[test]
    fn parallel_objects_hit_horizon_sentinel() {
        let sim = simulate_ttc(car(0.0, 0.0, 10.0), car(0.0, 5.0, 10.0), 5.0, 100.0);
        assert_eq!(sim.time_to_collision, None);
        assert_eq!(sim.value(), NO_COLLISION);
        assert!(sim.steps <= 50, "ran {} steps", sim.steps);
    }

    #[test]
    fn approaching_stationary_object() {
        let ttc = calculate_object_ttc(car(0.0, 0.0, 10.0), car(50.0, 0.0, 0.0), 10.0, 100.0).unwrap();
        assert!((4.5..=4.8).contains(&ttc), "ttc {ttc}");
    }

    #[test]
    fn collision_beyond_horizon_is_not_reported() {
        assert_eq!(calculate_object_ttc(car(0.0, 0.0, 10.0), car(50.0, 0.0, 0.0), 3.0, 100.0), None);
    }

    #[test]
    fn degenerate_horizon_runs_no_steps() {
        let sim = simulate_ttc(car(0.0, 0.0, 1.0), car(1.0, 0.0, 0.0), 0.0, 100.0);
        assert_eq!(sim.steps, 0);
        let sim = simulate_ttc(car(0.0, 0.0, 1.0), car(1.0, 0.0, 0.0), 5.0, 0.0);
        assert_eq!(sim.steps, 0);
    }

    #[test]
    fn yaw_rotation_preserves_speed() {
        let mut p = TtcParameters { velocity_x: 10.0, yaw_rate: FRAC_PI_2, ..car(0.0, 0.0, 10.0) };
        for _ in 0..10 {
            p.propagate(0.1);
        }
        assert!((p.yaw - FRAC_PI_2).abs() < 1e-9);
        assert!((p.velocity_x.hypot(p.velocity_y) - 10.0).abs() < 1e-9);
        assert!(p.velocity_y > 9.9);
    }

    #[test]
    fn bounding_box_is_closed_ring() {
        let poly = car(10.0, 0.0, 0.0).bounding_box();
        let coords: Vec<_> = poly.exterior().coords().copied().collect();
        assert_eq!(coords.len(), 5);
        assert_eq!(coords.first(), coords.last());
        assert_eq!((coords[0].x, coords[0].y), (8.0, -1.0));
        assert_eq!((coords[2].x, coords[2].y), (12.0, 1.0));
    }

    #[test]
    fn from_object_applies_padding() {
        let object = WorldObject {
            id: ObjectId(3),
            name: "cone".into(),
            category: AgentCategory::StationaryObject,
            kinematics: Kinematics { yaw_rate: 1.0, ..Default::default() },
            dimensions: Dimensions { length: 4.0, width: 2.0, distance_reference_to_leading_edge: 3.0 },
            position: ObjectPosition::default(),
        };
        let p = TtcParameters::from_object(&object, 1.0, 0.5);
        assert_eq!(p.length, 5.0);
        assert_eq!(p.width, 2.5);
        assert_eq!(p.front_length, 3.5);
        assert_eq!(p.back_length, 1.5);
        assert_eq!(p.yaw_rate, 0.0);

        let mut agent = object.clone();
        agent.category = AgentCategory::Common;
        agent.kinematics.velocity_x = 10.0;
        agent.kinematics.x = -30.0;
        assert_eq!(TtcParameters::from_object(&agent, 0.0, 0.0).yaw_rate, 1.0);
        let mut straight = agent.clone();
        straight.kinematics.yaw_rate = 0.0;
        let ttc = object_ttc(&straight, &object, 5.0, &TtcConfig::default()).unwrap();
        assert!((2.5..=2.8).contains(&ttc), "ttc {ttc}");
    }
}
