//! Closed-form crash tests on constant-acceleration trajectories.
//!
//! Positions are measured along the lane.  The rear vehicle starts at 0, the
//! front vehicle at `gap`.  Accelerations used for braking are negative.

/// Whether the rear vehicle reaches the front vehicle before it stops.
///
/// Both trajectories are quadratic in time until the vehicle stops.  If the
/// front vehicle stops first, it is parked at `gap + its braking distance`
/// from then on; a crash is ruled out when the rear vehicle's full braking
/// distance stays short of that point.
pub fn will_crash_during_brake(
    gap:     f64,
    v_rear:  f64,
    a_rear:  f64,
    v_front: f64,
    a_front: f64,
) -> bool {
    let stop_time = -v_rear / a_rear;

    // Parking point of a front vehicle that stops before the rear one.
    let front_travel = if a_front < 0.0 && -v_front / a_front < stop_time {
        Some(-0.5 * v_front * v_front / a_front)
    } else {
        None
    };
    let stops_short_of_front = |front_travel: Option<f64>| match front_travel {
        Some(travel) => -0.5 * stop_time * stop_time * a_rear < gap + travel,
        None => false,
    };
    let within_brake = |t: f64| 0.0 <= t && t <= stop_time;

    if a_rear == a_front {
        // Trajectory difference is linear.
        if v_rear == v_front {
            return false;
        }
        let intersection = gap / (v_rear - v_front);
        return within_brake(intersection) && !stops_short_of_front(front_travel);
    }

    let dv = v_rear - v_front;
    let da = a_rear - a_front;
    let discriminant = dv * dv + 2.0 * da * gap;
    if discriminant < 0.0 {
        return false;
    }

    let root = discriminant.sqrt();
    let t1 = (-dv + root) / da;
    let t2 = (-dv - root) / da;
    (within_brake(t1) || within_brake(t2)) && !stops_short_of_front(front_travel)
}

/// Whether a crash follows if the rear vehicle keeps its speed for
/// `time_to_brake` seconds and then brakes with `assumed_brake_rear`.
///
/// The front vehicle follows its own kinematics throughout, standing still
/// once it has stopped.
pub fn will_crash(
    gap:                f64,
    v_rear:             f64,
    assumed_brake_rear: f64,
    v_front:            f64,
    a_front:            f64,
    time_to_brake:      f64,
) -> bool {
    let rear_at_ttb = v_rear * time_to_brake;

    let front_stop_time = if a_front < 0.0 { -v_front / a_front } else { f64::MAX };
    let t_front = front_stop_time.min(time_to_brake);
    let front_at_ttb = gap + v_front * t_front + a_front * t_front * t_front / 2.0;
    let stopped = front_stop_time < time_to_brake;
    let v_front_at_ttb = if stopped { 0.0 } else { v_front + a_front * time_to_brake };
    let a_front_at_ttb = if stopped { 0.0 } else { a_front };

    if front_at_ttb <= rear_at_ttb {
        return true;
    }

    will_crash_during_brake(
        front_at_ttb - rear_at_ttb,
        v_rear,
        assumed_brake_rear,
        v_front_at_ttb,
        a_front_at_ttb,
    )
}

/// Net time gap in seconds: `-1` for overlapping objects, `0` for touching
/// ones, the distance itself when the rear vehicle is nearly stationary
/// (`v_rear <= 1`), else `net_distance / v_rear`.
pub fn calculate_net_time_gap(v_rear: f64, net_distance: f64) -> f64 {
    if net_distance < 0.0 {
        -1.0
    } else if net_distance == 0.0 {
        0.0
    } else if v_rear <= 1.0 {
        net_distance
    } else {
        net_distance / v_rear
    }
}
