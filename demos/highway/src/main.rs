//! highway — traffic population and scenario triggers on a synthetic highway.
//!
//! Places an ego vehicle and a slow truck on the main carriageway, fills the
//! free stretches of the driving lanes with common traffic, then steps the
//! world for thirty simulated seconds while three conditional detectors watch
//! for a closing gap, tailgating and traffic taking the exit.  Every fired
//! event is printed as JSON at the end.

mod network;

use std::collections::BTreeMap;

use anyhow::Result;
use log::{info, warn};

use tq_condition::{
    ActorInformation, Condition, ConditionContext, ConditionalDetector, DetectorDefinition, Rule, TriggerEvent,
};
use tq_core::{
    AgentCategory, AgentRng, Dimensions, Direction, LaneId, LaneType, ObjectId, SimClock, UniformSource,
};
use tq_ego::{EgoAgent, RouteStatus};
use tq_road::{SampledRoute, WorldQuery};
use tq_scenery::{ObjectPlacement, Scenery};
use tq_spawn::{LaneSpawningRange, SpawnPointAnalyzer};

use network::{build_highway, EXIT, MAIN};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:                u64            = 42;
const SIM_STEPS:           u64            = 300; // 100 ms cycle → 30 s
const MAX_SPAWNS_PER_LANE: usize          = 6;
/// Stretch of the main road that receives common traffic.
const SPAWN_AREA:          (f64, f64)     = (0.0, 320.0);
const SPAWN_LANES:         [LaneId; 2]    = [-1, -2];
const COMMON_SPEED:        (f64, f64)     = (22.0, 30.0); // m/s
const TIME_GAP:            (f64, f64)     = (1.5, 3.0);   // s

const CAR: Dimensions = Dimensions { length: 4.5, width: 1.8, distance_reference_to_leading_edge: 3.5 };
const TRUCK: Dimensions = Dimensions { length: 12.0, width: 2.5, distance_reference_to_leading_edge: 10.0 };

// ── Logging ───────────────────────────────────────────────────────────────────

fn setup_logging() {
    use env_logger::{Builder, Env};
    Builder::from_env(Env::default().default_filter_or("info")).init();
}

// ── Population ────────────────────────────────────────────────────────────────

/// Pick the next spawn point in `range` for a car, or `None` once the range
/// is full.
fn plan_spawn<W: WorldQuery + ?Sized>(
    analyzer: &SpawnPointAnalyzer<'_, W>,
    range:    &LaneSpawningRange,
    name:     String,
    rng:      &mut AgentRng,
) -> Result<Option<(ObjectPlacement, SampledRoute)>> {
    let lane = range.lane_id;
    let route = analyzer.sample_route(MAIN, lane, rng)?;
    let desired = rng.uniform(COMMON_SPEED.0, COMMON_SPEED.1);
    let gap = rng.uniform(TIME_GAP.0, TIME_GAP.1);

    let Some(s) =
        analyzer.next_spawn_position(MAIN, lane, range.bounds(), &CAR, desired, gap, &route, &LaneType::DRIVABLE)
    else {
        return Ok(None);
    };
    if !analyzer.are_spawning_coordinates_valid(MAIN, lane, s, 0.0, &route, &CAR) {
        return Ok(None);
    }
    let speed = analyzer.spawn_velocity_to_prevent_crashing(lane, s, &CAR, desired, &route);
    if [Direction::Forward, Direction::Backward]
        .into_iter()
        .any(|direction| analyzer.spawn_will_cause_crash(lane, s, &CAR, speed, direction, &route))
    {
        return Ok(None);
    }
    let placement = ObjectPlacement::new(name, AgentCategory::Common, MAIN, lane, s, CAR).speed(speed);
    Ok(Some((placement, route)))
}

/// Fill the spawn area and return the route sampled for every new agent.
fn populate(world: &mut Scenery) -> Result<Vec<(ObjectId, SampledRoute)>> {
    let ranges = SpawnPointAnalyzer::new(&*world).valid_lane_spawning_ranges(
        MAIN,
        SPAWN_AREA.0,
        SPAWN_AREA.1,
        &SPAWN_LANES,
        &LaneType::DRIVABLE,
    );
    info!("{} spawning ranges on {MAIN}", ranges.len());

    let mut spawned = Vec::new();
    for range in &ranges {
        for _ in 0..MAX_SPAWNS_PER_LANE {
            let id = ObjectId(world.objects().len() as u32);
            let mut rng = AgentRng::new(SEED, id);
            let planned = {
                let analyzer = SpawnPointAnalyzer::new(&*world);
                plan_spawn(&analyzer, range, format!("common-{}", id.0), &mut rng)?
            };
            let Some((placement, route)) = planned else {
                break;
            };
            info!(
                "spawned {} on {MAIN}:{} at s = {:.1} with {:.1} m/s",
                placement.name, placement.lane, placement.s, placement.speed
            );
            spawned.push((world.place(placement)?, route));
        }
    }
    Ok(spawned)
}

// ── Detectors ─────────────────────────────────────────────────────────────────

fn detectors() -> Result<Vec<ConditionalDetector>> {
    let closing_in = DetectorDefinition {
        actors: ActorInformation { triggering_agents_as_actors: true, actors: vec![] },
        ..DetectorDefinition::new("ego_closing_in", vec![Condition::time_to_collision(
            vec!["ego".into()],
            "truck",
            4.0,
            Rule::LessThan,
        )])
    };
    let tailgating = DetectorDefinition {
        max_executions: Some(5),
        ..DetectorDefinition::new("ego_tailgating", vec![
            Condition::simulation_time(Rule::GreaterThan, 2.0)?,
            Condition::time_headway(vec!["ego".into()], "truck", 1.0, true, Rule::LessThan),
        ])
    };
    let exit_taken = DetectorDefinition {
        max_executions: None,
        ..DetectorDefinition::new("exit_taken", vec![Condition::reach_position(vec![], EXIT, 10.0, 5.0)?])
    };
    Ok([closing_in, tailgating, exit_taken].into_iter().map(ConditionalDetector::new).collect())
}

/// A closing ego matches the truck's speed.
fn react(world: &mut Scenery, event: &TriggerEvent) -> Result<()> {
    if event.sequence_name != "ego_closing_in" {
        return Ok(());
    }
    let Some(truck_speed) = world.object_by_name("truck").map(|t| t.absolute_velocity()) else {
        return Ok(());
    };
    for &id in &event.acting {
        world.set_speed(id, truck_speed)?;
    }
    Ok(())
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    setup_logging();

    // 1. Road network.
    let mut world = build_highway()?;
    let network = world.network();
    info!("highway: {} route elements, {} connections", network.vertex_count(), network.edge_count());

    // 2. Scenario vehicles.
    let ego = world.place(ObjectPlacement::new("ego", AgentCategory::Ego, MAIN, -1, 30.0, CAR).speed(28.0))?;
    let truck = world.place(ObjectPlacement::new("truck", AgentCategory::Scenario, MAIN, -1, 160.0, TRUCK).speed(18.0))?;

    // 3. Common traffic.
    let mut routes = populate(&mut world)?;
    for (id, lane) in [(ego, -1), (truck, -1)] {
        let mut rng = AgentRng::new(SEED, id);
        routes.push((id, SpawnPointAnalyzer::new(&world).sample_route(MAIN, lane, &mut rng)?));
    }
    info!("{} agents on the road", world.agents().len());

    // 4. Route state per agent.
    let mut egos = BTreeMap::new();
    for (id, route) in routes {
        let mut agent = EgoAgent::new(id);
        let (root, target) = (route.root(), route.target);
        agent.set_road_graph(&world, route.view, root, target)?;
        egos.insert(id, agent);
    }

    // 5. Step.
    let mut detectors = detectors()?;
    let mut clock = SimClock::default();
    let mut events = Vec::new();
    for _ in 0..SIM_STEPS {
        for id in world.advance(clock.cycle_secs())? {
            warn!("object {id} ran out of road");
        }
        clock.advance();
        for agent in egos.values_mut() {
            let was_valid = agent.status() == RouteStatus::Valid;
            agent.update(&world);
            if was_valid && agent.status() == RouteStatus::Invalid {
                warn!("{} left its route at {}", agent.agent_id(), clock.now());
            }
        }

        let mut fired = Vec::new();
        let ctx = ConditionContext::new(&world, &egos, clock.now());
        for detector in &mut detectors {
            if let Some(event) = detector.trigger(&ctx)? {
                fired.push(event);
            }
        }
        for event in &fired {
            info!("{} fired at {}: triggering {:?}", event.sequence_name, event.time, event.triggering);
            react(&mut world, event)?;
        }
        events.extend(fired);
    }

    info!("simulated {:.1} s with {} events", clock.now().as_secs_f64(), events.len());
    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}
