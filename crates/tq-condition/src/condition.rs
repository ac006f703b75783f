//! The six trigger conditions.
//!
//! By-entity conditions resolve their triggering entities by name (all
//! agents if none are named), compute one scalar per agent and keep the
//! agents for which `check_equation(scalar, target, rule)` holds.  The
//! by-value condition compares the simulation clock.
//!
//! Parameters are validated at construction and immutable afterwards.

use std::collections::BTreeMap;

use log::debug;

use tq_core::{LaneId, ObjectId, SimTime, WorldObject};
use tq_ego::EgoAgent;
use tq_kinematics::{object_ttc, TtcConfig, NO_COLLISION};
use tq_road::WorldQuery;

use crate::{check_equation, ConditionError, ConditionResult, Rule};

// ── Context and outcome ───────────────────────────────────────────────────────

/// Everything a condition may look at in one step.
pub struct ConditionContext<'a, W: WorldQuery + ?Sized> {
    pub world: &'a W,
    /// Route state per agent, needed for headway along the agent's way.
    pub egos:  &'a BTreeMap<ObjectId, EgoAgent>,
    pub time:  SimTime,
}

impl<'a, W: WorldQuery + ?Sized> ConditionContext<'a, W> {
    pub fn new(world: &'a W, egos: &'a BTreeMap<ObjectId, EgoAgent>, time: SimTime) -> Self {
        Self { world, egos, time }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum ConditionOutcome {
    /// Triggering agents that satisfy a by-entity condition, by id.
    Agents(Vec<ObjectId>),
    /// Result of a by-value condition.
    Value(bool),
}

impl ConditionOutcome {
    pub fn is_met(&self) -> bool {
        match self {
            ConditionOutcome::Agents(ids) => !ids.is_empty(),
            ConditionOutcome::Value(met) => *met,
        }
    }
}

// ── Parameters ────────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeToCollision {
    triggering: Vec<String>,
    reference:  String,
    target_ttc: f64,
    rule:       Rule,
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeHeadway {
    triggering: Vec<String>,
    reference:  String,
    target_thw: f64,
    /// Net distance between bounding boxes instead of reference points.
    free_space: bool,
    rule:       Rule,
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelativeSpeed {
    triggering: Vec<String>,
    reference:  String,
    value:      f64,
    rule:       Rule,
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReachPosition {
    triggering: Vec<String>,
    road:       String,
    target_s:   f64,
    tolerance:  f64,
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelativeLane {
    triggering: Vec<String>,
    reference:  String,
    delta_lane: LaneId,
    delta_s:    f64,
    tolerance:  f64,
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationTime {
    rule:   Rule,
    target: SimTime,
}

/// A scenario trigger condition.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Condition {
    TimeToCollision(TimeToCollision),
    TimeHeadway(TimeHeadway),
    RelativeSpeed(RelativeSpeed),
    ReachPosition(ReachPosition),
    RelativeLane(RelativeLane),
    SimulationTime(SimulationTime),
}

// ── Construction ──────────────────────────────────────────────────────────────

impl Condition {
    pub fn time_to_collision(
        triggering: Vec<String>,
        reference:  impl Into<String>,
        target_ttc: f64,
        rule:       Rule,
    ) -> Self {
        Condition::TimeToCollision(TimeToCollision { triggering, reference: reference.into(), target_ttc, rule })
    }

    pub fn time_headway(
        triggering: Vec<String>,
        reference:  impl Into<String>,
        target_thw: f64,
        free_space: bool,
        rule:       Rule,
    ) -> Self {
        Condition::TimeHeadway(TimeHeadway {
            triggering,
            reference: reference.into(),
            target_thw,
            free_space,
            rule,
        })
    }

    pub fn relative_speed(triggering: Vec<String>, reference: impl Into<String>, value: f64, rule: Rule) -> Self {
        Condition::RelativeSpeed(RelativeSpeed { triggering, reference: reference.into(), value, rule })
    }

    /// Fails on a negative `target_s` or `tolerance`.
    pub fn reach_position(
        triggering: Vec<String>,
        road:       impl Into<String>,
        target_s:   f64,
        tolerance:  f64,
    ) -> ConditionResult<Self> {
        if target_s < 0.0 {
            return Err(ConditionError::NegativeTargetS(target_s));
        }
        if tolerance < 0.0 {
            return Err(ConditionError::NegativeTolerance { condition: "ReachPosition", value: tolerance });
        }
        Ok(Condition::ReachPosition(ReachPosition { triggering, road: road.into(), target_s, tolerance }))
    }

    /// Fails on a negative `tolerance`.
    pub fn relative_lane(
        triggering: Vec<String>,
        reference:  impl Into<String>,
        delta_lane: LaneId,
        delta_s:    f64,
        tolerance:  f64,
    ) -> ConditionResult<Self> {
        if tolerance < 0.0 {
            return Err(ConditionError::NegativeTolerance { condition: "RelativeLane", value: tolerance });
        }
        Ok(Condition::RelativeLane(RelativeLane {
            triggering,
            reference: reference.into(),
            delta_lane,
            delta_s,
            tolerance,
        }))
    }

    /// The target is kept in whole milliseconds, truncated.
    pub fn simulation_time(rule: Rule, target_secs: f64) -> ConditionResult<Self> {
        let target = SimTime::from_secs_truncated(target_secs)?;
        Ok(Condition::SimulationTime(SimulationTime { rule, target }))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Condition::TimeToCollision(_) => "TimeToCollision",
            Condition::TimeHeadway(_)     => "TimeHeadway",
            Condition::RelativeSpeed(_)   => "RelativeSpeed",
            Condition::ReachPosition(_)   => "ReachPosition",
            Condition::RelativeLane(_)    => "RelativeLane",
            Condition::SimulationTime(_)  => "SimulationTime",
        }
    }

    /// Whether the condition reports agents rather than a single value.
    pub fn is_by_entity(&self) -> bool {
        !matches!(self, Condition::SimulationTime(_))
    }

    /// Target time of a `SimulationTime` condition.
    pub fn target_time(&self) -> Option<SimTime> {
        match self {
            Condition::SimulationTime(c) => Some(c.target),
            _ => None,
        }
    }
}

// ── Evaluation ────────────────────────────────────────────────────────────────

impl Condition {
    /// Evaluate against the current step.
    pub fn is_met<W: WorldQuery + ?Sized>(&self, ctx: &ConditionContext<'_, W>) -> ConditionResult<ConditionOutcome> {
        let agents = match self {
            Condition::TimeToCollision(c) => c.met_by(ctx)?,
            Condition::TimeHeadway(c) => c.met_by(ctx)?,
            Condition::RelativeSpeed(c) => c.met_by(ctx)?,
            Condition::ReachPosition(c) => c.met_by(ctx),
            Condition::RelativeLane(c) => c.met_by(ctx)?,
            Condition::SimulationTime(c) => {
                let met = check_equation(ctx.time.millis() as f64, c.target.millis() as f64, c.rule);
                return Ok(ConditionOutcome::Value(met));
            }
        };
        Ok(ConditionOutcome::Agents(agents))
    }
}

/// Named agents, or every agent if no name is given.  Unknown names are
/// skipped.
fn triggering_agents<'w, W: WorldQuery + ?Sized>(world: &'w W, names: &[String]) -> Vec<&'w WorldObject> {
    if names.is_empty() {
        return world.agents();
    }
    names
        .iter()
        .filter_map(|name| {
            let found = world.object_by_name(name).filter(|o| o.is_agent());
            if found.is_none() {
                debug!("triggering entity '{name}' is not in the world");
            }
            found
        })
        .collect()
}

fn reference_entity<'w, W: WorldQuery + ?Sized>(
    world:     &'w W,
    condition: &'static str,
    name:      &str,
) -> ConditionResult<&'w WorldObject> {
    world
        .object_by_name(name)
        .ok_or_else(|| ConditionError::MissingReferenceEntity { condition, entity: name.to_string() })
}

impl TimeToCollision {
    fn met_by<W: WorldQuery + ?Sized>(&self, ctx: &ConditionContext<'_, W>) -> ConditionResult<Vec<ObjectId>> {
        let reference = reference_entity(ctx.world, "TimeToCollision", &self.reference)?;
        let agents = triggering_agents(ctx.world, &self.triggering);
        let config = TtcConfig::default();
        // Horizon reaches one step past the target.
        let max_ttc = self.target_ttc + config.time_step_ms / 1000.0;
        let ttcs = ttc_values(&agents, reference, max_ttc, &config);
        Ok(agents
            .iter()
            .zip(ttcs)
            .filter(|(_, ttc)| check_equation(*ttc, self.target_ttc, self.rule))
            .map(|(agent, _)| agent.id)
            .collect())
    }
}

#[cfg(not(feature = "parallel"))]
fn ttc_values(agents: &[&WorldObject], reference: &WorldObject, max_ttc: f64, config: &TtcConfig) -> Vec<f64> {
    agents
        .iter()
        .map(|agent| object_ttc(agent, reference, max_ttc, config).unwrap_or(NO_COLLISION))
        .collect()
}

#[cfg(feature = "parallel")]
fn ttc_values(agents: &[&WorldObject], reference: &WorldObject, max_ttc: f64, config: &TtcConfig) -> Vec<f64> {
    use rayon::prelude::*;

    agents
        .par_iter()
        .map(|agent| object_ttc(agent, reference, max_ttc, config).unwrap_or(NO_COLLISION))
        .collect()
}

impl TimeHeadway {
    /// Agents without route state, or whose way does not reach the
    /// reference entity, are skipped.
    fn met_by<W: WorldQuery + ?Sized>(&self, ctx: &ConditionContext<'_, W>) -> ConditionResult<Vec<ObjectId>> {
        let reference = reference_entity(ctx.world, "TimeHeadway", &self.reference)?;
        let mut met = Vec::new();
        for agent in triggering_agents(ctx.world, &self.triggering) {
            let Some(ego) = ctx.egos.get(&agent.id) else {
                debug!("agent {} has no route state, headway skipped", agent.id);
                continue;
            };
            let distance = match ego.distance_to_object(ctx.world, reference.id) {
                Ok(d) => d,
                Err(e) => {
                    debug!("headway of agent {} skipped: {e}", agent.id);
                    continue;
                }
            };
            let delta_s = if self.free_space { distance.net_distance } else { distance.reference_point };
            let Some(delta_s) = delta_s else { continue };
            let headway = delta_s / agent.longitudinal_velocity();
            if check_equation(headway, self.target_thw, self.rule) {
                met.push(agent.id);
            }
        }
        Ok(met)
    }
}

impl RelativeSpeed {
    fn met_by<W: WorldQuery + ?Sized>(&self, ctx: &ConditionContext<'_, W>) -> ConditionResult<Vec<ObjectId>> {
        let reference = reference_entity(ctx.world, "RelativeSpeed", &self.reference)?;
        let reference_speed = reference.absolute_velocity();
        Ok(triggering_agents(ctx.world, &self.triggering)
            .into_iter()
            .filter(|agent| check_equation(agent.absolute_velocity() - reference_speed, self.value, self.rule))
            .map(|agent| agent.id)
            .collect())
    }
}

impl ReachPosition {
    fn met_by<W: WorldQuery + ?Sized>(&self, ctx: &ConditionContext<'_, W>) -> Vec<ObjectId> {
        triggering_agents(ctx.world, &self.triggering)
            .into_iter()
            .filter(|agent| {
                agent
                    .position
                    .reference_point
                    .get(&self.road)
                    .is_some_and(|p| (self.target_s - p.s).abs() <= self.tolerance)
            })
            .map(|agent| agent.id)
            .collect()
    }
}

impl RelativeLane {
    fn met_by<W: WorldQuery + ?Sized>(&self, ctx: &ConditionContext<'_, W>) -> ConditionResult<Vec<ObjectId>> {
        let reference = reference_entity(ctx.world, "RelativeLane", &self.reference)?;
        let reference_points = &reference.position.reference_point;
        Ok(triggering_agents(ctx.world, &self.triggering)
            .into_iter()
            .filter(|agent| {
                agent.position.reference_point.iter().any(|(road, own)| {
                    reference_points.get(road).is_some_and(|other| {
                        own.lane_id == other.lane_id + self.delta_lane
                            && (other.s + self.delta_s - own.s).abs() <= self.tolerance
                    })
                })
            })
            .map(|agent| agent.id)
            .collect())
    }
}
