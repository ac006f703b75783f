//! Conditional event detector.
//!
//! Evaluates a conjunction of conditions once per step.  By-entity
//! conditions narrow a shared set of triggering agents; the detector fires
//! only if every by-value condition holds and the set stays non-empty.

use log::debug;

use tq_core::{ObjectId, SimTime};
use tq_road::WorldQuery;

use crate::{Condition, ConditionContext, ConditionOutcome, ConditionResult};

/// Who is acted upon when the detector fires.
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorInformation {
    pub triggering_agents_as_actors: bool,
    /// Additional actors, by name.  Unknown names are skipped.
    pub actors: Vec<String>,
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectorDefinition {
    pub sequence_name:  String,
    pub conditions:     Vec<Condition>,
    pub actors:         ActorInformation,
    /// `None` fires without limit.
    pub max_executions: Option<u32>,
}

impl DetectorDefinition {
    pub fn new(sequence_name: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Self {
            sequence_name: sequence_name.into(),
            conditions,
            actors: ActorInformation::default(),
            max_executions: Some(1),
        }
    }
}

/// Emitted each time a detector fires.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriggerEvent {
    pub time:          SimTime,
    pub sequence_name: String,
    /// Sorted by id.
    pub triggering:    Vec<ObjectId>,
    pub acting:        Vec<ObjectId>,
}

pub struct ConditionalDetector {
    definition: DetectorDefinition,
    executions: u32,
}

impl ConditionalDetector {
    pub fn new(definition: DetectorDefinition) -> Self {
        Self { definition, executions: 0 }
    }

    pub fn definition(&self) -> &DetectorDefinition {
        &self.definition
    }

    #[inline]
    pub fn executions(&self) -> u32 {
        self.executions
    }

    /// Forget past executions.
    pub fn reset(&mut self) {
        self.executions = 0;
    }

    pub fn is_below_maximum_executions(&self) -> bool {
        self.definition.max_executions.is_none_or(|max| self.executions < max)
    }

    /// Evaluate all conditions at `ctx.time` and fire if they hold.
    ///
    /// Returns the event emitted, if any.  A configuration error in any
    /// condition is returned as is; evaluation stops at the first condition
    /// that is not met.
    pub fn trigger<W: WorldQuery + ?Sized>(
        &mut self,
        ctx: &ConditionContext<'_, W>,
    ) -> ConditionResult<Option<TriggerEvent>> {
        if !self.is_below_maximum_executions() {
            return Ok(None);
        }
        let Some(triggering) = self.evaluate(ctx)? else {
            return Ok(None);
        };

        let acting = self.actors(ctx.world, &triggering);
        self.executions += 1;
        debug!(
            "sequence '{}' triggered at {} by {:?}, acting {:?}",
            self.definition.sequence_name, ctx.time, triggering, acting
        );
        Ok(Some(TriggerEvent {
            time: ctx.time,
            sequence_name: self.definition.sequence_name.clone(),
            triggering,
            acting,
        }))
    }

    /// Agents meeting every by-entity condition, or `None` if any condition
    /// fails.
    fn evaluate<W: WorldQuery + ?Sized>(&self, ctx: &ConditionContext<'_, W>) -> ConditionResult<Option<Vec<ObjectId>>> {
        let mut triggering: Option<Vec<ObjectId>> = None;
        for condition in &self.definition.conditions {
            match condition.is_met(ctx)? {
                ConditionOutcome::Value(true) => {}
                ConditionOutcome::Value(false) => return Ok(None),
                ConditionOutcome::Agents(mut met) => {
                    met.sort_unstable();
                    met.dedup();
                    let narrowed = match triggering {
                        None => met,
                        Some(previous) => previous.into_iter().filter(|id| met.binary_search(id).is_ok()).collect(),
                    };
                    if narrowed.is_empty() {
                        return Ok(None);
                    }
                    triggering = Some(narrowed);
                }
            }
        }
        Ok(Some(triggering.unwrap_or_default()))
    }

    fn actors<W: WorldQuery + ?Sized>(&self, world: &W, triggering: &[ObjectId]) -> Vec<ObjectId> {
        let info = &self.definition.actors;
        let mut acting = if info.triggering_agents_as_actors { triggering.to_vec() } else { Vec::new() };
        for name in &info.actors {
            match world.object_by_name(name) {
                Some(object) if !acting.contains(&object.id) => acting.push(object.id),
                Some(_) => {}
                None => debug!("actor '{name}' is not in the world"),
            }
        }
        acting
    }
}
