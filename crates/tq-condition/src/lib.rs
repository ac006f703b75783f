//! `tq-condition` — scenario trigger conditions.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`rule`]      | `Rule`, `check_equation`, `EQUALITY_EPSILON`             |
//! | [`condition`] | `Condition` (six kinds), `ConditionContext`, outcomes    |
//! | [`detector`]  | `ConditionalDetector`, `DetectorDefinition`, events      |
//! | [`error`]     | `ConditionError`, `ConditionResult`                      |
//!
//! # Feature flags
//!
//! | Feature    | Effect                                                     |
//! |------------|------------------------------------------------------------|
//! | `parallel` | Per-agent TTC of a `TimeToCollision` condition on Rayon    |
//! | `serde`    | Serialize/Deserialize on rules, conditions and events      |

pub mod condition;
pub mod detector;
pub mod error;
pub mod rule;


pub use condition::{Condition, ConditionContext, ConditionOutcome};
pub use detector::{ActorInformation, ConditionalDetector, DetectorDefinition, TriggerEvent};
pub use error::{ConditionError, ConditionResult};
pub use rule::{check_equation, Rule, EQUALITY_EPSILON};
