//! Condition error type.

use thiserror::Error;

use tq_core::CoreError;

/// Scenario configuration errors.  These are fatal: a scenario that names
/// an unknown rule or a missing entity cannot be run meaningfully.
#[derive(Debug, Error)]
pub enum ConditionError {
    #[error("unknown comparison rule '{0}'")]
    UnknownRule(String),

    #[error("reference entity '{entity}' of {condition} condition does not exist")]
    MissingReferenceEntity { condition: &'static str, entity: String },

    #[error("{condition} tolerance must be >= 0, got {value}")]
    NegativeTolerance { condition: &'static str, value: f64 },

    #[error("reach-position target s must be >= 0, got {0}")]
    NegativeTargetS(f64),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ConditionResult<T> = Result<T, ConditionError>;
