//! Comparison rules.

use std::fmt;
use std::str::FromStr;

use crate::ConditionError;

/// Absolute difference below which two values count as equal.
pub const EQUALITY_EPSILON: f64 = 1e-12;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum Rule {
    LessThan,
    EqualTo,
    GreaterThan,
}

/// `lhs <rule> rhs`, with `EqualTo` tolerant to [`EQUALITY_EPSILON`].
#[inline]
pub fn check_equation(lhs: f64, rhs: f64, rule: Rule) -> bool {
    match rule {
        Rule::LessThan    => lhs < rhs,
        Rule::EqualTo     => (lhs - rhs).abs() < EQUALITY_EPSILON,
        Rule::GreaterThan => lhs > rhs,
    }
}

impl Rule {
    pub fn as_str(self) -> &'static str {
        match self {
            Rule::LessThan    => "lessThan",
            Rule::EqualTo     => "equalTo",
            Rule::GreaterThan => "greaterThan",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rule {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lessThan"    => Ok(Rule::LessThan),
            "equalTo"     => Ok(Rule::EqualTo),
            "greaterThan" => Ok(Rule::GreaterThan),
            other => Err(ConditionError::UnknownRule(other.to_string())),
        }
    }
}
