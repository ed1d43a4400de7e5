//! Membership operator

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `in` keeps members, `not_in` keeps non-members
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    In,
    NotIn,
}

impl Operator {
    pub const ALL: [Operator; 2] = [Self::In, Self::NotIn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::NotIn => "not_in",
        }
    }

    /// Whether a contact with the given membership passes
    pub fn is_satisfied_by(&self, is_member: bool) -> bool {
        match self {
            Self::In => is_member,
            Self::NotIn => !is_member,
        }
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Self::In),
            "not_in" => Ok(Self::NotIn),
            other => Err(format!("unknown operator: {}", other)),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
