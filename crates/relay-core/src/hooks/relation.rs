use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HookError;

/// Where a child hook runs relative to its parent's operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Before,
    Instead,
    After,
}

impl Relation {
    pub const ALL: [Relation; 3] = [Relation::Before, Relation::Instead, Relation::After];

    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Before => "before",
            Relation::Instead => "instead",
            Relation::After => "after",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relation::ALL
            .into_iter()
            .find(|relation| relation.as_str() == s)
            .ok_or_else(|| HookError::UnknownRelation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("before", Relation::Before)]
    #[case("instead", Relation::Instead)]
    #[case("after", Relation::After)]
    fn parses_known_relations(#[case] input: &str, #[case] expected: Relation) {
        assert_eq!(input.parse::<Relation>().unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[rstest]
    #[case("")]
    #[case("Before")]
    #[case("around")]
    fn rejects_unknown_relations(#[case] input: &str) {
        let err = input.parse::<Relation>().unwrap_err();
        assert!(matches!(err, HookError::UnknownRelation(ref name) if name == input));
    }
}
