//! Resolver configuration.

use serde::{Deserialize, Serialize};

use crate::Result;

/// What to do when resolution hits a soft-failure branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Log a warning and resolve to no entity.
    #[default]
    Lenient,
    /// Return an error.
    Strict,
}

/// Resolve-or-create settings.
///
/// ```
/// use graph_ogm::{MatchPolicy, ResolverConfig};
///
/// let config = ResolverConfig::from_json(r#"{"on_ambiguous": "strict"}"#).unwrap();
/// assert_eq!(config.on_ambiguous, MatchPolicy::Strict);
/// assert_eq!(config.on_creation_failure, MatchPolicy::Lenient);
/// assert!(!config.create_if_not_existing);
/// assert!(!config.scope_to_target);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Create a new entity when no input value is given.
    pub create_if_not_existing: bool,
    /// Two or more matches for a single reference.
    pub on_ambiguous: MatchPolicy,
    /// The store declined to create an entity.
    pub on_creation_failure: MatchPolicy,
    /// Only match entities of the target type.
    pub scope_to_target: bool,
}

impl ResolverConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Both soft failures promoted to errors.
    pub fn strict(create_if_not_existing: bool) -> Self {
        Self {
            create_if_not_existing,
            on_ambiguous: MatchPolicy::Strict,
            on_creation_failure: MatchPolicy::Strict,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_lenient() {
        assert_eq!(ResolverConfig::from_json("{}").unwrap(), ResolverConfig::default());
        assert_eq!(ResolverConfig::default().on_ambiguous, MatchPolicy::Lenient);
    }

    #[test]
    fn test_round_trip_strict() {
        let config = ResolverConfig::strict(true);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ResolverConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_policy() {
        let err = ResolverConfig::from_json(r#"{"on_ambiguous": "sometimes"}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
