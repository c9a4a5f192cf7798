//! Rule configuration as supplied by the rule-activation mechanism.
//! Loaded from YAML; field names match the game's prototype files (camelCase).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::rule::evaluator::DEFAULT_RITUAL_QUORUM;
use crate::rule::selector::SelectionPolicy;

pub const CULTISTS_RULE_ID: &str = "Cultists";
pub const DEFAULT_CONFIG_PATH: &str = "data/rules/cultists.yaml";

/// What the activation mechanism hands a rule. Rules other than the cult one are kept
/// only so a mismatch can be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleConfiguration {
    Cultists(CultistsConfig),
    Other { id: String },
}

#[derive(Debug, Deserialize)]
struct RuleHeader {
    id: String,
}

impl RuleConfiguration {
    pub fn id(&self) -> &str {
        match self {
            Self::Cultists(_) => CULTISTS_RULE_ID,
            Self::Other { id } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CultistsConfig {
    pub min_players: usize,
    pub players_per_cultist: usize,
    pub min_cultists: usize,
    pub max_cultists: usize,
    /// Survivors at round end beyond which the round is flagged as too large to resolve.
    pub ritual_quorum: usize,
    pub narsi_rises_sound: Option<String>,
    pub i_am_here_sound: Option<String>,
    pub greeting_sound: Option<String>,
    /// Draft late-joining players while the faction is below quota.
    pub late_join: bool,
}

impl Default for CultistsConfig {
    fn default() -> Self {
        Self {
            min_players: 0,
            players_per_cultist: 10,
            min_cultists: 2,
            max_cultists: 10,
            ritual_quorum: DEFAULT_RITUAL_QUORUM,
            narsi_rises_sound: Some("/Audio/CultSounds/narsie_rises.ogg".to_string()),
            i_am_here_sound: Some("/Audio/CultSounds/i_am_here.ogg".to_string()),
            greeting_sound: Some("/Audio/CultSounds/fart.ogg".to_string()),
            late_join: false,
        }
    }
}

impl CultistsConfig {
    pub fn selection_policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            players_per_member: self.players_per_cultist,
            min_members: self.min_cultists,
            max_members: self.max_cultists,
        }
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        if self.players_per_cultist == 0 {
            return Err(RuleError::InvalidConfig {
                field: "playersPerCultist",
                message: "must be at least 1".to_string(),
            });
        }
        if self.min_cultists > self.max_cultists {
            return Err(RuleError::InvalidConfig {
                field: "minCultists",
                message: format!(
                    "{} exceeds maxCultists {}",
                    self.min_cultists, self.max_cultists
                ),
            });
        }
        if self.ritual_quorum == 0 {
            return Err(RuleError::InvalidConfig {
                field: "ritualQuorum",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

pub fn parse_rule_configuration(raw: &str, path: &Path) -> Result<RuleConfiguration, RuleError> {
    let parse_error = |source| RuleError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let value: serde_yaml::Value = serde_yaml::from_str(raw).map_err(parse_error)?;
    let header: RuleHeader = serde_yaml::from_value(value.clone()).map_err(parse_error)?;
    if header.id != CULTISTS_RULE_ID {
        return Ok(RuleConfiguration::Other { id: header.id });
    }
    let config = serde_yaml::from_value(value).map_err(parse_error)?;
    Ok(RuleConfiguration::Cultists(config))
}

/// Load a rule configuration file. Cult configurations are validated before returning.
pub fn load_rule_configuration(path: impl AsRef<Path>) -> Result<RuleConfiguration, RuleError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| RuleError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_rule_configuration(&raw, path)?;
    if let RuleConfiguration::Cultists(cult) = &config {
        cult.validate()?;
    }
    Ok(config)
}

/// Cult configuration from `path`, or defaults when the file does not exist.
pub fn load_cultists_config_or_default(path: impl AsRef<Path>) -> Result<CultistsConfig, RuleError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(CultistsConfig::default());
    }
    match load_rule_configuration(path)? {
        RuleConfiguration::Cultists(config) => Ok(config),
        RuleConfiguration::Other { id } => Err(RuleError::ConfigMismatch {
            expected: CULTISTS_RULE_ID,
            found: id,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let raw = "id: Cultists\nminPlayers: 15\nmaxCultists: 6\n";
        let parsed = parse_rule_configuration(raw, Path::new("inline.yaml")).unwrap();
        let RuleConfiguration::Cultists(config) = parsed else {
            panic!("expected cult configuration");
        };
        assert_eq!(config.min_players, 15);
        assert_eq!(config.max_cultists, 6);
        assert_eq!(config.players_per_cultist, 10);
        assert_eq!(config.ritual_quorum, 9);
        assert!(!config.late_join);
    }

    #[test]
    fn other_rule_ids_parse_as_other() {
        let raw = "id: Nukeops\nminPlayers: 20\n";
        let parsed = parse_rule_configuration(raw, Path::new("inline.yaml")).unwrap();
        assert_eq!(parsed.id(), "Nukeops");
        assert!(matches!(parsed, RuleConfiguration::Other { .. }));
    }

    #[test]
    fn malformed_cult_fields_are_parse_errors() {
        let raw = "id: Cultists\nminPlayers: lots\n";
        let parsed = parse_rule_configuration(raw, Path::new("inline.yaml"));
        assert!(matches!(parsed, Err(RuleError::Parse { .. })));
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let config = CultistsConfig {
            min_cultists: 5,
            max_cultists: 3,
            ..CultistsConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RuleError::InvalidConfig { field: "minCultists", .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_ratio() {
        let config = CultistsConfig {
            players_per_cultist: 0,
            ..CultistsConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
