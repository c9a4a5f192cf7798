pub mod config;

pub use config::{
    load_cultists_config_or_default, load_rule_configuration, parse_rule_configuration,
    CultistsConfig, RuleConfiguration, CULTISTS_RULE_ID, DEFAULT_CONFIG_PATH,
};
