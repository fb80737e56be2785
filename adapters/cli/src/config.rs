//! Match configuration loaded from TOML files.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::Deserialize;
use tower_siege_core::Rules;

/// Everything a headless match needs besides the seed.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MatchConfig {
    /// Rules shared by the planner and the world.
    pub(crate) rules: Rules,
    /// Tuning for the computer opponents.
    pub(crate) opponent: OpponentSettings,
}

/// Opponent tuning exposed through the configuration file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct OpponentSettings {
    /// Simulated time between two opponent decisions.
    pub(crate) decision_interval_ms: u64,
}

impl Default for OpponentSettings {
    fn default() -> Self {
        Self {
            decision_interval_ms: 1_000,
        }
    }
}

impl OpponentSettings {
    pub(crate) fn decision_interval(&self) -> Duration {
        Duration::from_millis(self.decision_interval_ms)
    }
}

/// Reads and validates a match configuration file.
pub(crate) fn load(path: &Path) -> Result<MatchConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read match config at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid match config at {}", path.display()))
}

fn parse(contents: &str) -> Result<MatchConfig> {
    let config: MatchConfig =
        toml::from_str(contents).context("failed to parse match config toml contents")?;
    config
        .rules
        .validate()
        .context("match rules are inconsistent")?;
    Ok(config)
}
