//! Optional planner configuration (`wayplan.toml`).
//!
//! Everything defaults: a missing or unreadable file simply yields the
//! compiled-in configuration, in line with the codec's "can't parse means
//! start fresh" policy.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Currency assumed for manually entered prices.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Comfort scalar seeded into a fresh traveler profile, 0.0..=1.0.
    #[serde(default = "default_comfort")]
    pub comfort_level: f64,
    /// Where durable state lives; `None` leaves the choice to the caller.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_comfort() -> f64 {
    0.5
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            currency: default_currency(),
            comfort_level: default_comfort(),
            storage_dir: None,
        }
    }
}

/// Read the config file, falling back to defaults when it is missing or
/// does not parse.
pub fn read_config(path: &Path) -> PlannerConfig {
    let Ok(text) = fs::read_to_string(path) else {
        return PlannerConfig::default();
    };
    match toml::from_str(&text) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "unreadable config; using defaults");
            PlannerConfig::default()
        }
    }
}
