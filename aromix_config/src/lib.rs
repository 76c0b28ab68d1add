#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and recipe persistence for the scent receiver.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Custom recipes persist as a TOML document (`RecipeDoc`); the core
//!   crate converts rows to its own `Recipe` type.

use serde::{Deserialize, Serialize};

/// Bounds applied to inbound commands.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Limits {
    /// Maximum accepted intensity (percent).
    pub max_intensity: u8,
    /// Maximum accepted generation duration in seconds.
    pub max_duration_s: u16,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_intensity: 100,
            max_duration_s: 300,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct MonitorCfg {
    /// Period between monitor refreshes (ms).
    pub update_ms: u64,
    /// Link considered inactive after this many ms without a frame.
    pub comm_timeout_ms: u64,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            update_ms: 100,
            comm_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct CommCfg {
    /// Period between unsolicited status push frames (ms).
    pub status_period_ms: u64,
}

impl Default for CommCfg {
    fn default() -> Self {
        Self {
            status_period_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Transport owned by a background pump thread; commands arrive
    /// through the depth-1 inlet.
    #[default]
    Queued,
    /// Transport polled inline from the control loop.
    Direct,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct RunnerCfg {
    /// Default link orchestration mode: "queued" or "direct"
    pub mode: LinkMode,
    /// Main control-loop delay between iterations (ms).
    pub loop_delay_ms: u64,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            mode: LinkMode::Queued,
            loop_delay_ms: 10,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Recipes {
    /// Path to the persisted custom recipe TOML; in-memory only when absent.
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub limits: Limits,
    pub monitor: MonitorCfg,
    pub comm: CommCfg,
    pub runner: RunnerCfg,
    pub logging: Logging,
    pub recipes: Recipes,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Limits
        if self.limits.max_intensity == 0 || self.limits.max_intensity > 100 {
            eyre::bail!("limits.max_intensity must be in 1..=100");
        }
        if self.limits.max_duration_s == 0 {
            eyre::bail!("limits.max_duration_s must be >= 1");
        }
        if self.limits.max_duration_s > 3600 {
            eyre::bail!("limits.max_duration_s is unreasonably large (>1h)");
        }

        // Monitor
        if self.monitor.update_ms == 0 {
            eyre::bail!("monitor.update_ms must be >= 1");
        }
        if self.monitor.comm_timeout_ms == 0 {
            eyre::bail!("monitor.comm_timeout_ms must be >= 1");
        }
        if self.monitor.comm_timeout_ms > 24 * 60 * 60 * 1000 {
            eyre::bail!("monitor.comm_timeout_ms is unreasonably large (>24h)");
        }

        // Comm
        if self.comm.status_period_ms == 0 {
            eyre::bail!("comm.status_period_ms must be >= 1");
        }

        // Runner
        if self.runner.loop_delay_ms == 0 {
            eyre::bail!("runner.loop_delay_ms must be >= 1");
        }
        if self.runner.loop_delay_ms > 1000 {
            eyre::bail!("runner.loop_delay_ms is unreasonably large (>1s)");
        }

        Ok(())
    }
}

/// One persisted custom recipe.
///
/// Field bounds mirror the core `Recipe` type; conversion lives in
/// `aromix_core::conversions` so this crate stays schema-only.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RecipeRow {
    pub odor_id: u8,
    pub name: String,
    pub pump_ratios: [u8; 5],
    pub valve_states: [bool; 5],
    pub mixing_time_ms: u32,
    pub fan_speed: u8,
}

/// On-disk document wrapping the custom recipe set.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct RecipeDoc {
    #[serde(default, rename = "recipe")]
    pub recipes: Vec<RecipeRow>,
}

pub fn load_recipes(path: &std::path::Path) -> eyre::Result<Vec<RecipeRow>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read recipe file {:?}: {}", path, e))?;
    let doc: RecipeDoc =
        toml::from_str(&text).map_err(|e| eyre::eyre!("parse recipe file {:?}: {}", path, e))?;
    Ok(doc.recipes)
}

pub fn save_recipes(path: &std::path::Path, rows: &[RecipeRow]) -> eyre::Result<()> {
    let doc = RecipeDoc {
        recipes: rows.to_vec(),
    };
    let text = toml::to_string_pretty(&doc)
        .map_err(|e| eyre::eyre!("serialize recipe file: {}", e))?;
    std::fs::write(path, text).map_err(|e| eyre::eyre!("write recipe file {:?}: {}", path, e))?;
    Ok(())
}
