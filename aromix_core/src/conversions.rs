//! `From` implementations bridging `aromix_config` types to
//! `aromix_core` types.
//!
//! These keep the CLI free of field-by-field mapping and keep the
//! persisted recipe schema decoupled from the in-memory type.

use crate::message::{Limits, OdorId};
use crate::recipe::Recipe;
use crate::runner::RunParams;

// ── Limits ───────────────────────────────────────────────────────────────────

impl From<&aromix_config::Limits> for Limits {
    fn from(c: &aromix_config::Limits) -> Self {
        Self {
            max_intensity: c.max_intensity,
            max_duration_s: c.max_duration_s,
        }
    }
}

// ── RunParams ────────────────────────────────────────────────────────────────

impl From<&aromix_config::Config> for RunParams {
    fn from(c: &aromix_config::Config) -> Self {
        Self {
            limits: (&c.limits).into(),
            monitor_update_ms: c.monitor.update_ms,
            comm_timeout_ms: c.monitor.comm_timeout_ms,
            status_period_ms: c.comm.status_period_ms,
            loop_delay_ms: c.runner.loop_delay_ms,
        }
    }
}

// ── Recipe rows ──────────────────────────────────────────────────────────────

impl From<&aromix_config::RecipeRow> for Recipe {
    fn from(row: &aromix_config::RecipeRow) -> Self {
        Self {
            odor: OdorId::new(row.odor_id),
            name: row.name.clone(),
            pump_ratios: row.pump_ratios,
            valve_states: row.valve_states,
            mixing_time_ms: row.mixing_time_ms,
            fan_speed: row.fan_speed,
        }
    }
}

impl From<&Recipe> for aromix_config::RecipeRow {
    fn from(recipe: &Recipe) -> Self {
        Self {
            odor_id: recipe.odor.raw(),
            name: recipe.name.clone(),
            pump_ratios: recipe.pump_ratios,
            valve_states: recipe.valve_states,
            mixing_time_ms: recipe.mixing_time_ms,
            fan_speed: recipe.fan_speed,
        }
    }
}
