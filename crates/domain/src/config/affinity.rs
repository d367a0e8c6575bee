use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session affinity
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffinityConfig {
    /// Serialize the read-decide-write section per identifier inside this
    /// process, so concurrent requests mint at most one remote session.
    #[serde(default = "d_true")]
    pub single_flight: bool,
}

impl Default for AffinityConfig {
    fn default() -> Self {
        Self {
            single_flight: true,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Maintenance
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MaintenanceConfig {
    /// Flush the whole store on this interval.  Disabled when `None`.
    #[serde(default)]
    pub sweep_interval_secs: Option<u64>,
}

fn d_true() -> bool {
    true
}
