//! Scheduler configuration.
//!
//! Every field has a default so that a configuration file only needs to
//! mention what it changes:
//!
//! ```json
//! { "max_delay": 8, "explorer": { "usage_threshold": 2.0 } }
//! ```
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wiresched_ir::DelayInfo;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedConfig {
    /// Largest combinational delay allowed within one state.
    pub max_delay: u32,
    /// Blocks that need more states than this are infeasible.
    pub max_states: Option<usize>,
    /// Delay overrides per resource class name.
    pub class_delays: BTreeMap<String, u32>,
    pub explorer: ExplorerConfig,
}

impl Default for SchedConfig {
    fn default() -> Self {
        SchedConfig {
            max_delay: 10,
            max_states: None,
            class_delays: BTreeMap::new(),
            explorer: ExplorerConfig::default(),
        }
    }
}

impl SchedConfig {
    /// The [DelayInfo] described by this configuration.
    pub fn delay_info(&self) -> DelayInfo {
        let mut dinfo = DelayInfo::new(self.max_delay);
        for (class, delay) in &self.class_delays {
            dinfo.set_class_delay(class.as_str(), *delay);
        }
        dinfo
    }
}

/// Knobs of the wire plan search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExplorerConfig {
    /// A resource whose uses per replica exceed this gets another replica.
    pub usage_threshold: f64,
    /// Relative reduction of mux complexity a new plan must achieve to be
    /// accepted.
    pub min_improvement: f64,
    /// Number of plans evaluated before the search gives up.
    pub max_iterations: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        ExplorerConfig {
            usage_threshold: 4.0,
            min_improvement: 0.05,
            max_iterations: 16,
        }
    }
}
