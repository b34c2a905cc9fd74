//! Result data types.

use serde::{Deserialize, Serialize};
use sp_sim::{SolutionTrace, TraceEvent};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    /// Name of the run configuration
    pub config_name: String,
    pub timestamp: String,
    pub solver_version: String,
    pub summary: RunSummary,
    #[serde(default)]
    pub events: Vec<TraceEvent>,
}

impl RunManifest {
    /// Manifest for a finished run, stamped with the current UTC time.
    pub fn for_trace(
        run_id: RunId,
        config_name: &str,
        solver_version: &str,
        trace: &SolutionTrace,
    ) -> Self {
        Self {
            run_id,
            config_name: config_name.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            solver_version: solver_version.to_string(),
            summary: RunSummary::from_trace(trace),
            events: trace.events().to_vec(),
        }
    }
}

/// Headline numbers of a finished run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub samples: usize,
    pub cycles: usize,
    pub t_end_s: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_voltage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_temp_k: Option<f64>,
    /// Discharge capacity per cycle [A h]
    pub discharge_capacities: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_sei_thickness_m: Option<f64>,
}

impl RunSummary {
    pub fn from_trace(trace: &SolutionTrace) -> Self {
        let last = trace.last();
        Self {
            samples: trace.len(),
            cycles: trace.cycle_numbers().len(),
            t_end_s: last.map_or(0.0, |s| s.t),
            final_voltage: last.map(|s| s.voltage),
            final_temp_k: last.map(|s| s.temp_k),
            discharge_capacities: trace.discharge_capacities(),
            final_sei_thickness_m: last.and_then(|s| s.sei_thickness),
        }
    }
}
