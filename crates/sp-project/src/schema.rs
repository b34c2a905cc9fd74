//! Run configuration schema.

use serde::{Deserialize, Serialize};
use sp_cell::{CellParams, OcpKind};
use sp_sim::{CvSettings, DegradationConfig, PolynomialOrder, ProtocolPreset, StepKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub version: u32,
    pub name: String,
    pub cell: CellDef,
    #[serde(default)]
    pub solver: SolverDef,
    pub protocol: ProtocolDef,
}

/// Cell definition: a named preset, or explicit parameters with OCP curves.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CellDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<CellParams>,
    /// Initial positive electrode SOC; the preset default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soc_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soc_n: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    /// Overrides the preset's positive OCP curve
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocp_positive: Option<OcpKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocp_negative: Option<OcpKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MethodDef {
    Eigen {
        #[serde(default = "default_n_terms")]
        n_terms: usize,
    },
    CrankNicolson {
        #[serde(default = "default_grid_points")]
        grid_points: usize,
        /// Solve through dense LU instead of the Thomas sweep
        #[serde(default)]
        dense: bool,
    },
    Polynomial {
        #[serde(default)]
        order: PolynomialOrder,
    },
}

impl Default for MethodDef {
    fn default() -> Self {
        MethodDef::Eigen {
            n_terms: default_n_terms(),
        }
    }
}

fn default_n_terms() -> usize {
    5
}

fn default_grid_points() -> usize {
    100
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminationDef {
    #[default]
    Voltage,
    Soc,
    Time {
        duration_s: f64,
    },
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepFailureDef {
    #[default]
    AbortStep,
    AbortRun,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolverDef {
    #[serde(default = "default_dt")]
    pub dt_s: f64,
    #[serde(default)]
    pub method: MethodDef,
    #[serde(default = "default_true")]
    pub isothermal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degradation: Option<DegradationConfig>,
    #[serde(default)]
    pub termination: TerminationDef,
    #[serde(default)]
    pub strict_thresholds: bool,
    #[serde(default)]
    pub on_step_failure: StepFailureDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations_per_step: Option<usize>,
}

impl Default for SolverDef {
    fn default() -> Self {
        Self {
            dt_s: default_dt(),
            method: MethodDef::default(),
            isothermal: true,
            degradation: None,
            termination: TerminationDef::default(),
            strict_thresholds: false,
            on_step_failure: StepFailureDef::default(),
            max_iterations_per_step: None,
        }
    }
}

fn default_dt() -> f64 {
    0.1
}

fn default_true() -> bool {
    true
}

/// Time/current table for custom steps, validated before use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomTraceDef {
    pub t_s: Vec<f64>,
    pub current_a: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProtocolDef {
    /// Step sequence by preset name; `steps` wins when both are given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<ProtocolPreset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<StepKind>>,
    #[serde(default = "default_cycles")]
    pub num_cycles: usize,
    /// Charge current magnitude [A]; 1C when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge_current_a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharge_current_a: Option<f64>,
    #[serde(default = "default_rest_time")]
    pub rest_time_s: f64,
    /// Voltage limits; the cell's own limits when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v_min: Option<f64>,
    #[serde(default)]
    pub soc_lib_min: f64,
    #[serde(default = "default_soc_lib_max")]
    pub soc_lib_max: f64,
    #[serde(default = "default_soc_lib_init")]
    pub soc_lib_init: f64,
    #[serde(default)]
    pub cv: CvSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomTraceDef>,
}

impl Default for ProtocolDef {
    fn default() -> Self {
        Self {
            preset: Some(ProtocolPreset::Cc),
            steps: None,
            num_cycles: default_cycles(),
            charge_current_a: None,
            discharge_current_a: None,
            rest_time_s: default_rest_time(),
            v_max: None,
            v_min: None,
            soc_lib_min: 0.0,
            soc_lib_max: default_soc_lib_max(),
            soc_lib_init: default_soc_lib_init(),
            cv: CvSettings::default(),
            custom: None,
        }
    }
}

impl ProtocolDef {
    /// Explicit steps, else the preset's sequence.
    pub fn resolved_steps(&self) -> Option<Vec<StepKind>> {
        self.steps
            .clone()
            .or_else(|| self.preset.map(|p| p.steps()))
    }
}

fn default_cycles() -> usize {
    1
}

fn default_rest_time() -> f64 {
    3600.0
}

fn default_soc_lib_max() -> f64 {
    1.0
}

fn default_soc_lib_init() -> f64 {
    0.5
}
