//! Cycling protocol description.
//!
//! A [`ProtocolSpec`] is immutable configuration. Everything that changes
//! while a run progresses lives in [`crate::RunState`], owned by the solver.

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Rest,
    Charge,
    Discharge,
    /// Hold at V_max with a decaying charge current
    #[serde(alias = "cv")]
    ConstantVoltage,
    /// Current read from a time/current trace
    Custom,
}

impl StepKind {
    pub fn name(self) -> &'static str {
        match self {
            StepKind::Rest => "rest",
            StepKind::Charge => "charge",
            StepKind::Discharge => "discharge",
            StepKind::ConstantVoltage => "cv",
            StepKind::Custom => "custom",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StepKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(StepKind::Rest),
            "charge" => Ok(StepKind::Charge),
            "discharge" => Ok(StepKind::Discharge),
            "cv" | "constant_voltage" => Ok(StepKind::ConstantVoltage),
            "custom" => Ok(StepKind::Custom),
            other => Err(SimError::InsufficientConfig {
                what: format!("unknown step '{other}'"),
            }),
        }
    }
}

/// Time/current table for custom steps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTrace", into = "RawTrace")]
pub struct CustomTrace {
    t: Vec<f64>,
    current: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct RawTrace {
    t: Vec<f64>,
    current: Vec<f64>,
}

impl TryFrom<RawTrace> for CustomTrace {
    type Error = SimError;

    fn try_from(raw: RawTrace) -> Result<Self, Self::Error> {
        CustomTrace::new(raw.t, raw.current)
    }
}

impl From<CustomTrace> for RawTrace {
    fn from(trace: CustomTrace) -> Self {
        RawTrace {
            t: trace.t,
            current: trace.current,
        }
    }
}

impl CustomTrace {
    /// Times must be finite and strictly increasing, with one current per time.
    pub fn new(t: Vec<f64>, current: Vec<f64>) -> SimResult<Self> {
        if t.is_empty() {
            return Err(SimError::InsufficientConfig {
                what: "custom trace is empty".to_string(),
            });
        }
        if t.len() != current.len() {
            return Err(SimError::InsufficientConfig {
                what: format!(
                    "custom trace has {} times but {} currents",
                    t.len(),
                    current.len()
                ),
            });
        }
        if t.iter().chain(&current).any(|v| !v.is_finite()) {
            return Err(SimError::InsufficientConfig {
                what: "custom trace contains non-finite values".to_string(),
            });
        }
        if t.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SimError::InsufficientConfig {
                what: "custom trace times must be strictly increasing".to_string(),
            });
        }
        Ok(Self { t, current })
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.t
    }

    pub fn currents(&self) -> &[f64] {
        &self.current
    }

    /// Last tabulated time [s].
    pub fn t_max(&self) -> f64 {
        self.t.last().copied().unwrap_or(0.0)
    }

    /// Current at `t` by zero-order hold on the previous sample. Before the
    /// first time the first current applies; after the last, the last one.
    pub fn current_at(&self, t: f64) -> f64 {
        let idx = self.t.partition_point(|&ti| ti <= t);
        let i = idx.saturating_sub(1);
        self.current[i]
    }
}

/// Settings of the constant-voltage hold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvSettings {
    /// Step ends once |I| drops below this [A]; defaults to C/20
    pub cutoff_current: Option<f64>,
    /// Step ends after this long regardless of current [s]
    pub max_duration_s: Option<f64>,
}

/// Named step sequences.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolPreset {
    /// rest, charge, rest, discharge
    Cc,
    /// charge, rest, discharge, rest
    CcNoFirstRest,
    /// charge, cv, rest, discharge, rest
    Cccv,
    Discharge,
    DischargeRest,
    Charge,
    ChargeRest,
    DischargeRestCharge,
    DischargeRestChargeRest,
    Custom,
}

impl ProtocolPreset {
    pub const ALL: [ProtocolPreset; 10] = [
        ProtocolPreset::Cc,
        ProtocolPreset::CcNoFirstRest,
        ProtocolPreset::Cccv,
        ProtocolPreset::Discharge,
        ProtocolPreset::DischargeRest,
        ProtocolPreset::Charge,
        ProtocolPreset::ChargeRest,
        ProtocolPreset::DischargeRestCharge,
        ProtocolPreset::DischargeRestChargeRest,
        ProtocolPreset::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProtocolPreset::Cc => "cc",
            ProtocolPreset::CcNoFirstRest => "cc_no_first_rest",
            ProtocolPreset::Cccv => "cccv",
            ProtocolPreset::Discharge => "discharge",
            ProtocolPreset::DischargeRest => "discharge_rest",
            ProtocolPreset::Charge => "charge",
            ProtocolPreset::ChargeRest => "charge_rest",
            ProtocolPreset::DischargeRestCharge => "discharge_rest_charge",
            ProtocolPreset::DischargeRestChargeRest => "discharge_rest_charge_rest",
            ProtocolPreset::Custom => "custom",
        }
    }

    pub fn steps(self) -> Vec<StepKind> {
        use StepKind::*;
        match self {
            ProtocolPreset::Cc => vec![Rest, Charge, Rest, Discharge],
            ProtocolPreset::CcNoFirstRest => vec![Charge, Rest, Discharge, Rest],
            ProtocolPreset::Cccv => vec![Charge, ConstantVoltage, Rest, Discharge, Rest],
            ProtocolPreset::Discharge => vec![Discharge],
            ProtocolPreset::DischargeRest => vec![Discharge, Rest],
            ProtocolPreset::Charge => vec![Charge],
            ProtocolPreset::ChargeRest => vec![Charge, Rest],
            ProtocolPreset::DischargeRestCharge => vec![Discharge, Rest, Charge],
            ProtocolPreset::DischargeRestChargeRest => vec![Discharge, Rest, Charge, Rest],
            ProtocolPreset::Custom => vec![Custom],
        }
    }
}

impl FromStr for ProtocolPreset {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        ProtocolPreset::ALL
            .into_iter()
            .find(|p| p.name() == key)
            .ok_or_else(|| SimError::InsufficientConfig {
                what: format!("unknown protocol preset '{s}'"),
            })
    }
}

/// Immutable cycling protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProtocolSpec {
    pub name: String,
    pub steps: Vec<StepKind>,
    pub num_cycles: usize,
    /// Charge current magnitude [A]
    pub charge_current: f64,
    /// Discharge current magnitude [A]
    pub discharge_current: f64,
    pub rest_time_s: f64,
    /// Charge termination voltage [V]
    pub v_max: f64,
    /// Discharge termination voltage [V]
    pub v_min: f64,
    pub soc_lib_min: f64,
    pub soc_lib_max: f64,
    /// Overall cell SOC at the start of the run
    pub soc_lib_init: f64,
    #[serde(default)]
    pub cv: CvSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomTrace>,
}

impl ProtocolSpec {
    /// Protocol from a preset with 1C currents for a cell of `capacity_ah`.
    pub fn from_preset(preset: ProtocolPreset, capacity_ah: f64) -> Self {
        Self {
            name: preset.name().to_string(),
            steps: preset.steps(),
            num_cycles: 1,
            charge_current: capacity_ah,
            discharge_current: capacity_ah,
            rest_time_s: 3600.0,
            v_max: 4.2,
            v_min: 2.5,
            soc_lib_min: 0.0,
            soc_lib_max: 1.0,
            soc_lib_init: 0.5,
            cv: CvSettings::default(),
            custom: None,
        }
    }

    pub fn with_cycles(mut self, num_cycles: usize) -> Self {
        self.num_cycles = num_cycles;
        self
    }

    pub fn with_currents(mut self, charge: f64, discharge: f64) -> Self {
        self.charge_current = charge;
        self.discharge_current = discharge;
        self
    }

    pub fn with_rest_time(mut self, rest_time_s: f64) -> Self {
        self.rest_time_s = rest_time_s;
        self
    }

    pub fn with_voltage_limits(mut self, v_min: f64, v_max: f64) -> Self {
        self.v_min = v_min;
        self.v_max = v_max;
        self
    }

    pub fn with_soc_limits(mut self, soc_min: f64, soc_max: f64, soc_init: f64) -> Self {
        self.soc_lib_min = soc_min;
        self.soc_lib_max = soc_max;
        self.soc_lib_init = soc_init;
        self
    }

    pub fn with_cv(mut self, cv: CvSettings) -> Self {
        self.cv = cv;
        self
    }

    pub fn with_custom_trace(mut self, trace: CustomTrace) -> Self {
        self.custom = Some(trace);
        self
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.steps.is_empty() {
            return Err(SimError::InsufficientConfig {
                what: "protocol has no steps".to_string(),
            });
        }
        if self.num_cycles == 0 {
            return Err(SimError::InsufficientConfig {
                what: "protocol needs at least one cycle".to_string(),
            });
        }
        let non_negative = [
            (self.charge_current, "charge current"),
            (self.discharge_current, "discharge current"),
            (self.rest_time_s, "rest time"),
        ];
        for (value, what) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimError::NonPhysical { what, value });
            }
        }
        if !(self.v_min.is_finite() && self.v_max.is_finite() && self.v_min < self.v_max) {
            return Err(SimError::NonPhysical {
                what: "protocol voltage window",
                value: self.v_min,
            });
        }
        if !(self.soc_lib_min.is_finite()
            && self.soc_lib_max.is_finite()
            && self.soc_lib_init.is_finite()
            && self.soc_lib_min < self.soc_lib_max)
        {
            return Err(SimError::NonPhysical {
                what: "protocol SOC window",
                value: self.soc_lib_min,
            });
        }
        if self.steps.contains(&StepKind::Custom) && self.custom.is_none() {
            return Err(SimError::InsufficientConfig {
                what: "custom step requires a time/current trace".to_string(),
            });
        }
        if let Some(cutoff) = self.cv.cutoff_current {
            if !(cutoff.is_finite() && cutoff > 0.0) {
                return Err(SimError::NonPhysical {
                    what: "CV cutoff current",
                    value: cutoff,
                });
            }
        }
        if let Some(d) = self.cv.max_duration_s {
            if !(d.is_finite() && d > 0.0) {
                return Err(SimError::NonPhysical {
                    what: "CV max duration",
                    value: d,
                });
            }
        }
        Ok(())
    }

    /// Applied current for a current-controlled step. Charge is positive.
    ///
    /// `t_step` is the time since the step started; custom traces are read at
    /// that time. CV steps are voltage-controlled; this returns the charge
    /// current as the upper bound of the search.
    pub fn current_for(&self, kind: StepKind, t_step: f64) -> SimResult<f64> {
        match kind {
            StepKind::Rest => Ok(0.0),
            StepKind::Charge | StepKind::ConstantVoltage => Ok(self.charge_current),
            StepKind::Discharge => Ok(-self.discharge_current),
            StepKind::Custom => self
                .custom
                .as_ref()
                .map(|trace| trace.current_at(t_step))
                .ok_or_else(|| SimError::InsufficientConfig {
                    what: "custom step requires a time/current trace".to_string(),
                }),
        }
    }
}
