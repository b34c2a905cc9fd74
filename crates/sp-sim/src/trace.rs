//! Time-ordered simulation output.

use crate::protocol::StepKind;
use serde::{Deserialize, Serialize};

/// One time-step record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Run time at the end of the step [s]
    pub t: f64,
    pub cycle_no: usize,
    /// Position of the step within the protocol sequence
    pub step_index: usize,
    pub step: StepKind,
    /// Applied current [A], positive on charge
    pub current: f64,
    pub voltage: f64,
    pub ocv: f64,
    pub soc_p: f64,
    pub soc_n: f64,
    pub temp_k: f64,
    pub r_cell: f64,
    /// Ah throughput since the start of the run
    pub cumulative_cap: f64,
    /// Ah charged within the current step
    pub charge_cap: f64,
    /// Ah discharged within the current step
    pub discharge_cap: f64,
    pub soc_lib: f64,
    /// Charge still in the cell, soc_lib times nominal capacity [A h]
    pub battery_cap: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub j_tot: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub j_i: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub j_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sei_thickness: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdKind {
    /// Voltage above the cell's V_max outside a charge termination
    Upper,
    /// Voltage below the cell's V_min outside a discharge termination
    Lower,
}

/// Noteworthy conditions recorded alongside the samples.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// A step loop ended early on a recoverable error
    StepAborted {
        t: f64,
        cycle_no: usize,
        step: StepKind,
        reason: String,
    },
    ThresholdCrossed {
        t: f64,
        cycle_no: usize,
        step: StepKind,
        kind: ThresholdKind,
        voltage: f64,
        bound: f64,
    },
    DegradationNotConverged {
        t: f64,
        iterations: usize,
        residual: f64,
    },
    /// A step hit the per-step iteration cap
    IterationLimit {
        t: f64,
        cycle_no: usize,
        step: StepKind,
        iterations: usize,
    },
}

/// Append-only run output.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SolutionTrace {
    samples: Vec<Sample>,
    events: Vec<TraceEvent>,
}

impl SolutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a trace from stored samples and events.
    pub fn from_parts(samples: Vec<Sample>, events: Vec<TraceEvent>) -> Self {
        Self { samples, events }
    }

    pub(crate) fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub(crate) fn push_event(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn time(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.t).collect()
    }

    pub fn voltage(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.voltage).collect()
    }

    pub fn current(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.current).collect()
    }

    pub fn temperature(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.temp_k).collect()
    }

    /// Distinct cycle numbers in order of appearance.
    pub fn cycle_numbers(&self) -> Vec<usize> {
        let mut out: Vec<usize> = Vec::new();
        for s in &self.samples {
            if out.last() != Some(&s.cycle_no) {
                out.push(s.cycle_no);
            }
        }
        out
    }

    pub fn in_cycle(&self, cycle_no: usize) -> impl Iterator<Item = &Sample> {
        self.samples.iter().filter(move |s| s.cycle_no == cycle_no)
    }

    fn in_cycle_step(&self, cycle_no: usize, step: StepKind) -> impl Iterator<Item = &Sample> {
        self.in_cycle(cycle_no).filter(move |s| s.step == step)
    }

    /// Sum over step segments of the last value of `cap` in each segment.
    ///
    /// Per-step counters reset at every step start, so a cycle with two
    /// charge steps contributes both.
    fn segment_total(&self, cycle_no: usize, kinds: &[StepKind], cap: fn(&Sample) -> f64) -> f64 {
        let mut total = 0.0;
        let mut current: Option<(usize, f64)> = None;
        for s in self.in_cycle(cycle_no).filter(|s| kinds.contains(&s.step)) {
            match current {
                Some((idx, _)) if idx == s.step_index => current = Some((idx, cap(s))),
                Some((_, last)) => {
                    total += last;
                    current = Some((s.step_index, cap(s)));
                }
                None => current = Some((s.step_index, cap(s))),
            }
        }
        total + current.map_or(0.0, |(_, last)| last)
    }

    /// Ah charged in `cycle_no`, including any CV hold.
    pub fn charge_capacity(&self, cycle_no: usize) -> f64 {
        self.segment_total(
            cycle_no,
            &[StepKind::Charge, StepKind::ConstantVoltage, StepKind::Custom],
            |s| s.charge_cap,
        )
    }

    /// Ah discharged in `cycle_no`.
    pub fn discharge_capacity(&self, cycle_no: usize) -> f64 {
        self.segment_total(
            cycle_no,
            &[StepKind::Discharge, StepKind::Custom],
            |s| s.discharge_cap,
        )
    }

    pub fn discharge_capacities(&self) -> Vec<f64> {
        self.cycle_numbers()
            .into_iter()
            .map(|c| self.discharge_capacity(c))
            .collect()
    }

    /// (t, V) during the discharge steps of `cycle_no`.
    pub fn voltage_during_discharge(&self, cycle_no: usize) -> Vec<(f64, f64)> {
        self.in_cycle_step(cycle_no, StepKind::Discharge)
            .map(|s| (s.t, s.voltage))
            .collect()
    }

    /// (t, T) during the discharge steps of `cycle_no`.
    pub fn temperature_during_discharge(&self, cycle_no: usize) -> Vec<(f64, f64)> {
        self.in_cycle_step(cycle_no, StepKind::Discharge)
            .map(|s| (s.t, s.temp_k))
            .collect()
    }

    /// Internal resistance at the end of each cycle.
    pub fn r_cell_by_cycle(&self) -> Vec<f64> {
        self.end_of_cycle(|s| s.r_cell)
    }

    /// Battery capacity at the end of each cycle.
    pub fn battery_capacity_by_cycle(&self) -> Vec<f64> {
        self.end_of_cycle(|s| s.battery_cap)
    }

    /// SEI thickness at every sample (0 where degradation was off).
    pub fn sei_thickness(&self) -> Vec<f64> {
        self.samples
            .iter()
            .map(|s| s.sei_thickness.unwrap_or(0.0))
            .collect()
    }

    fn end_of_cycle(&self, field: fn(&Sample) -> f64) -> Vec<f64> {
        self.cycle_numbers()
            .into_iter()
            .filter_map(|c| self.in_cycle(c).last().map(field))
            .collect()
    }
}
