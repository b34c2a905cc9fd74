//! Cycling state machine.
//!
//! Walks the protocol's step sequence `num_cycles` times. Each iteration of a
//! step advances the cell by one `dt`:
//!
//! 1. applied current for the step (CV: solved so that V = V_max)
//! 2. SEI current split, if degradation is on
//! 3. both electrode concentration solvers
//! 4. terminal voltage
//! 5. lumped temperature, if not isothermal
//! 6. capacity and SOC_LIB counters, termination check, sample
//!
//! Each iteration runs on a clone of the electrochemical state and is only
//! committed when every stage succeeds, so an aborted step leaves the last
//! valid state in place for the steps that follow.

use crate::conc::{AdvanceInput, ConcMethod, ConcentrationSolver, ElectrodeSolver};
use crate::degradation::{DegradationConfig, DegradationModel, SeiSolveReport};
use crate::error::{SimError, SimResult};
use crate::protocol::{ProtocolSpec, StepKind};
use crate::thermal::{HeatSources, ThermalModel};
use crate::trace::{Sample, SolutionTrace, ThresholdKind, TraceEvent};
use crate::voltage::{VoltageInputs, terminal_voltage};
use sp_cell::{BatteryCell, ElectrodeRole};
use sp_core::SECONDS_PER_HOUR;
use sp_core::timing::Timer;
use sp_solver::{BisectionConfig, bisect};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// How charge and discharge steps decide they are finished.
///
/// Rest steps always run for the protocol's rest time, CV steps end on their
/// current cutoff and custom steps at the end of their trace.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum TerminationPolicy {
    /// Charge ends above V_max, discharge below V_min
    #[default]
    Voltage,
    /// Charge ends above SOC_LIB max, discharge below SOC_LIB min
    Soc,
    /// Step ends once it has run longer than `duration_s`
    Time { duration_s: f64 },
}

/// What to do when a step hits a recoverable error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure, end the step and carry on with the next one
    #[default]
    AbortStep,
    /// Propagate the error and end the run
    AbortRun,
}

/// Options for cycling runs.
#[derive(Clone, Debug, PartialEq)]
pub struct CyclingOptions {
    /// Fixed time step [s]
    pub dt: f64,
    /// Electrode concentration solver used for both electrodes
    pub method: ConcMethod,
    /// Hold the cell at its initial temperature
    pub isothermal: bool,
    /// SEI growth; requires SEI properties on the cell
    pub degradation: Option<DegradationConfig>,
    pub termination: TerminationPolicy,
    pub failure_policy: FailurePolicy,
    /// Turn unexpected threshold crossings into errors
    pub strict_thresholds: bool,
    /// Safety cap on iterations within one step
    pub max_iterations_per_step: Option<usize>,
}

impl Default for CyclingOptions {
    fn default() -> Self {
        Self {
            dt: 0.1,
            method: ConcMethod::default(),
            isothermal: true,
            degradation: None,
            termination: TerminationPolicy::default(),
            failure_policy: FailurePolicy::default(),
            strict_thresholds: false,
            max_iterations_per_step: None,
        }
    }
}

impl CyclingOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if let TerminationPolicy::Time { duration_s } = self.termination {
            if !(duration_s.is_finite() && duration_s > 0.0) {
                return Err(SimError::InvalidArg {
                    what: "time termination needs a positive duration",
                });
            }
        }
        if self.max_iterations_per_step == Some(0) {
            return Err(SimError::InvalidArg {
                what: "max_iterations_per_step must be positive",
            });
        }
        Ok(())
    }
}

/// Why a step ended normally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionReason {
    RestElapsed,
    UpperVoltage,
    LowerVoltage,
    SocUpper,
    SocLower,
    DurationElapsed,
    CvCurrentCutoff,
    CvDurationElapsed,
    TraceExhausted,
    IterationLimit,
}

/// A step that ended on a recoverable error.
#[derive(Clone, Debug, PartialEq)]
pub struct StepFailure {
    /// Run time at the start of the failed iteration [s]
    pub t: f64,
    pub error: SimError,
}

/// Result of one iteration within a step.
#[derive(Clone, Debug, PartialEq)]
pub enum StepFlow {
    Continue,
    Complete(CompletionReason),
    Failed(StepFailure),
}

/// Mutable counters of a run, separate from the protocol.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunState {
    pub time_elapsed: f64,
    pub soc_lib: f64,
    pub cumulative_cap: f64,
    pub cycle_no: usize,
    pub step_index: usize,
    /// Time since the current step started [s]
    pub t_step: f64,
    /// Ah charged within the current step
    pub charge_cap: f64,
    /// Ah discharged within the current step
    pub discharge_cap: f64,
    /// Iterations within the current step
    pub iterations: usize,
    threshold_warned: bool,
}

impl RunState {
    pub fn new(soc_lib_init: f64) -> Self {
        Self {
            soc_lib: soc_lib_init,
            ..Self::default()
        }
    }

    fn begin_step(&mut self, step_index: usize) {
        self.step_index = step_index;
        self.t_step = 0.0;
        self.charge_cap = 0.0;
        self.discharge_cap = 0.0;
        self.iterations = 0;
        self.threshold_warned = false;
    }

    fn record_current(&mut self, i_app: f64, dt: f64, capacity_ah: f64) {
        let dq = i_app.abs() * dt / SECONDS_PER_HOUR;
        if i_app > 0.0 {
            self.charge_cap += dq;
            self.soc_lib += dq / capacity_ah;
        } else if i_app < 0.0 {
            self.discharge_cap += dq;
            self.soc_lib -= dq / capacity_ah;
        }
        self.cumulative_cap += dq;
    }
}

/// Progress notification, sent when a step ends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressUpdate {
    pub cycle_no: usize,
    pub num_cycles: usize,
    pub step_index: usize,
    pub step: StepKind,
    pub time_elapsed: f64,
    pub samples: usize,
}

/// Everything that one iteration mutates.
#[derive(Clone, Debug)]
struct Engine {
    cell: BatteryCell,
    solver_p: ElectrodeSolver,
    solver_n: ElectrodeSolver,
    degradation: Option<DegradationModel>,
    thermal: ThermalModel,
}

#[derive(Clone, Copy, Debug)]
struct Advanced {
    voltage: f64,
    ocv: f64,
    sei: Option<SeiSolveReport>,
}

impl Engine {
    fn new(cell: BatteryCell, options: &CyclingOptions) -> SimResult<Self> {
        let solver_p = ElectrodeSolver::new(&options.method, cell.positive())?;
        let solver_n = ElectrodeSolver::new(&options.method, cell.negative())?;
        let degradation = options
            .degradation
            .map(|cfg| DegradationModel::for_cell(&cell, cfg))
            .transpose()?;
        let thermal = ThermalModel::from_cell(&cell);
        Ok(Self {
            cell,
            solver_p,
            solver_n,
            degradation,
            thermal,
        })
    }

    fn advance(&mut self, i_app: f64, t_prev: f64, dt: f64, isothermal: bool) -> SimResult<Advanced> {
        let mut i_n = i_app;
        let mut sei = None;
        if let Some(model) = self.degradation.as_mut() {
            let report = model.solve(&self.cell, i_app, dt)?;
            if report.delta_r != 0.0 {
                self.cell.add_resistance(report.delta_r)?;
            }
            if report.delta_conc != 0.0 {
                let c_e = self.cell.electrolyte().conc() + report.delta_conc;
                self.cell.electrolyte_mut().set_conc(c_e)?;
            }
            i_n = report.i_intercalation;
            sei = Some(report);
        }

        let input_p = AdvanceInput::from_electrode(self.cell.positive(), dt, t_prev, i_app);
        let soc_p = self.solver_p.advance(&input_p)?;
        let input_n = AdvanceInput::from_electrode(self.cell.negative(), dt, t_prev, i_n);
        let soc_n = self.solver_n.advance(&input_n)?;
        self.cell.electrode_mut(ElectrodeRole::Positive).set_soc(soc_p)?;
        self.cell.electrode_mut(ElectrodeRole::Negative).set_soc(soc_n)?;

        let voltage = terminal_voltage(&VoltageInputs::from_cell(&self.cell, i_app, i_n))?;
        let ocv = self.cell.ocv();

        if !isothermal {
            let sources = HeatSources::from_cell(&self.cell, i_app, voltage);
            let temp = self
                .thermal
                .step(self.cell.temperature(), &sources, t_prev, dt)?;
            self.cell.set_temperature(temp)?;
        }

        Ok(Advanced { voltage, ocv, sei })
    }
}

/// Drives a cell through a cycling protocol.
///
/// The solver owns a private copy of the cell. Every call to [`solve`]
/// starts again from the cell it was built with.
///
/// [`solve`]: CyclingSolver::solve
#[derive(Debug)]
pub struct CyclingSolver {
    options: CyclingOptions,
    initial: Engine,
    engine: Engine,
    run_state: RunState,
    cancel: Option<Arc<AtomicBool>>,
}

impl CyclingSolver {
    pub fn new(cell: BatteryCell, options: CyclingOptions) -> SimResult<Self> {
        options.validate()?;
        let initial = Engine::new(cell, &options)?;
        Ok(Self {
            engine: initial.clone(),
            initial,
            options,
            run_state: RunState::default(),
            cancel: None,
        })
    }

    /// Check `flag` before every iteration and stop with
    /// [`SimError::Cancelled`] once it is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn options(&self) -> &CyclingOptions {
        &self.options
    }

    /// Cell state after the most recent run.
    pub fn cell(&self) -> &BatteryCell {
        &self.engine.cell
    }

    /// Counters after the most recent run.
    pub fn run_state(&self) -> &RunState {
        &self.run_state
    }

    /// SEI film thickness after the most recent run, if degradation is on.
    pub fn sei_thickness(&self) -> Option<f64> {
        self.engine
            .degradation
            .as_ref()
            .map(|d| d.state().thickness_m)
    }

    /// Return to the initial cell and fresh solver state.
    pub fn reset(&mut self) {
        self.engine = self.initial.clone();
        self.run_state = RunState::default();
    }

    pub fn solve(&mut self, protocol: &ProtocolSpec) -> SimResult<SolutionTrace> {
        self.solve_with_progress(protocol, None)
    }

    pub fn solve_with_progress(
        &mut self,
        protocol: &ProtocolSpec,
        mut progress_cb: Option<&mut dyn FnMut(ProgressUpdate)>,
    ) -> SimResult<SolutionTrace> {
        protocol.validate()?;
        self.check_driving_currents(protocol)?;
        self.reset();
        self.run_state = RunState::new(protocol.soc_lib_init);
        let timer = Timer::start("cycling_solve");
        let mut trace = SolutionTrace::new();

        info!(
            protocol = %protocol.name,
            cycles = protocol.num_cycles,
            method = self.options.method.name(),
            dt = self.options.dt,
            "starting cycling run"
        );

        for cycle_no in 0..protocol.num_cycles {
            self.run_state.cycle_no = cycle_no;
            for (step_index, &kind) in protocol.steps.iter().enumerate() {
                self.run_state.begin_step(step_index);
                debug!(cycle_no, step = %kind, t = self.run_state.time_elapsed, "step start");
                self.run_step(protocol, kind, &mut trace)?;
                if let Some(cb) = progress_cb.as_deref_mut() {
                    cb(ProgressUpdate {
                        cycle_no,
                        num_cycles: protocol.num_cycles,
                        step_index,
                        step: kind,
                        time_elapsed: self.run_state.time_elapsed,
                        samples: trace.len(),
                    });
                }
            }
            info!(
                cycle_no,
                charge_cap = trace.charge_capacity(cycle_no),
                discharge_cap = trace.discharge_capacity(cycle_no),
                r_cell = self.engine.cell.r_cell(),
                "cycle complete"
            );
        }

        timer.stop_and_log();
        info!(
            samples = trace.len(),
            t_end = self.run_state.time_elapsed,
            events = trace.events().len(),
            "cycling run complete"
        );
        Ok(trace)
    }

    /// Charge and discharge steps ended by a voltage or SOC limit need a
    /// non-zero current, or the limit is never reached.
    fn check_driving_currents(&self, protocol: &ProtocolSpec) -> SimResult<()> {
        if matches!(self.options.termination, TerminationPolicy::Time { .. }) {
            return Ok(());
        }
        for &kind in &protocol.steps {
            let (current, what) = match kind {
                StepKind::Charge | StepKind::ConstantVoltage => (protocol.charge_current, "charge"),
                StepKind::Discharge => (protocol.discharge_current, "discharge"),
                StepKind::Rest | StepKind::Custom => continue,
            };
            if current <= 0.0 {
                return Err(SimError::InsufficientConfig {
                    what: format!("{kind} step needs a positive {what} current to reach its limit"),
                });
            }
        }
        Ok(())
    }

    fn run_step(
        &mut self,
        protocol: &ProtocolSpec,
        kind: StepKind,
        trace: &mut SolutionTrace,
    ) -> SimResult<()> {
        loop {
            if let Some(flag) = &self.cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(SimError::Cancelled {
                        t_s: self.run_state.time_elapsed,
                    });
                }
            }
            match self.iterate(protocol, kind, trace)? {
                StepFlow::Continue => {}
                StepFlow::Complete(reason) => {
                    debug!(
                        cycle_no = self.run_state.cycle_no,
                        step = %kind,
                        ?reason,
                        iterations = self.run_state.iterations,
                        "step complete"
                    );
                    return Ok(());
                }
                StepFlow::Failed(failure) => {
                    warn!(
                        cycle_no = self.run_state.cycle_no,
                        step = %kind,
                        t = failure.t,
                        error = %failure.error,
                        "step aborted"
                    );
                    trace.push_event(TraceEvent::StepAborted {
                        t: failure.t,
                        cycle_no: self.run_state.cycle_no,
                        step: kind,
                        reason: failure.error.to_string(),
                    });
                    return match self.options.failure_policy {
                        FailurePolicy::AbortStep => Ok(()),
                        FailurePolicy::AbortRun => Err(failure.error),
                    };
                }
            }
        }
    }

    /// Advance one `dt` within a step and commit it if it succeeds.
    fn iterate(
        &mut self,
        protocol: &ProtocolSpec,
        kind: StepKind,
        trace: &mut SolutionTrace,
    ) -> SimResult<StepFlow> {
        let dt = self.options.dt;
        let t_prev = self.run_state.time_elapsed;

        let attempt = match kind {
            StepKind::ConstantVoltage => self.cv_trial(protocol, t_prev),
            _ => protocol
                .current_for(kind, self.run_state.t_step)
                .and_then(|i_app| self.trial(i_app, t_prev)),
        };
        let (i_app, engine, advanced) = match attempt {
            Ok(ok) => ok,
            Err(error) if error.is_step_recoverable() => {
                return Ok(StepFlow::Failed(StepFailure { t: t_prev, error }));
            }
            Err(error) => return Err(error),
        };
        self.engine = engine;

        let capacity = self.engine.cell.capacity_ah();
        let state = &mut self.run_state;
        state.time_elapsed += dt;
        state.t_step += dt;
        state.iterations += 1;
        state.record_current(i_app, dt, capacity);

        if let Some(report) = advanced.sei.filter(|r| !r.converged) {
            trace.push_event(TraceEvent::DegradationNotConverged {
                t: state.time_elapsed,
                iterations: report.iterations,
                residual: report.residual,
            });
        }

        let mut reason = self.completion(protocol, kind, i_app, advanced.voltage);
        self.check_thresholds(kind, reason, advanced.voltage, trace)?;
        trace.push(self.sample(kind, i_app, &advanced));

        if reason.is_none() {
            if let Some(cap) = self.options.max_iterations_per_step {
                if self.run_state.iterations >= cap {
                    warn!(
                        cycle_no = self.run_state.cycle_no,
                        step = %kind,
                        iterations = cap,
                        "step iteration limit reached"
                    );
                    trace.push_event(TraceEvent::IterationLimit {
                        t: self.run_state.time_elapsed,
                        cycle_no: self.run_state.cycle_no,
                        step: kind,
                        iterations: cap,
                    });
                    reason = Some(CompletionReason::IterationLimit);
                }
            }
        }

        Ok(match reason {
            Some(reason) => StepFlow::Complete(reason),
            None => StepFlow::Continue,
        })
    }

    fn trial(&self, i_app: f64, t_prev: f64) -> SimResult<(f64, Engine, Advanced)> {
        let mut engine = self.engine.clone();
        let advanced = engine.advance(i_app, t_prev, self.options.dt, self.options.isothermal)?;
        Ok((i_app, engine, advanced))
    }

    /// Find the charge current in [0, I_charge] that puts the terminal
    /// voltage at V_max after this step.
    fn cv_trial(&self, protocol: &ProtocolSpec, t_prev: f64) -> SimResult<(f64, Engine, Advanced)> {
        let v_target = protocol.v_max;
        let i_max = protocol.charge_current;

        let at_zero = self.trial(0.0, t_prev)?;
        if at_zero.2.voltage >= v_target || i_max == 0.0 {
            return Ok(at_zero);
        }
        let at_max = self.trial(i_max, t_prev)?;
        if at_max.2.voltage <= v_target {
            return Ok(at_max);
        }

        let cfg = BisectionConfig {
            x_tol: 1e-9 * i_max,
            f_tol: 1e-9,
            max_iterations: 100,
        };
        let root = bisect::<_, SimError>(
            |i| Ok(self.trial(i, t_prev)?.2.voltage - v_target),
            0.0,
            i_max,
            &cfg,
        )?;
        self.trial(root.root, t_prev)
    }

    fn completion(
        &self,
        protocol: &ProtocolSpec,
        kind: StepKind,
        i_app: f64,
        voltage: f64,
    ) -> Option<CompletionReason> {
        let state = &self.run_state;
        match kind {
            StepKind::Rest => (state.t_step > protocol.rest_time_s).then_some(CompletionReason::RestElapsed),
            StepKind::ConstantVoltage => {
                let cutoff = protocol
                    .cv
                    .cutoff_current
                    .unwrap_or(self.engine.cell.capacity_ah() / 20.0);
                if i_app.abs() < cutoff {
                    Some(CompletionReason::CvCurrentCutoff)
                } else if protocol.cv.max_duration_s.is_some_and(|d| state.t_step >= d) {
                    Some(CompletionReason::CvDurationElapsed)
                } else {
                    None
                }
            }
            StepKind::Custom => {
                let t_max = protocol.custom.as_ref().map_or(0.0, |c| c.t_max());
                (state.t_step >= t_max).then_some(CompletionReason::TraceExhausted)
            }
            StepKind::Charge => match self.options.termination {
                TerminationPolicy::Voltage => {
                    (voltage > protocol.v_max).then_some(CompletionReason::UpperVoltage)
                }
                TerminationPolicy::Soc => {
                    (state.soc_lib > protocol.soc_lib_max).then_some(CompletionReason::SocUpper)
                }
                TerminationPolicy::Time { duration_s } => {
                    (state.t_step > duration_s).then_some(CompletionReason::DurationElapsed)
                }
            },
            StepKind::Discharge => match self.options.termination {
                TerminationPolicy::Voltage => {
                    (voltage < protocol.v_min).then_some(CompletionReason::LowerVoltage)
                }
                TerminationPolicy::Soc => {
                    (state.soc_lib < protocol.soc_lib_min).then_some(CompletionReason::SocLower)
                }
                TerminationPolicy::Time { duration_s } => {
                    (state.t_step > duration_s).then_some(CompletionReason::DurationElapsed)
                }
            },
        }
    }

    /// Flag the first crossing of the cell's absolute limits in a step, unless
    /// the crossing is the step's own voltage termination.
    fn check_thresholds(
        &mut self,
        kind: StepKind,
        reason: Option<CompletionReason>,
        voltage: f64,
        trace: &mut SolutionTrace,
    ) -> SimResult<()> {
        if self.run_state.threshold_warned {
            return Ok(());
        }
        let cell = &self.engine.cell;
        let crossing = if voltage > cell.v_max()
            && kind != StepKind::ConstantVoltage
            && reason != Some(CompletionReason::UpperVoltage)
        {
            Some((ThresholdKind::Upper, cell.v_max()))
        } else if voltage < cell.v_min() && reason != Some(CompletionReason::LowerVoltage) {
            Some((ThresholdKind::Lower, cell.v_min()))
        } else {
            None
        };
        let Some((threshold, bound)) = crossing else {
            return Ok(());
        };

        self.run_state.threshold_warned = true;
        if self.options.strict_thresholds {
            return Err(SimError::ThresholdPotentialReached { voltage, bound });
        }
        warn!(
            cycle_no = self.run_state.cycle_no,
            step = %kind,
            voltage,
            bound,
            ?threshold,
            "terminal voltage crossed cell limit"
        );
        trace.push_event(TraceEvent::ThresholdCrossed {
            t: self.run_state.time_elapsed,
            cycle_no: self.run_state.cycle_no,
            step: kind,
            kind: threshold,
            voltage,
            bound,
        });
        Ok(())
    }

    fn sample(&self, kind: StepKind, i_app: f64, advanced: &Advanced) -> Sample {
        let state = &self.run_state;
        let cell = &self.engine.cell;
        let sei = advanced.sei.as_ref();
        Sample {
            t: state.time_elapsed,
            cycle_no: state.cycle_no,
            step_index: state.step_index,
            step: kind,
            current: i_app,
            voltage: advanced.voltage,
            ocv: advanced.ocv,
            soc_p: cell.positive().soc(),
            soc_n: cell.negative().soc(),
            temp_k: cell.temperature(),
            r_cell: cell.r_cell(),
            cumulative_cap: state.cumulative_cap,
            charge_cap: state.charge_cap,
            discharge_cap: state.discharge_cap,
            soc_lib: state.soc_lib,
            battery_cap: state.soc_lib * cell.capacity_ah(),
            j_tot: sei.map(|r| r.j_tot),
            j_i: sei.map(|r| r.j_i),
            j_s: sei.map(|r| r.j_s),
            sei_thickness: self.sei_thickness(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProtocolPreset;
    use sp_cell::preset;

    fn cell(soc_p: f64, soc_n: f64) -> BatteryCell {
        preset("guo_2011")
            .unwrap()
            .build_cell(soc_p, soc_n, 298.15)
            .unwrap()
    }

    fn options() -> CyclingOptions {
        CyclingOptions {
            dt: 1.0,
            ..CyclingOptions::default()
        }
    }

    #[test]
    fn rest_keeps_the_crossing_sample() {
        let protocol = ProtocolSpec::from_preset(ProtocolPreset::Cc, 1.65)
            .with_rest_time(600.0);
        let protocol = ProtocolSpec {
            steps: vec![StepKind::Rest],
            ..protocol
        };
        let mut solver = CyclingSolver::new(cell(0.6, 0.6), options()).unwrap();
        let trace = solver.solve(&protocol).unwrap();
        assert_eq!(trace.len(), 601);
        assert!(trace.samples().iter().all(|s| s.current == 0.0));
    }

    #[test]
    fn charge_stops_above_v_max() {
        let protocol = ProtocolSpec {
            steps: vec![StepKind::Charge],
            ..ProtocolSpec::from_preset(ProtocolPreset::Charge, 1.65).with_voltage_limits(3.0, 4.2)
        };
        let mut solver = CyclingSolver::new(cell(0.6, 0.6), options()).unwrap();
        let trace = solver.solve(&protocol).unwrap();
        let v = trace.voltage();
        let last = v[v.len() - 1];
        assert!(last > 4.2);
        assert!(v[..v.len() - 1].iter().all(|&x| x <= 4.2));
    }

    #[test]
    fn zero_current_is_refused_when_a_limit_ends_the_step() {
        let charge = ProtocolSpec {
            steps: vec![StepKind::Charge],
            ..ProtocolSpec::from_preset(ProtocolPreset::Charge, 1.65).with_currents(0.0, 1.65)
        };
        let discharge = ProtocolSpec::from_preset(ProtocolPreset::Discharge, 1.65)
            .with_currents(1.65, 0.0);
        for termination in [TerminationPolicy::Voltage, TerminationPolicy::Soc] {
            let opts = CyclingOptions {
                termination,
                ..options()
            };
            let mut solver = CyclingSolver::new(cell(0.6, 0.6), opts).unwrap();
            for protocol in [&charge, &discharge] {
                assert!(matches!(
                    solver.solve(protocol),
                    Err(SimError::InsufficientConfig { .. })
                ));
            }
        }
    }

    #[test]
    fn zero_current_runs_under_time_policy() {
        let protocol = ProtocolSpec {
            steps: vec![StepKind::Charge],
            ..ProtocolSpec::from_preset(ProtocolPreset::Charge, 1.65).with_currents(0.0, 1.65)
        };
        let opts = CyclingOptions {
            termination: TerminationPolicy::Time { duration_s: 10.0 },
            ..options()
        };
        let mut solver = CyclingSolver::new(cell(0.6, 0.6), opts).unwrap();
        let trace = solver.solve(&protocol).unwrap();
        assert_eq!(trace.len(), 11);
        assert!(trace.samples().iter().all(|s| s.current == 0.0));
    }

    #[test]
    fn time_policy_bounds_step_length() {
        let protocol = ProtocolSpec::from_preset(ProtocolPreset::Discharge, 1.65);
        let opts = CyclingOptions {
            termination: TerminationPolicy::Time { duration_s: 100.0 },
            ..options()
        };
        let mut solver = CyclingSolver::new(cell(0.4956, 0.7568), opts).unwrap();
        let trace = solver.solve(&protocol).unwrap();
        assert_eq!(trace.len(), 101);
    }

    #[test]
    fn repeated_solves_start_from_the_same_state() {
        let protocol = ProtocolSpec::from_preset(ProtocolPreset::Discharge, 1.65);
        let opts = CyclingOptions {
            termination: TerminationPolicy::Time { duration_s: 50.0 },
            ..options()
        };
        let mut solver = CyclingSolver::new(cell(0.4956, 0.7568), opts).unwrap();
        let a = solver.solve(&protocol).unwrap();
        let b = solver.solve(&protocol).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cancelled_run_returns_cancelled() {
        let flag = Arc::new(AtomicBool::new(true));
        let protocol = ProtocolSpec::from_preset(ProtocolPreset::Discharge, 1.65);
        let mut solver = CyclingSolver::new(cell(0.4956, 0.7568), options())
            .unwrap()
            .with_cancel_flag(flag);
        assert!(matches!(
            solver.solve(&protocol),
            Err(SimError::Cancelled { .. })
        ));
    }

    #[test]
    fn degradation_without_sei_properties_fails_at_construction() {
        let mut p = preset("guo_2011").unwrap();
        p.params.sei = None;
        let opts = CyclingOptions {
            degradation: Some(DegradationConfig::default()),
            ..options()
        };
        assert!(matches!(
            CyclingSolver::new(p.default_cell().unwrap(), opts),
            Err(SimError::InsufficientConfig { .. })
        ));
    }

    #[test]
    fn invalid_dt_rejected() {
        let opts = CyclingOptions {
            dt: 0.0,
            ..CyclingOptions::default()
        };
        assert!(CyclingSolver::new(cell(0.5, 0.5), opts).is_err());
    }
}
