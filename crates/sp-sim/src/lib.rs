//! Single particle model simulation.
//!
//! Provides:
//! - Electrode surface concentration solvers (eigenfunction expansion,
//!   Crank-Nicolson finite differences, polynomial approximation)
//! - Terminal voltage from Butler-Volmer kinetics
//! - Lumped thermal model and SEI growth model
//! - The cycling state machine that drives them over a protocol
//! - Parallel sweeps over independent runs

pub mod conc;
pub mod cycler;
pub mod degradation;
pub mod error;
pub mod integrator;
pub mod model;
pub mod protocol;
pub mod sweep;
pub mod thermal;
pub mod trace;
pub mod voltage;

pub use conc::{
    AdvanceInput, CnMethod, ConcMethod, ConcentrationSolver, CrankNicolsonConfig,
    CrankNicolsonSolver, EigenConfig, EigenSolver, ElectrodeSolver, PolynomialConfig,
    PolynomialOrder, PolynomialSolver,
};
pub use cycler::{
    CompletionReason, CyclingOptions, CyclingSolver, FailurePolicy, ProgressUpdate, RunState,
    StepFailure, StepFlow, TerminationPolicy,
};
pub use degradation::{DegradationConfig, DegradationModel, DegradationState, SeiSolveReport};
pub use error::{SimError, SimResult};
pub use integrator::{Integrator, RK4};
pub use model::TransientModel;
pub use protocol::{CustomTrace, CvSettings, ProtocolPreset, ProtocolSpec, StepKind};
pub use sweep::{SweepJob, SweepOutcome, solve_many, solve_many_with_cancel};
pub use thermal::{HeatSources, ThermalModel};
pub use trace::{Sample, SolutionTrace, ThresholdKind, TraceEvent};
pub use voltage::{ElectrodeKinetics, VoltageInputs, terminal_voltage};
