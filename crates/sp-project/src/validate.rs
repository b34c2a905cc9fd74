//! Run configuration validation.
//!
//! Everything a run would otherwise discover at its first step is checked
//! here, before any cell or solver is built.

use crate::schema::{CellDef, CustomTraceDef, MethodDef, ProtocolDef, RunConfig, SolverDef, TerminationDef};
use sp_sim::StepKind;

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing field: {field} ({context})")]
    MissingField { field: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Conflicting fields: {first} and {second}")]
    Conflict { first: String, second: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn missing(field: &str, context: &str) -> ValidationError {
    ValidationError::MissingField {
        field: field.to_string(),
        context: context.to_string(),
    }
}

fn require_positive(field: &str, v: f64) -> Result<(), ValidationError> {
    if !v.is_finite() || v <= 0.0 {
        return Err(invalid(field, v, "must be positive and finite"));
    }
    Ok(())
}

fn require_non_negative(field: &str, v: f64) -> Result<(), ValidationError> {
    if !v.is_finite() || v < 0.0 {
        return Err(invalid(field, v, "must be non-negative and finite"));
    }
    Ok(())
}

pub fn validate_config(config: &RunConfig) -> Result<(), ValidationError> {
    if config.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
        });
    }
    if config.name.trim().is_empty() {
        return Err(missing("name", "run configuration"));
    }
    validate_cell(&config.cell)?;
    validate_solver(&config.solver, &config.cell)?;
    validate_protocol(&config.protocol, &config.solver)?;
    Ok(())
}

fn validate_cell(cell: &CellDef) -> Result<(), ValidationError> {
    match (&cell.preset, &cell.params) {
        (Some(_), Some(_)) => {
            return Err(ValidationError::Conflict {
                first: "cell.preset".to_string(),
                second: "cell.params".to_string(),
            });
        }
        (None, None) => return Err(missing("cell.preset", "a preset or explicit cell.params is required")),
        (Some(name), None) => {
            if sp_cell::preset(name).is_err() {
                return Err(invalid(
                    "cell.preset",
                    name,
                    &format!("known presets: {}", sp_cell::PRESET_NAMES.join(", ")),
                ));
            }
        }
        (None, Some(params)) => {
            if cell.ocp_positive.is_none() {
                return Err(missing("cell.ocp_positive", "required with explicit cell.params"));
            }
            if cell.ocp_negative.is_none() {
                return Err(missing("cell.ocp_negative", "required with explicit cell.params"));
            }
            if cell.soc_p.is_none() {
                return Err(missing("cell.soc_p", "required with explicit cell.params"));
            }
            if cell.soc_n.is_none() {
                return Err(missing("cell.soc_n", "required with explicit cell.params"));
            }
            if cell.temperature_k.is_none() && cell.temperature_c.is_none() {
                return Err(missing("cell.temperature_k", "required with explicit cell.params"));
            }
            require_positive("cell.params.capacity_ah", params.capacity_ah)?;
            if !(params.v_min < params.v_max) {
                return Err(invalid("cell.params.v_min", params.v_min, "must be below v_max"));
            }
        }
    }

    for (field, soc) in [("cell.soc_p", cell.soc_p), ("cell.soc_n", cell.soc_n)] {
        if let Some(x) = soc
            && !(x > 0.0 && x < 1.0)
        {
            return Err(invalid(field, x, "must lie strictly between 0 and 1"));
        }
    }

    match (cell.temperature_k, cell.temperature_c) {
        (Some(_), Some(_)) => {
            return Err(ValidationError::Conflict {
                first: "cell.temperature_k".to_string(),
                second: "cell.temperature_c".to_string(),
            });
        }
        (Some(t), None) => require_positive("cell.temperature_k", t)?,
        (None, Some(t)) => {
            if !t.is_finite() || t <= -sp_core::ZERO_CELSIUS_K {
                return Err(invalid("cell.temperature_c", t, "must be above absolute zero"));
            }
        }
        (None, None) => {}
    }

    for (field, ocp) in [
        ("cell.ocp_positive", &cell.ocp_positive),
        ("cell.ocp_negative", &cell.ocp_negative),
    ] {
        if let Some(kind) = ocp
            && let Err(e) = kind.build()
        {
            return Err(invalid(field, "table", &e.to_string()));
        }
    }
    Ok(())
}

fn validate_solver(solver: &SolverDef, cell: &CellDef) -> Result<(), ValidationError> {
    require_positive("solver.dt_s", solver.dt_s)?;
    match &solver.method {
        MethodDef::Eigen { n_terms } => {
            if *n_terms == 0 {
                return Err(invalid("solver.method.n_terms", n_terms, "must be at least 1"));
            }
        }
        MethodDef::CrankNicolson { grid_points, .. } => {
            if *grid_points < 3 {
                return Err(invalid("solver.method.grid_points", grid_points, "must be at least 3"));
            }
        }
        MethodDef::Polynomial { .. } => {}
    }
    if let TerminationDef::Time { duration_s } = solver.termination {
        require_positive("solver.termination.duration_s", duration_s)?;
    }
    if solver.max_iterations_per_step == Some(0) {
        return Err(invalid("solver.max_iterations_per_step", 0, "must be at least 1"));
    }
    if let Some(deg) = &solver.degradation {
        require_positive("solver.degradation.rel_tol", deg.rel_tol)?;
        require_non_negative("solver.degradation.initial_thickness_m", deg.initial_thickness_m)?;
        if deg.max_iterations == 0 {
            return Err(invalid("solver.degradation.max_iterations", 0, "must be at least 1"));
        }
        if let Some(params) = &cell.params
            && params.sei.is_none()
        {
            return Err(missing("cell.params.sei", "required when solver.degradation is set"));
        }
    }
    Ok(())
}

fn validate_protocol(protocol: &ProtocolDef, solver: &SolverDef) -> Result<(), ValidationError> {
    let Some(steps) = protocol.resolved_steps() else {
        return Err(missing("protocol.steps", "a step list or protocol.preset is required"));
    };
    if steps.is_empty() {
        return Err(invalid("protocol.steps", "[]", "must contain at least one step"));
    }
    if protocol.num_cycles == 0 {
        return Err(invalid("protocol.num_cycles", 0, "must be at least 1"));
    }
    // Voltage and SOC limits are never reached at zero current.
    let threshold_ended = !matches!(solver.termination, TerminationDef::Time { .. });
    let charges = steps
        .iter()
        .any(|s| matches!(s, StepKind::Charge | StepKind::ConstantVoltage));
    let discharges = steps.contains(&StepKind::Discharge);
    if let Some(i) = protocol.charge_current_a {
        if threshold_ended && charges {
            require_positive("protocol.charge_current_a", i)?;
        } else {
            require_non_negative("protocol.charge_current_a", i)?;
        }
    }
    if let Some(i) = protocol.discharge_current_a {
        if threshold_ended && discharges {
            require_positive("protocol.discharge_current_a", i)?;
        } else {
            require_non_negative("protocol.discharge_current_a", i)?;
        }
    }
    require_non_negative("protocol.rest_time_s", protocol.rest_time_s)?;
    if let (Some(lo), Some(hi)) = (protocol.v_min, protocol.v_max)
        && !(lo < hi)
    {
        return Err(invalid("protocol.v_min", lo, "must be below protocol.v_max"));
    }
    if !(protocol.soc_lib_min < protocol.soc_lib_max) {
        return Err(invalid(
            "protocol.soc_lib_min",
            protocol.soc_lib_min,
            "must be below protocol.soc_lib_max",
        ));
    }
    if let Some(cutoff) = protocol.cv.cutoff_current {
        require_positive("protocol.cv.cutoff_current", cutoff)?;
    }
    if let Some(d) = protocol.cv.max_duration_s {
        require_positive("protocol.cv.max_duration_s", d)?;
    }
    match (&protocol.custom, steps.contains(&StepKind::Custom)) {
        (None, true) => {
            return Err(missing("protocol.custom", "custom steps need a time/current trace"));
        }
        (Some(trace), _) => validate_custom_trace(trace)?,
        (None, false) => {}
    }
    Ok(())
}

fn validate_custom_trace(trace: &CustomTraceDef) -> Result<(), ValidationError> {
    if trace.t_s.is_empty() {
        return Err(missing("protocol.custom.t_s", "custom trace is empty"));
    }
    if trace.t_s.len() != trace.current_a.len() {
        return Err(invalid(
            "protocol.custom.current_a",
            trace.current_a.len(),
            &format!("expected {} values to match t_s", trace.t_s.len()),
        ));
    }
    if let Some(bad) = trace.t_s.iter().chain(&trace.current_a).find(|v| !v.is_finite()) {
        return Err(invalid("protocol.custom", bad, "values must be finite"));
    }
    if let Some(w) = trace.t_s.windows(2).find(|w| w[1] <= w[0]) {
        return Err(invalid("protocol.custom.t_s", w[1], "times must be strictly increasing"));
    }
    Ok(())
}
