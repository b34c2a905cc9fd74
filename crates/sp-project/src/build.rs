//! Conversion of a validated configuration into simulation objects.

use crate::ProjectResult;
use crate::schema::{CellDef, MethodDef, ProtocolDef, RunConfig, SolverDef, StepFailureDef, TerminationDef};
use sp_cell::BatteryCell;
use sp_core::{celsius, kelvin_of};
use sp_sim::{
    CnMethod, ConcMethod, CrankNicolsonConfig, CustomTrace, CyclingOptions, EigenConfig,
    FailurePolicy, PolynomialConfig, ProtocolSpec, TerminationPolicy,
};

/// Everything needed to start one cycling run.
#[derive(Debug, Clone)]
pub struct RunSetup {
    pub cell: BatteryCell,
    pub options: CyclingOptions,
    pub protocol: ProtocolSpec,
}

impl RunConfig {
    pub fn build(&self) -> ProjectResult<RunSetup> {
        let cell = self.cell.build()?;
        let options = self.solver.build();
        let protocol = self.protocol.build(&self.name, &cell)?;
        Ok(RunSetup {
            cell,
            options,
            protocol,
        })
    }
}

impl CellDef {
    /// Initial temperature [K], if one was given.
    pub fn temperature(&self) -> Option<f64> {
        self.temperature_k
            .or_else(|| self.temperature_c.map(|c| kelvin_of(celsius(c))))
    }

    pub fn build(&self) -> ProjectResult<BatteryCell> {
        if let Some(name) = &self.preset {
            let preset = sp_cell::preset(name)?;
            let ocp_p = self.ocp_positive.as_ref().unwrap_or(&preset.ocp_positive).build()?;
            let ocp_n = self.ocp_negative.as_ref().unwrap_or(&preset.ocp_negative).build()?;
            return Ok(BatteryCell::new(
                preset.params.clone(),
                ocp_p,
                ocp_n,
                self.soc_p.unwrap_or(preset.default_soc_p),
                self.soc_n.unwrap_or(preset.default_soc_n),
                self.temperature().unwrap_or(preset.default_temp_k),
            )?);
        }

        let missing = |field: &str| crate::ValidationError::MissingField {
            field: field.to_string(),
            context: "required with explicit cell.params".to_string(),
        };
        let params = self.params.clone().ok_or_else(|| missing("cell.params"))?;
        let ocp_p = self.ocp_positive.as_ref().ok_or_else(|| missing("cell.ocp_positive"))?;
        let ocp_n = self.ocp_negative.as_ref().ok_or_else(|| missing("cell.ocp_negative"))?;
        Ok(BatteryCell::new(
            params,
            ocp_p.build()?,
            ocp_n.build()?,
            self.soc_p.ok_or_else(|| missing("cell.soc_p"))?,
            self.soc_n.ok_or_else(|| missing("cell.soc_n"))?,
            self.temperature().ok_or_else(|| missing("cell.temperature_k"))?,
        )?)
    }
}

impl MethodDef {
    pub fn to_method(&self) -> ConcMethod {
        match *self {
            MethodDef::Eigen { n_terms } => ConcMethod::Eigen(EigenConfig {
                n_terms,
                ..EigenConfig::default()
            }),
            MethodDef::CrankNicolson { grid_points, dense } => {
                ConcMethod::CrankNicolson(CrankNicolsonConfig {
                    grid_points,
                    method: if dense { CnMethod::Dense } else { CnMethod::Thomas },
                })
            }
            MethodDef::Polynomial { order } => ConcMethod::Polynomial(PolynomialConfig { order }),
        }
    }
}

impl SolverDef {
    pub fn build(&self) -> CyclingOptions {
        CyclingOptions {
            dt: self.dt_s,
            method: self.method.to_method(),
            isothermal: self.isothermal,
            degradation: self.degradation,
            termination: match self.termination {
                TerminationDef::Voltage => TerminationPolicy::Voltage,
                TerminationDef::Soc => TerminationPolicy::Soc,
                TerminationDef::Time { duration_s } => TerminationPolicy::Time { duration_s },
            },
            failure_policy: match self.on_step_failure {
                StepFailureDef::AbortStep => FailurePolicy::AbortStep,
                StepFailureDef::AbortRun => FailurePolicy::AbortRun,
            },
            strict_thresholds: self.strict_thresholds,
            max_iterations_per_step: self.max_iterations_per_step,
        }
    }
}

impl ProtocolDef {
    /// Fill unset currents and voltage limits from the cell.
    pub fn build(&self, name: &str, cell: &BatteryCell) -> ProjectResult<ProtocolSpec> {
        let steps = self.resolved_steps().ok_or_else(|| crate::ValidationError::MissingField {
            field: "protocol.steps".to_string(),
            context: "a step list or protocol.preset is required".to_string(),
        })?;
        let one_c = cell.capacity_ah();
        let custom = self
            .custom
            .as_ref()
            .map(|c| CustomTrace::new(c.t_s.clone(), c.current_a.clone()))
            .transpose()?;
        let protocol = ProtocolSpec {
            name: name.to_string(),
            steps,
            num_cycles: self.num_cycles,
            charge_current: self.charge_current_a.unwrap_or(one_c),
            discharge_current: self.discharge_current_a.unwrap_or(one_c),
            rest_time_s: self.rest_time_s,
            v_max: self.v_max.unwrap_or(cell.v_max()),
            v_min: self.v_min.unwrap_or(cell.v_min()),
            soc_lib_min: self.soc_lib_min,
            soc_lib_max: self.soc_lib_max,
            soc_lib_init: self.soc_lib_init,
            cv: self.cv,
            custom,
        };
        protocol.validate()?;
        Ok(protocol)
    }
}
