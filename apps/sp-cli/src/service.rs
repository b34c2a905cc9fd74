//! Load, run and cache a configuration.

use crate::error::CliResult;
use sp_project::RunConfig;
use sp_results::{RunManifest, RunStore, compute_run_id};
use sp_sim::{CyclingSolver, ProgressUpdate, SolutionTrace, SweepJob};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

pub const SOLVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct RunResponse {
    pub run_id: String,
    pub loaded_from_cache: bool,
    pub trace: SolutionTrace,
    pub solve_time_s: f64,
}

/// Serve a run from the store next to `config_path`, or solve and store it.
pub fn ensure_run(
    config_path: &Path,
    config: &RunConfig,
    use_cache: bool,
    progress: Option<&mut dyn FnMut(ProgressUpdate)>,
) -> CliResult<RunResponse> {
    let store = RunStore::for_config(config_path)?;
    let run_id = compute_run_id(config, SOLVER_VERSION);

    if use_cache && store.has_run(&run_id) {
        debug!(%run_id, "cache hit");
        let manifest = store.load_manifest(&run_id)?;
        let samples = store.load_samples(&run_id)?;
        return Ok(RunResponse {
            run_id,
            loaded_from_cache: true,
            trace: SolutionTrace::from_parts(samples, manifest.events),
            solve_time_s: 0.0,
        });
    }

    let setup = config.build()?;
    let mut solver = CyclingSolver::new(setup.cell, setup.options)?;
    let started = Instant::now();
    let trace = solver.solve_with_progress(&setup.protocol, progress)?;
    let solve_time_s = started.elapsed().as_secs_f64();
    info!(%run_id, samples = trace.len(), solve_time_s, "run finished");

    let manifest = RunManifest::for_trace(run_id.clone(), &config.name, SOLVER_VERSION, &trace);
    store.save_run(&manifest, trace.samples())?;

    Ok(RunResponse {
        run_id,
        loaded_from_cache: false,
        trace,
        solve_time_s,
    })
}

/// One job per discharge current, or a single job when none are given.
pub fn sweep_jobs(config: &RunConfig, discharge_currents: &[f64]) -> CliResult<Vec<SweepJob>> {
    if discharge_currents.is_empty() {
        let setup = config.build()?;
        return Ok(vec![SweepJob {
            label: config.name.clone(),
            cell: setup.cell,
            options: setup.options,
            protocol: setup.protocol,
        }]);
    }

    discharge_currents
        .iter()
        .map(|&current| -> CliResult<SweepJob> {
            let mut variant = config.clone();
            variant.protocol.discharge_current_a = Some(current);
            sp_project::validate_config(&variant).map_err(sp_project::ProjectError::from)?;
            let setup = variant.build()?;
            Ok(SweepJob {
                label: format!("{} @ {} A", config.name, current),
                cell: setup.cell,
                options: setup.options,
                protocol: setup.protocol,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_project::schema::*;
    use sp_sim::ProtocolPreset;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_config_path() -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("sp_cli_service_{}", nanos));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("run.yaml")
    }

    fn config() -> RunConfig {
        RunConfig {
            version: 1,
            name: "cli rest".to_string(),
            cell: CellDef {
                preset: Some("guo_2011".to_string()),
                ..CellDef::default()
            },
            solver: SolverDef {
                dt_s: 1.0,
                ..SolverDef::default()
            },
            protocol: ProtocolDef {
                preset: Some(ProtocolPreset::Discharge),
                ..ProtocolDef::default()
            },
        }
    }

    fn short(mut config: RunConfig) -> RunConfig {
        config.solver.termination = TerminationDef::Time { duration_s: 20.0 };
        config
    }

    #[test]
    fn second_run_is_served_from_cache() {
        let path = temp_config_path();
        let config = short(config());

        let first = ensure_run(&path, &config, true, None).unwrap();
        assert!(!first.loaded_from_cache);

        let second = ensure_run(&path, &config, true, None).unwrap();
        assert!(second.loaded_from_cache);
        assert_eq!(second.run_id, first.run_id);
        assert_eq!(second.trace.len(), first.trace.len());
        let (a, b) = (second.trace.last().unwrap(), first.trace.last().unwrap());
        assert!((a.voltage - b.voltage).abs() < 1e-12);

        let forced = ensure_run(&path, &config, false, None).unwrap();
        assert!(!forced.loaded_from_cache);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn sweep_builds_one_job_per_current() {
        let jobs = sweep_jobs(&config(), &[0.5, 1.0, 2.0]).unwrap();
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[2].protocol.discharge_current, 2.0);
        assert!(jobs[0].label.ends_with("@ 0.5 A"));

        assert_eq!(sweep_jobs(&config(), &[]).unwrap().len(), 1);
        assert!(sweep_jobs(&config(), &[-1.0]).is_err());
    }
}
