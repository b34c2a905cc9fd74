use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use sp_project::schema::*;
use sp_results::{RunManifest, RunStore, compute_run_id};
use sp_sim::{CyclingSolver, ProtocolPreset, SolutionTrace, StepKind};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn short_config() -> RunConfig {
    RunConfig {
        version: 1,
        name: "short charge".to_string(),
        cell: CellDef {
            preset: Some("guo_2011".to_string()),
            soc_p: Some(0.6),
            soc_n: Some(0.6),
            ..CellDef::default()
        },
        solver: SolverDef {
            dt_s: 1.0,
            ..SolverDef::default()
        },
        protocol: ProtocolDef {
            preset: Some(ProtocolPreset::DischargeRest),
            rest_time_s: 5.0,
            v_min: Some(3.9),
            v_max: Some(4.2),
            ..ProtocolDef::default()
        },
    }
}

fn run(config: &RunConfig) -> SolutionTrace {
    let setup = config.build().expect("config builds");
    let mut solver = CyclingSolver::new(setup.cell, setup.options).expect("solver");
    solver.solve(&setup.protocol).expect("run completes")
}

#[test]
fn save_list_load_roundtrip() {
    let config_dir = unique_temp_dir("sp_results_config");
    fs::create_dir_all(&config_dir).expect("failed to create temp config dir");
    let config_path = config_dir.join("run.yaml");
    sp_project::save_yaml(&config_path, &short_config()).expect("failed to write config");

    let config = sp_project::load_yaml(&config_path).expect("config loads");
    let trace = run(&config);
    assert!(!trace.is_empty());

    let store = RunStore::for_config(&config_path).expect("failed to create run store");
    assert!(store.root().ends_with(".spm/runs"));

    let run_id = compute_run_id(&config, "test");
    assert!(!store.has_run(&run_id));

    let manifest = RunManifest::for_trace(run_id.clone(), &config.name, "test", &trace);
    store.save_run(&manifest, trace.samples()).expect("save");
    assert!(store.has_run(&run_id));

    let loaded = store.load_manifest(&run_id).expect("manifest");
    assert_eq!(loaded.run_id, manifest.run_id);
    assert_eq!(loaded.timestamp, manifest.timestamp);
    assert_eq!(loaded.events, manifest.events);
    assert_eq!(loaded.summary.samples, trace.len());
    assert_eq!(loaded.summary.cycles, 1);
    let v_end = trace.last().map(|s| s.voltage).unwrap();
    assert!((loaded.summary.final_voltage.unwrap() - v_end).abs() < 1e-12);

    let samples = store.load_samples(&run_id).expect("samples");
    assert_eq!(samples.len(), trace.len());
    assert_eq!(samples.last().map(|s| s.step), Some(StepKind::Rest));
    for (a, b) in samples.iter().zip(trace.samples()) {
        assert_eq!(a.step, b.step);
        assert_eq!(a.cycle_no, b.cycle_no);
        assert!((a.t - b.t).abs() < 1e-9);
        assert!((a.voltage - b.voltage).abs() < 1e-12);
    }

    let listed = store.list_runs("short charge").expect("list");
    assert_eq!(listed.len(), 1);
    assert!(store.list_runs("other").expect("list").is_empty());

    store.delete_run(&run_id).expect("delete");
    assert!(!store.has_run(&run_id));
    assert!(matches!(
        store.load_manifest(&run_id),
        Err(sp_results::ResultsError::RunNotFound { .. })
    ));

    let _ = fs::remove_dir_all(&config_dir);
}

#[test]
fn identical_configs_share_a_run_id() {
    let a = short_config();
    let mut b = short_config();
    assert_eq!(compute_run_id(&a, "v1"), compute_run_id(&b, "v1"));
    b.protocol.rest_time_s = 6.0;
    assert_ne!(compute_run_id(&a, "v1"), compute_run_id(&b, "v1"));
}
