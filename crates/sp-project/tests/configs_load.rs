use std::path::Path;

const CONFIGS: [&str; 4] = [
    "01_cc_cycling.yaml",
    "02_cccv_thermal.yaml",
    "03_sei_growth.yaml",
    "04_custom_trace.yaml",
];

fn configs_dir() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs")
}

#[test]
fn sample_configs_load_and_build() {
    for name in CONFIGS {
        let path = configs_dir().join(name);
        let config = sp_project::load_config(&path)
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        config
            .build()
            .unwrap_or_else(|e| panic!("Failed to build {}: {}", name, e));
    }
}

#[test]
fn build_fills_protocol_from_cell() {
    let config = sp_project::load_yaml(&configs_dir().join("04_custom_trace.yaml")).unwrap();
    let setup = config.build().unwrap();

    assert_eq!(setup.protocol.name, "Drive cycle excerpt");
    assert_eq!(setup.protocol.charge_current, setup.cell.capacity_ah());
    assert_eq!(setup.protocol.v_max, setup.cell.v_max());
    assert_eq!(setup.protocol.v_min, setup.cell.v_min());
    let trace = setup.protocol.custom.as_ref().unwrap();
    assert_eq!(trace.len(), 4);
    assert_eq!(trace.current_at(45.0), 0.0);
    assert!(matches!(setup.options.method, sp_sim::ConcMethod::Polynomial(_)));
}

#[test]
fn celsius_temperature_is_converted() {
    let config = sp_project::load_yaml(&configs_dir().join("01_cc_cycling.yaml")).unwrap();
    let setup = config.build().unwrap();
    assert!((setup.cell.temperature() - 298.15).abs() < 1e-9);
    assert_eq!(setup.options.dt, 1.0);
    assert_eq!(setup.protocol.num_cycles, 2);
    assert_eq!(setup.protocol.steps.len(), 4);
}

#[test]
fn built_setup_runs() {
    let mut config = sp_project::load_yaml(&configs_dir().join("01_cc_cycling.yaml")).unwrap();
    config.protocol.num_cycles = 1;
    config.protocol.rest_time_s = 20.0;
    let setup = config.build().unwrap();

    let mut solver = sp_sim::CyclingSolver::new(setup.cell, setup.options).unwrap();
    let trace = solver.solve(&setup.protocol).unwrap();
    assert!(!trace.is_empty());
    assert!(trace.events().is_empty());
    assert_eq!(trace.cycle_numbers().last(), Some(&0));
}
