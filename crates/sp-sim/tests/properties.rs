//! Property tests over protocol traces and solver rest behaviour.

use proptest::prelude::*;
use sp_cell::preset;
use sp_sim::{
    AdvanceInput, ConcMethod, ConcentrationSolver, CrankNicolsonConfig, CustomTrace, EigenConfig,
    ElectrodeSolver, PolynomialConfig,
};

fn held_current(times: &[f64], currents: &[f64], t: f64) -> f64 {
    let mut value = currents[0];
    for (ti, ci) in times.iter().zip(currents) {
        if *ti <= t {
            value = *ci;
        }
    }
    value
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn custom_trace_holds_previous_current(
        rows in prop::collection::vec((0.1f64..10.0, -5.0f64..5.0), 1..20),
        query in -10.0f64..250.0,
    ) {
        let mut t = 0.0;
        let mut times = Vec::new();
        let mut currents = Vec::new();
        for (dt, i) in rows {
            times.push(t);
            currents.push(i);
            t += dt;
        }
        let trace = CustomTrace::new(times.clone(), currents.clone()).unwrap();
        prop_assert_eq!(trace.current_at(query), held_current(&times, &currents, query));
    }

    #[test]
    fn zero_current_leaves_surface_soc_unchanged(
        soc_p in 0.45f64..0.95,
        soc_n in 0.05f64..0.9,
    ) {
        let cell = preset("guo_2011").unwrap().build_cell(soc_p, soc_n, 298.15).unwrap();
        let methods = [
            ConcMethod::Eigen(EigenConfig::default()),
            ConcMethod::CrankNicolson(CrankNicolsonConfig { grid_points: 20, ..CrankNicolsonConfig::default() }),
            ConcMethod::Polynomial(PolynomialConfig::default()),
        ];
        for electrode in [cell.positive(), cell.negative()] {
            let initial = electrode.soc();
            for method in &methods {
                let mut solver = ElectrodeSolver::new(method, electrode).unwrap();
                let mut soc = solver.surface_soc();
                for k in 0..10 {
                    let input = AdvanceInput::from_electrode(electrode, 1.0, k as f64, 0.0);
                    soc = solver.advance(&input).unwrap();
                }
                prop_assert!((soc - initial).abs() < 1e-9, "{} drifted to {}", method.name(), soc);
            }
        }
    }
}
