//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};
use sp_project::RunConfig;

/// SHA-256 over the serialized configuration and the solver version.
pub fn compute_run_id(config: &RunConfig, solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    let config_json = serde_json::to_string(config).unwrap_or_default();
    hasher.update(config_json.as_bytes());

    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_project::schema::*;

    fn config(name: &str) -> RunConfig {
        RunConfig {
            version: 1,
            name: name.to_string(),
            cell: CellDef {
                preset: Some("guo_2011".to_string()),
                ..CellDef::default()
            },
            solver: SolverDef::default(),
            protocol: ProtocolDef::default(),
        }
    }

    #[test]
    fn hash_stability() {
        let hash1 = compute_run_id(&config("a"), "v1");
        let hash2 = compute_run_id(&config("a"), "v1");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let base = config("a");
        let mut finer = base.clone();
        finer.solver.dt_s = 0.05;

        assert_ne!(compute_run_id(&base, "v1"), compute_run_id(&finer, "v1"));
        assert_ne!(compute_run_id(&base, "v1"), compute_run_id(&base, "v2"));
    }
}
