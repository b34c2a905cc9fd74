//! Error type for the command line.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Config error: {0}")]
    Project(#[from] sp_project::ProjectError),

    #[error("Cell error: {0}")]
    Cell(#[from] sp_cell::CellError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] sp_sim::SimError),

    #[error("Results error: {0}")]
    Results(#[from] sp_results::ResultsError),

    #[error("Failed to write output: {path}")]
    OutputWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{failed} of {total} sweep jobs failed")]
    SweepFailed { failed: usize, total: usize },
}

pub type CliResult<T> = Result<T, CliError>;
