//! Independent runs in parallel.
//!
//! Every job owns its cell, so the solver state of one run is never visible to
//! another. Results come back in job order.

use crate::cycler::{CyclingOptions, CyclingSolver};
use crate::error::SimResult;
use crate::protocol::ProtocolSpec;
use crate::trace::SolutionTrace;
use rayon::prelude::*;
use sp_cell::BatteryCell;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct SweepJob {
    pub label: String,
    pub cell: BatteryCell,
    pub options: CyclingOptions,
    pub protocol: ProtocolSpec,
}

#[derive(Clone, Debug)]
pub struct SweepOutcome {
    pub label: String,
    pub result: SimResult<SolutionTrace>,
}

impl SweepOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

fn run_job(job: SweepJob, cancel: Option<&Arc<AtomicBool>>) -> SweepOutcome {
    debug!(label = %job.label, "sweep job start");
    let result = CyclingSolver::new(job.cell, job.options).and_then(|solver| {
        let mut solver = match cancel {
            Some(flag) => solver.with_cancel_flag(Arc::clone(flag)),
            None => solver,
        };
        solver.solve(&job.protocol)
    });
    SweepOutcome {
        label: job.label,
        result,
    }
}

/// Run every job on the rayon pool.
pub fn solve_many(jobs: Vec<SweepJob>) -> Vec<SweepOutcome> {
    jobs.into_par_iter().map(|job| run_job(job, None)).collect()
}

/// As [`solve_many`], with one cancellation flag shared by all jobs.
pub fn solve_many_with_cancel(jobs: Vec<SweepJob>, cancel: Arc<AtomicBool>) -> Vec<SweepOutcome> {
    jobs.into_par_iter()
        .map(|job| run_job(job, Some(&cancel)))
        .collect()
}
