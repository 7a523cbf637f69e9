use super::screen::profile_and_ingest;
use crate::engine::config::ScreenConfig;
use crate::engine::cost::MemoryCostModel;
use crate::engine::device::{DeviceBudget, DeviceQuery};
use crate::engine::ingest::LigandLoader;
use crate::engine::planner::BatchPlanner;
use crate::engine::progress::ProgressReporter;
use std::path::PathBuf;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedBatch {
    pub index: usize,
    pub predicted_memory: f64,
    pub aggregate_cost2: u64,
    /// Sources of the batch's ligands, in execution order.
    pub ligands: Vec<PathBuf>,
    pub degenerate: usize,
}

#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub budget: DeviceBudget,
    pub batches: Vec<PlannedBatch>,
    pub total_jobs: usize,
}

/// Splits the campaign into batches exactly as [`super::screen::run`] would, without
/// docking anything.
#[instrument(skip_all, name = "plan_workflow")]
pub fn run<L: LigandLoader, D: DeviceQuery>(
    ligands: &[PathBuf],
    loader: &L,
    device: &D,
    cost_model: &MemoryCostModel,
    receptor_atoms: usize,
    config: &ScreenConfig,
    reporter: &ProgressReporter,
) -> PlanSummary {
    let (budget, mut jobs) = profile_and_ingest(
        ligands,
        loader,
        device,
        receptor_atoms,
        config.memory_limit_mib,
        reporter,
    );
    let total_jobs = jobs.len();
    let planner = BatchPlanner::new(
        cost_model,
        &budget,
        config.search.exhaustiveness,
        config.scoring.is_ad4(),
    );

    let mut batches = Vec::new();
    while let Some(batch) = planner.plan(&mut jobs) {
        batches.push(PlannedBatch {
            index: batches.len() + 1,
            predicted_memory: batch.predicted_memory(),
            aggregate_cost2: batch.aggregate_cost2(),
            ligands: batch.jobs().iter().map(|j| j.source().to_path_buf()).collect(),
            degenerate: batch.jobs().iter().filter(|j| j.is_degenerate()).count(),
        });
    }

    info!(
        batches = batches.len(),
        jobs = total_jobs,
        budget_mib = budget.effective_mib,
        "Planning complete."
    );
    PlanSummary {
        budget,
        batches,
        total_jobs,
    }
}
