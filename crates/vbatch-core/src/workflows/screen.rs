use crate::engine::config::ScreenConfig;
use crate::engine::cost::MemoryCostModel;
use crate::engine::device::{DeviceBudget, DeviceProfiler, DeviceQuery};
use crate::engine::error::EngineError;
use crate::engine::executor::BatchExecutor;
use crate::engine::ingest::{JobIngestor, LigandLoader};
use crate::engine::job::JobSet;
use crate::engine::output::PoseWriter;
use crate::engine::planner::BatchPlanner;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::snapshot::{DockingEngine, EngineSnapshot};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};

/// The collaborators a screening campaign runs against.
pub struct ScreenContext<'a, L, D, E, W>
where
    L: LigandLoader,
    D: DeviceQuery,
    E: DockingEngine,
    W: PoseWriter,
{
    pub loader: &'a L,
    pub device: &'a D,
    pub cost_model: &'a MemoryCostModel,
    pub snapshot: &'a EngineSnapshot<E>,
    pub writer: &'a W,
    /// Receptor atoms added to every ligand's size metric.
    pub receptor_atoms: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchRecord {
    /// 1-based, in execution order.
    pub index: usize,
    pub size: usize,
    pub predicted_memory: f64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct ScreenSummary {
    pub budget: DeviceBudget,
    pub batches: Vec<BatchRecord>,
    pub total_jobs: usize,
    /// Every written artifact, in job order.
    pub outputs: Vec<PathBuf>,
}

/// Profiles the device, reports it, and ingests every ligand.
pub(super) fn profile_and_ingest<L: LigandLoader, D: DeviceQuery>(
    ligands: &[PathBuf],
    loader: &L,
    device: &D,
    receptor_atoms: usize,
    memory_limit_mib: Option<f64>,
    reporter: &ProgressReporter,
) -> (DeviceBudget, JobSet) {
    reporter.report(Progress::PhaseStart {
        name: "Profiling Device",
    });
    let budget = DeviceProfiler::profile(device, memory_limit_mib);
    if let Some(info) = budget.device {
        reporter.report(Progress::DeviceReport {
            free_mib: info.free_mib,
            total_mib: info.total_mib,
        });
    }
    reporter.report(Progress::PhaseFinish);

    let jobs = JobIngestor::new(loader, receptor_atoms).ingest(ligands, reporter);
    (budget, jobs)
}

/// Docks every ligand exactly once, one GPU invocation per planned batch.
///
/// Batches run strictly one after another; a batch is planned only after the previous
/// one has written all of its outputs.
///
/// # Errors
///
/// The first failing batch aborts the campaign and its error is returned. Ligands that
/// fail to parse do not fail the campaign.
#[instrument(skip_all, name = "screen_workflow")]
pub fn run<L, D, E, W>(
    ligands: &[PathBuf],
    context: &ScreenContext<L, D, E, W>,
    config: &ScreenConfig,
    reporter: &ProgressReporter,
) -> Result<ScreenSummary, EngineError>
where
    L: LigandLoader,
    D: DeviceQuery,
    E: DockingEngine,
    W: PoseWriter,
{
    let (budget, mut jobs) = profile_and_ingest(
        ligands,
        context.loader,
        context.device,
        context.receptor_atoms,
        config.memory_limit_mib,
        reporter,
    );
    let total_jobs = jobs.len();

    let planner = BatchPlanner::new(
        context.cost_model,
        &budget,
        config.search.exhaustiveness,
        config.scoring.is_ad4(),
    );
    let executor = BatchExecutor::new(
        context.snapshot,
        context.writer,
        &config.search,
        &config.output_dir,
    );

    reporter.report(Progress::PhaseStart {
        name: "Docking Batches",
    });
    reporter.report(Progress::TaskStart {
        total: total_jobs as u64,
    });

    let mut batches = Vec::new();
    let mut outputs = Vec::with_capacity(total_jobs);
    while let Some(batch) = planner.plan(&mut jobs) {
        let index = batches.len() + 1;
        let size = batch.len();
        let predicted_memory = batch.predicted_memory();

        reporter.report(Progress::BatchStart { index, size });
        info!(
            batch = index,
            size,
            predicted_memory,
            remaining = jobs.len(),
            "Executing batch."
        );

        let outcome = executor.execute(batch)?;

        reporter.report(Progress::BatchFinish {
            index,
            elapsed: outcome.elapsed,
        });
        reporter.report(Progress::TaskIncrement {
            amount: size as u64,
        });

        batches.push(BatchRecord {
            index,
            size,
            predicted_memory,
            elapsed: outcome.elapsed,
        });
        outputs.extend(outcome.outputs);
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    info!(
        batches = batches.len(),
        jobs = total_jobs,
        "Screening complete."
    );
    Ok(ScreenSummary {
        budget,
        batches,
        total_jobs,
        outputs,
    })
}
