use super::config::SearchConfig;
use super::error::EngineError;
use super::job::JobId;
use super::output::PoseWriter;
use super::planner::Batch;
use super::snapshot::{BoundLigand, DockedLigand, DockingEngine, EngineSnapshot};
use crate::core::io::pdbqt::default_output_path;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// What one executed batch produced.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// One artifact per job, in batch order.
    pub outputs: Vec<PathBuf>,
    /// Wall time from checkout through the last written artifact.
    pub elapsed: Duration,
    pub poses: usize,
}

/// Runs batches against working copies of a shared engine snapshot.
pub struct BatchExecutor<'a, E: DockingEngine, W: PoseWriter> {
    snapshot: &'a EngineSnapshot<E>,
    writer: &'a W,
    search: &'a SearchConfig,
    output_dir: &'a Path,
}

impl<'a, E: DockingEngine, W: PoseWriter> BatchExecutor<'a, E, W> {
    pub fn new(
        snapshot: &'a EngineSnapshot<E>,
        writer: &'a W,
        search: &'a SearchConfig,
        output_dir: &'a Path,
    ) -> Self {
        Self {
            snapshot,
            writer,
            search,
            output_dir,
        }
    }

    /// Docks the whole batch in a single search call, then writes one artifact per job.
    ///
    /// # Errors
    ///
    /// A search failure, a job the engine returned no result for, or a failed write
    /// aborts the batch. Nothing is retried.
    #[instrument(skip_all, name = "execute_batch", fields(size = batch.len()))]
    pub fn execute(&self, batch: Batch) -> Result<BatchOutcome, EngineError> {
        let start = Instant::now();
        let mut engine = self.snapshot.checkout();

        let jobs = batch.into_jobs();
        let batch_len = jobs.len();
        let mut sources: Vec<(JobId, PathBuf, String)> = Vec::with_capacity(batch_len);
        let bound: Vec<BoundLigand> = jobs
            .into_iter()
            .map(|job| {
                sources.push((job.id(), job.source().to_path_buf(), job.ligand().name.clone()));
                BoundLigand {
                    job: job.id(),
                    ligand: job.into_ligand(),
                }
            })
            .collect();

        engine.bind_ligands(bound);
        let results = engine.global_search(self.search, batch_len)?;

        let mut by_job: HashMap<JobId, DockedLigand> =
            results.into_iter().map(|docked| (docked.job, docked)).collect();

        let mut outputs = Vec::with_capacity(batch_len);
        let mut poses = 0;
        for (job, source, name) in sources {
            let docked = by_job
                .remove(&job)
                .ok_or(EngineError::MissingResult { job, name })?;
            let path = default_output_path(&source, self.output_dir);
            self.writer.write(&docked, &path)?;
            debug!(job = %job, poses = docked.poses.len(), output = %path.display(), "Wrote docking result.");
            poses += docked.poses.len();
            outputs.push(path);
        }

        Ok(BatchOutcome {
            outputs,
            elapsed: start.elapsed(),
            poses,
        })
    }
}
