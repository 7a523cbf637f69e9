use super::cost::{MemoryCostModel, Tier};
use super::device::DeviceBudget;
use super::job::{Job, JobSet};
use tracing::{debug, trace};

/// A group of jobs executed together in one GPU invocation. Never empty.
#[derive(Debug, Clone)]
pub struct Batch {
    jobs: Vec<Job>,
    aggregate_cost2: u64,
    predicted_memory: f64,
}

impl Batch {
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Sum of the squared job sizes.
    pub fn aggregate_cost2(&self) -> u64 {
        self.aggregate_cost2
    }

    /// Predicted peak memory of the batch as formed, in MiB. May exceed the budget by
    /// the marginal cost of the last admitted job.
    pub fn predicted_memory(&self) -> f64 {
        self.predicted_memory
    }

    pub fn into_jobs(self) -> Vec<Job> {
        self.jobs
    }
}

/// Greedily cuts the next batch off the front of the remaining jobs.
#[derive(Debug, Clone)]
pub struct BatchPlanner<'a> {
    model: &'a MemoryCostModel,
    budget_mib: f64,
    tier: Tier,
    exhaustiveness: u32,
    uses_ad4: bool,
}

impl<'a> BatchPlanner<'a> {
    pub fn new(
        model: &'a MemoryCostModel,
        budget: &DeviceBudget,
        exhaustiveness: u32,
        uses_ad4: bool,
    ) -> Self {
        Self {
            model,
            budget_mib: budget.effective_mib,
            tier: budget.tier,
            exhaustiveness,
            uses_ad4,
        }
    }

    fn predict(&self, batch_size: usize, aggregate_cost2: u64) -> f64 {
        self.model.predict(
            batch_size,
            self.exhaustiveness,
            aggregate_cost2,
            self.tier,
            self.uses_ad4,
        )
    }

    /// Removes the next batch from the front of `jobs`, or returns `None` once it is empty.
    ///
    /// Admission tests the batch as it stands *before* the candidate joins, so the formed
    /// batch can overshoot the budget by one job. The first candidate is always admitted,
    /// whatever the budget, so every call on a non-empty set makes progress.
    pub fn plan(&self, jobs: &mut JobSet) -> Option<Batch> {
        let mut batch = Vec::new();
        let mut aggregate_cost2 = 0u64;

        while !jobs.is_empty() {
            if !batch.is_empty() {
                let predicted = self.predict(batch.len(), aggregate_cost2);
                if predicted >= self.budget_mib {
                    trace!(predicted, budget = self.budget_mib, "Batch closed by admission check.");
                    break;
                }
            }
            let Some(job) = jobs.pop_front() else {
                break;
            };
            aggregate_cost2 = aggregate_cost2.saturating_add(job.cost2());
            batch.push(job);
        }

        if batch.is_empty() {
            return None;
        }

        let predicted_memory = self.predict(batch.len(), aggregate_cost2);
        debug!(
            size = batch.len(),
            aggregate_cost2,
            predicted_memory,
            remaining = jobs.len(),
            "Planned batch."
        );
        Some(Batch {
            jobs: batch,
            aggregate_cost2,
            predicted_memory,
        })
    }
}
