use super::config::SearchConfig;
use super::error::EngineError;
use super::job::JobId;
use crate::core::models::molecule::Molecule;
use crate::core::models::pose::Pose;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

/// A ligand handed to the engine for one search invocation.
#[derive(Debug, Clone)]
pub struct BoundLigand {
    pub job: JobId,
    pub ligand: Molecule,
}

/// The engine's result for one bound ligand.
#[derive(Debug, Clone)]
pub struct DockedLigand {
    pub job: JobId,
    pub ligand: Molecule,
    /// Poses in the order the engine produced them; may be empty.
    pub poses: Vec<Pose>,
}

/// A docking engine holding precomputed receptor and scoring state.
///
/// `Clone` must copy the precomputed state rather than rebuild it; every batch works on
/// its own clone.
pub trait DockingEngine: Clone {
    /// Replaces the engine's unit of work with `ligands`.
    fn bind_ligands(&mut self, ligands: Vec<BoundLigand>);

    /// Searches every bound ligand in one invocation. `batch_len` is the number of
    /// ligands bound for this call.
    fn global_search(
        &mut self,
        search: &SearchConfig,
        batch_len: usize,
    ) -> Result<Vec<DockedLigand>, EngineError>;
}

/// The shared, read-only base engine. Each batch checks out an exclusive working copy.
#[derive(Debug)]
pub struct EngineSnapshot<E: DockingEngine> {
    base: E,
    checkouts: AtomicUsize,
}

impl<E: DockingEngine> EngineSnapshot<E> {
    pub fn new(base: E) -> Self {
        Self {
            base,
            checkouts: AtomicUsize::new(0),
        }
    }

    pub fn base(&self) -> &E {
        &self.base
    }

    /// Clones the base into a working copy; the base is never mutated.
    pub fn checkout(&self) -> E {
        let n = self.checkouts.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(checkout = n, "Checked out engine working copy.");
        self.base.clone()
    }

    pub fn checkouts(&self) -> usize {
        self.checkouts.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct CountingEngine {
        bound: Vec<BoundLigand>,
    }

    impl DockingEngine for CountingEngine {
        fn bind_ligands(&mut self, ligands: Vec<BoundLigand>) {
            self.bound = ligands;
        }

        fn global_search(
            &mut self,
            _search: &SearchConfig,
            _batch_len: usize,
        ) -> Result<Vec<DockedLigand>, EngineError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn checkout_yields_independent_copies() {
        let snapshot = EngineSnapshot::new(CountingEngine::default());
        let mut first = snapshot.checkout();
        first.bind_ligands(vec![BoundLigand {
            job: JobId(0),
            ligand: Molecule::new("a"),
        }]);
        let second = snapshot.checkout();

        assert_eq!(first.bound.len(), 1);
        assert!(second.bound.is_empty());
        assert!(snapshot.base().bound.is_empty());
        assert_eq!(snapshot.checkouts(), 2);
    }
}
