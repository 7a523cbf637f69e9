use crate::core::models::molecule::Molecule;
use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};

/// Position of a job in the ingested input list. Stable for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub usize);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One ligand to dock, with its cost descriptor and the parsed molecule it owns.
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    source: PathBuf,
    size: u64,
    ligand: Molecule,
}

impl Job {
    /// `size` is the ligand's atom count plus the receptor's, since interaction cost
    /// scales with ligand-receptor pairs.
    pub fn new(id: JobId, source: PathBuf, ligand: Molecule, receptor_atoms: usize) -> Self {
        let size = (ligand.atom_count() + receptor_atoms) as u64;
        Self {
            id,
            source,
            size,
            ligand,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Squared size; the per-job term of the batch's aggregate cost metric.
    pub fn cost2(&self) -> u64 {
        self.size * self.size
    }

    pub fn ligand(&self) -> &Molecule {
        &self.ligand
    }

    pub fn is_degenerate(&self) -> bool {
        self.ligand.is_degenerate()
    }

    pub fn into_ligand(self) -> Molecule {
        self.ligand
    }
}

/// The jobs still awaiting a batch, in ingestion order.
#[derive(Debug, Clone, Default)]
pub struct JobSet {
    pending: VecDeque<Job>,
}

impl JobSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn front(&self) -> Option<&Job> {
        self.pending.front()
    }

    pub fn pop_front(&mut self) -> Option<Job> {
        self.pending.pop_front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.pending.iter()
    }
}

impl From<Vec<Job>> for JobSet {
    fn from(jobs: Vec<Job>) -> Self {
        Self {
            pending: jobs.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use nalgebra::Point3;

    fn ligand_with_atoms(name: &str, count: usize) -> Molecule {
        let mut molecule = Molecule::new(name);
        for i in 0..count {
            molecule.push_atom(Atom::new(i + 1, "C", Point3::new(i as f64, 0.0, 0.0)), None);
        }
        molecule
    }

    #[test]
    fn size_includes_receptor_atoms() {
        let job = Job::new(JobId(0), "a.pdbqt".into(), ligand_with_atoms("a", 50), 1000);
        assert_eq!(job.size(), 1050);
        assert_eq!(job.cost2(), 1_102_500);
        assert!(!job.is_degenerate());
    }

    #[test]
    fn degenerate_job_still_carries_receptor_cost() {
        let job = Job::new(JobId(3), "bad.pdbqt".into(), Molecule::degenerate("bad"), 1000);
        assert!(job.is_degenerate());
        assert_eq!(job.size(), 1000);
        assert_eq!(job.id().to_string(), "#3");
    }

    #[test]
    fn job_set_preserves_order() {
        let mut set = JobSet::from(vec![
            Job::new(JobId(0), "a".into(), ligand_with_atoms("a", 1), 0),
            Job::new(JobId(1), "b".into(), ligand_with_atoms("b", 2), 0),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.front().map(Job::id), Some(JobId(0)));
        assert_eq!(set.pop_front().map(|j| j.id()), Some(JobId(0)));
        assert_eq!(set.pop_front().map(|j| j.id()), Some(JobId(1)));
        assert!(set.is_empty());
        assert!(set.pop_front().is_none());
    }
}
