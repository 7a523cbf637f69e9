use super::job::{Job, JobId, JobSet};
use super::progress::{Progress, ProgressReporter};
use crate::core::io::pdbqt::{PdbqtError, PdbqtFile};
use crate::core::io::traits::MolecularFile;
use crate::core::models::molecule::Molecule;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Parses one ligand source into a molecule.
pub trait LigandLoader: Sync {
    fn load(&self, path: &Path) -> Result<Molecule, PdbqtError>;
}

impl LigandLoader for PdbqtFile {
    fn load(&self, path: &Path) -> Result<Molecule, PdbqtError> {
        PdbqtFile::read_from_path(path)
    }
}

/// Builds the [`JobSet`] from every ligand source before any batching starts.
pub struct JobIngestor<'a, L: LigandLoader> {
    loader: &'a L,
    receptor_atoms: usize,
}

impl<'a, L: LigandLoader> JobIngestor<'a, L> {
    pub fn new(loader: &'a L, receptor_atoms: usize) -> Self {
        Self {
            loader,
            receptor_atoms,
        }
    }

    /// Loads every source, in parallel when the `parallel` feature is enabled.
    ///
    /// Never fails. A source that cannot be parsed becomes a degenerate job in its
    /// original slot. Workers return their jobs to the joining thread, so the resulting
    /// order always equals the input order.
    #[instrument(skip_all, name = "ingest_jobs", fields(sources = sources.len()))]
    pub fn ingest(&self, sources: &[PathBuf], reporter: &ProgressReporter) -> JobSet {
        reporter.report(Progress::PhaseStart {
            name: "Ingesting Ligands",
        });
        reporter.report(Progress::TaskStart {
            total: sources.len() as u64,
        });

        #[cfg(not(feature = "parallel"))]
        let iterator = sources.iter().enumerate();

        #[cfg(feature = "parallel")]
        let iterator = sources.par_iter().enumerate();

        let jobs: Vec<Job> = iterator
            .map(|(index, path)| {
                let job = self.load_job(JobId(index), path);
                reporter.report(Progress::TaskIncrement { amount: 1 });
                job
            })
            .collect();

        reporter.report(Progress::TaskFinish);

        let degenerate = jobs.iter().filter(|job| job.is_degenerate()).count();
        info!(
            jobs = jobs.len(),
            degenerate,
            receptor_atoms = self.receptor_atoms,
            "Ligand ingestion complete."
        );
        reporter.report(Progress::PhaseFinish);
        JobSet::from(jobs)
    }

    fn load_job(&self, id: JobId, path: &Path) -> Job {
        let ligand = match self.loader.load(path) {
            Ok(ligand) => ligand,
            Err(e) => {
                warn!(job = %id, "Failed to parse ligand '{}': {}", path.display(), e);
                Molecule::degenerate(&path.display().to_string())
            }
        };
        Job::new(id, path.to_path_buf(), ligand, self.receptor_atoms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use nalgebra::Point3;
    use std::fs;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Ligand `"<n>.fake"` gets `n` atoms; anything else fails to parse.
    struct AtomCountLoader;

    impl LigandLoader for AtomCountLoader {
        fn load(&self, path: &Path) -> Result<Molecule, PdbqtError> {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            let count: usize = stem
                .parse()
                .map_err(|_| PdbqtError::MissingRecord(format!("atom count in '{}'", stem)))?;
            let mut molecule = Molecule::new(&path.display().to_string());
            for i in 0..count {
                molecule.push_atom(Atom::new(i + 1, "C", Point3::origin()), None);
            }
            Ok(molecule)
        }
    }

    fn sources(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn ingest_preserves_input_order_and_ids() {
        let paths: Vec<PathBuf> = (1..=64).map(|n| PathBuf::from(format!("{}.fake", n))).collect();
        let jobs = JobIngestor::new(&AtomCountLoader, 0).ingest(&paths, &ProgressReporter::new());

        assert_eq!(jobs.len(), 64);
        for (i, job) in jobs.iter().enumerate() {
            assert_eq!(job.id(), JobId(i));
            assert_eq!(job.source(), paths[i].as_path());
            assert_eq!(job.size(), (i + 1) as u64);
        }
    }

    #[test]
    fn unparseable_source_becomes_degenerate_job_in_place() {
        let paths = sources(&["5.fake", "broken.fake", "7.fake"]);
        let jobs = JobIngestor::new(&AtomCountLoader, 1000).ingest(&paths, &ProgressReporter::new());

        let all: Vec<&Job> = jobs.iter().collect();
        assert_eq!(all.len(), 3);
        assert!(!all[0].is_degenerate());
        assert!(all[1].is_degenerate());
        assert_eq!(all[1].id(), JobId(1));
        assert_eq!(all[1].size(), 1000);
        assert_eq!(all[2].size(), 1007);
    }

    #[test]
    fn cost_metric_counts_receptor_atoms() {
        let paths = sources(&["50.fake", "60.fake", "5000.fake"]);
        let jobs = JobIngestor::new(&AtomCountLoader, 1000).ingest(&paths, &ProgressReporter::new());
        let cost2: Vec<u64> = jobs.iter().map(Job::cost2).collect();
        assert_eq!(cost2, vec![1_102_500, 1_123_600, 36_000_000]);
    }

    #[test]
    fn empty_source_list_yields_empty_job_set() {
        let jobs = JobIngestor::new(&AtomCountLoader, 10).ingest(&[], &ProgressReporter::new());
        assert!(jobs.is_empty());
    }

    #[test]
    fn ingest_reports_one_increment_per_source() {
        let increments = AtomicUsize::new(0);
        let phases = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| match event {
            Progress::TaskIncrement { amount } => {
                increments.fetch_add(amount as usize, Ordering::SeqCst);
            }
            Progress::PhaseStart { name } => phases.lock().unwrap().push(name),
            _ => {}
        }));

        let paths = sources(&["1.fake", "2.fake", "x.fake"]);
        JobIngestor::new(&AtomCountLoader, 0).ingest(&paths, &reporter);
        drop(reporter);

        assert_eq!(increments.load(Ordering::SeqCst), 3);
        assert_eq!(*phases.lock().unwrap(), vec!["Ingesting Ligands"]);
    }

    #[test]
    fn pdbqt_loader_reads_files_and_tolerates_garbage() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.pdbqt");
        let bad = dir.path().join("bad.pdbqt");
        fs::write(
            &good,
            "ROOT\nATOM      1  C1  UNL     1       1.000   2.000   3.000  0.00  0.00    +0.123 C \nENDROOT\nTORSDOF 0\n",
        )
        .unwrap();
        fs::write(
            &bad,
            "ATOM      1  C1  UNL     1       x.000   2.000   3.000  0.00  0.00    +0.123 C \n",
        )
        .unwrap();
        let missing = dir.path().join("missing.pdbqt");

        let jobs = JobIngestor::new(&PdbqtFile, 100).ingest(
            &[good.clone(), bad, missing],
            &ProgressReporter::new(),
        );
        let all: Vec<&Job> = jobs.iter().collect();
        assert_eq!(all[0].ligand().atom_count(), 1);
        assert_eq!(all[0].ligand().name, good.display().to_string());
        assert!(all[1].is_degenerate());
        assert!(all[2].is_degenerate());
    }
}
