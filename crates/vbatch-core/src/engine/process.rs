use super::config::{ScoringFunction, SearchConfig, SearchSpace};
use super::error::EngineError;
use super::snapshot::{BoundLigand, DockedLigand, DockingEngine};
use crate::core::io::pdbqt::{self, PdbqtFile, default_output_path};
use crate::core::io::traits::MolecularFile;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, instrument, warn};

/// Settings of the external GPU docking program, fixed for the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessEngineConfig {
    pub program: PathBuf,
    /// Arguments placed before any docking option, e.g. the script of an interpreter.
    pub program_args: Vec<String>,
    pub receptor: Option<PathBuf>,
    pub flex: Option<PathBuf>,
    /// Affinity map prefix, used instead of a receptor.
    pub maps: Option<String>,
    pub scoring: ScoringFunction,
    /// The docking box; may be omitted when the maps define it.
    pub search_space: Option<SearchSpace>,
    /// CPU threads for the program; `None` lets it decide.
    pub cpu: Option<u32>,
    /// Appended after the generated options.
    pub extra_args: Vec<String>,
}

/// A [`DockingEngine`] that runs an external `--gpu_batch` capable docking program once
/// per batch and reads its `*_out.pdbqt` files back.
///
/// Preparation parses the receptor once and fixes the shared argument list; clones
/// share that state and differ only in their bound ligands.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: PathBuf,
    base_args: Vec<String>,
    receptor_atoms: usize,
    bound: Vec<BoundLigand>,
}

fn count_atoms(path: &Path) -> Result<usize, EngineError> {
    PdbqtFile::read_from_path(path)
        .map(|molecule| molecule.atom_count())
        .map_err(|source| EngineError::Input {
            path: path.to_path_buf(),
            source,
        })
}

/// Atoms of the rigid receptor plus the flexible residues, each parsed once.
///
/// # Errors
///
/// Returns [`EngineError::Input`] if either file cannot be parsed.
pub fn receptor_atom_count(receptor: Option<&Path>, flex: Option<&Path>) -> Result<usize, EngineError> {
    let mut atoms = 0;
    for path in [receptor, flex].into_iter().flatten() {
        atoms += count_atoms(path)?;
    }
    Ok(atoms)
}

impl ProcessEngine {
    /// Parses the receptor (and flexible residues) and builds the argument list shared
    /// by every batch.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Input`] if a receptor file cannot be parsed.
    #[instrument(skip_all, name = "prepare_process_engine")]
    pub fn prepare(config: &ProcessEngineConfig) -> Result<Self, EngineError> {
        let receptor_atoms =
            receptor_atom_count(config.receptor.as_deref(), config.flex.as_deref())?;
        let mut base_args = config.program_args.clone();

        if let Some(receptor) = &config.receptor {
            base_args.push("--receptor".to_string());
            base_args.push(receptor.display().to_string());
        }
        if let Some(flex) = &config.flex {
            base_args.push("--flex".to_string());
            base_args.push(flex.display().to_string());
        }
        if let Some(maps) = &config.maps {
            base_args.push("--maps".to_string());
            base_args.push(maps.clone());
        }
        base_args.push("--scoring".to_string());
        base_args.push(config.scoring.as_str().to_string());

        if let Some(space) = &config.search_space {
            for (flag, value) in [
                ("--center_x", space.center.x),
                ("--center_y", space.center.y),
                ("--center_z", space.center.z),
                ("--size_x", space.size.x),
                ("--size_y", space.size.y),
                ("--size_z", space.size.z),
                ("--spacing", space.spacing),
            ] {
                base_args.push(flag.to_string());
                base_args.push(value.to_string());
            }
        }
        if let Some(cpu) = config.cpu {
            base_args.push("--cpu".to_string());
            base_args.push(cpu.to_string());
        }
        base_args.extend(config.extra_args.iter().cloned());

        info!(
            program = %config.program.display(),
            receptor_atoms,
            "External docking engine prepared."
        );
        Ok(Self {
            program: config.program.clone(),
            base_args,
            receptor_atoms,
            bound: Vec::new(),
        })
    }

    /// Atoms of the rigid receptor plus flexible residues; 0 when docking on maps only.
    pub fn receptor_atoms(&self) -> usize {
        self.receptor_atoms
    }

    fn search_args(search: &SearchConfig) -> Vec<String> {
        vec![
            "--exhaustiveness".to_string(),
            search.exhaustiveness.to_string(),
            "--num_modes".to_string(),
            search.num_modes.to_string(),
            "--min_rmsd".to_string(),
            search.min_rmsd.to_string(),
            "--energy_range".to_string(),
            search.energy_range.to_string(),
            "--max_evals".to_string(),
            search.max_evals.to_string(),
            "--max_step".to_string(),
            search.max_steps.to_string(),
            "--seed".to_string(),
            search.seed.to_string(),
        ]
    }

    fn run_program(
        &self,
        search: &SearchConfig,
        output_dir: &Path,
        inputs: &[PathBuf],
        batch_len: usize,
    ) -> Result<(), EngineError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.base_args)
            .args(Self::search_args(search))
            .arg("--dir")
            .arg(output_dir)
            .arg("--gpu_batch")
            .args(inputs);
        debug!(?command, "Launching docking program.");

        let output = command.output().map_err(|e| EngineError::Search {
            batch_len,
            reason: format!("failed to launch '{}': {}", self.program.display(), e),
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Search {
                batch_len,
                reason: format!(
                    "'{}' exited with {}: {}",
                    self.program.display(),
                    output.status,
                    stderr.trim()
                ),
            });
        }
        Ok(())
    }
}

impl DockingEngine for ProcessEngine {
    fn bind_ligands(&mut self, ligands: Vec<BoundLigand>) {
        self.bound = ligands;
    }

    fn global_search(
        &mut self,
        search: &SearchConfig,
        batch_len: usize,
    ) -> Result<Vec<DockedLigand>, EngineError> {
        if batch_len != self.bound.len() {
            return Err(EngineError::Internal(format!(
                "batch of {} ligand(s) announced but {} bound",
                batch_len,
                self.bound.len()
            )));
        }

        let scratch = tempfile::Builder::new().prefix("vbatch-").tempdir()?;
        let input_dir = scratch.path().join("in");
        let output_dir = scratch.path().join("out");
        fs::create_dir(&input_dir)?;
        fs::create_dir(&output_dir)?;

        let mut inputs = Vec::new();
        let mut expected = Vec::with_capacity(self.bound.len());
        for bound in &self.bound {
            if bound.ligand.is_degenerate() {
                expected.push(None);
                continue;
            }
            let input = input_dir.join(format!("job-{}.pdbqt", bound.job.0));
            PdbqtFile::write_to_path(&bound.ligand, &input).map_err(|source| {
                EngineError::Output {
                    path: input.clone(),
                    source,
                }
            })?;
            expected.push(Some(default_output_path(&input, &output_dir)));
            inputs.push(input);
        }

        if inputs.is_empty() {
            debug!(batch_len, "No dockable ligand in batch; skipping the program.");
        } else {
            self.run_program(search, &output_dir, &inputs, batch_len)?;
        }

        let mut results = Vec::with_capacity(self.bound.len());
        for (bound, output) in self.bound.drain(..).zip(expected) {
            let poses = match output {
                Some(path) if path.exists() => {
                    let file = File::open(&path)?;
                    pdbqt::read_poses(&mut BufReader::new(file))
                        .map_err(|source| EngineError::Input { path, source })?
                }
                Some(path) => {
                    warn!(
                        job = %bound.job,
                        "Docking program produced no result file '{}'.",
                        path.display()
                    );
                    Vec::new()
                }
                None => Vec::new(),
            };
            results.push(DockedLigand {
                job: bound.job,
                ligand: bound.ligand,
                poses,
            });
        }
        Ok(results)
    }
}
