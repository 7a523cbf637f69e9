use super::error::EngineError;
use super::snapshot::DockedLigand;
use crate::core::io::pdbqt::{self, PdbqtError};
use crate::core::models::pose::select_reported;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the output artifact of one docked ligand.
pub trait PoseWriter {
    fn write(&self, docked: &DockedLigand, path: &Path) -> Result<(), EngineError>;
}

/// Writes multi-model PDBQT files with at most `num_modes` poses, keeping only poses
/// within `energy_range` kcal/mol of the best one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdbqtPoseWriter {
    pub num_modes: usize,
    pub energy_range: f64,
}

impl PdbqtPoseWriter {
    pub fn new(num_modes: usize, energy_range: f64) -> Self {
        Self {
            num_modes,
            energy_range,
        }
    }
}

impl PoseWriter for PdbqtPoseWriter {
    fn write(&self, docked: &DockedLigand, path: &Path) -> Result<(), EngineError> {
        let to_output_error = |source: PdbqtError| EngineError::Output {
            path: path.to_path_buf(),
            source,
        };

        let poses = select_reported(&docked.poses, self.num_modes, self.energy_range);
        let file = File::create(path).map_err(|e| to_output_error(e.into()))?;
        let mut writer = BufWriter::new(file);
        pdbqt::write_poses(&docked.ligand, &poses, &mut writer).map_err(to_output_error)?;
        writer.flush().map_err(|e| to_output_error(e.into()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::molecule::Molecule;
    use crate::core::models::pose::Pose;
    use crate::engine::job::JobId;
    use nalgebra::Point3;
    use std::fs;
    use tempfile::tempdir;

    fn docked(energies: &[f64]) -> DockedLigand {
        let mut ligand = Molecule::new("lig");
        ligand.push_atom(Atom::new(1, "C1", Point3::origin()), None);
        DockedLigand {
            job: JobId(0),
            ligand,
            poses: energies
                .iter()
                .map(|&e| Pose::new(e, vec![Point3::new(1.0, 2.0, 3.0)]))
                .collect(),
        }
    }

    #[test]
    fn writes_selected_poses_best_first() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lig_out.pdbqt");
        PdbqtPoseWriter::new(2, 3.0)
            .write(&docked(&[-7.0, -9.0, -8.5, -1.0]), &path)
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("MODEL").count(), 2);
        let remarks: Vec<&str> = content
            .lines()
            .filter(|l| l.starts_with("REMARK VINA RESULT:"))
            .collect();
        assert!(remarks[0].contains("-9.000"));
        assert!(remarks[1].contains("-8.500"));
    }

    #[test]
    fn ligand_without_poses_gets_an_empty_artifact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty_out.pdbqt");
        PdbqtPoseWriter::new(9, 3.0).write(&docked(&[]), &path).unwrap();
        assert!(path.exists());
        assert!(fs::read_to_string(&path).unwrap().is_empty());
    }

    #[test]
    fn unwritable_path_is_an_output_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("x_out.pdbqt");
        let result = PdbqtPoseWriter::new(9, 3.0).write(&docked(&[-5.0]), &path);
        assert!(matches!(result, Err(EngineError::Output { .. })));
    }
}
