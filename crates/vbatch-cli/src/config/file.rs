use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSearchConfig {
    pub exhaustiveness: Option<u32>,
    pub num_modes: Option<usize>,
    pub min_rmsd: Option<f64>,
    pub energy_range: Option<f64>,
    pub max_evals: Option<u32>,
    pub max_steps: Option<u32>,
    pub seed: Option<u64>,
    pub mode: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileBoxConfig {
    pub center: Option<[f64; 3]>,
    pub size: Option<[f64; 3]>,
    pub spacing: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileEngineConfig {
    pub program: Option<PathBuf>,
    #[serde(default)]
    pub args: Vec<String>,
    pub cpu: Option<u32>,
}

/// The TOML configuration file. Every field is optional; CLI flags take precedence.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub receptor: Option<PathBuf>,
    pub flex: Option<PathBuf>,
    pub maps: Option<String>,
    #[serde(default)]
    pub ligands: Vec<PathBuf>,
    pub ligand_index: Option<PathBuf>,
    pub scoring: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub max_gpu_memory: Option<f64>,
    pub cost_model: Option<PathBuf>,
    pub search: Option<FileSearchConfig>,
    #[serde(rename = "box")]
    pub search_box: Option<FileBoxConfig>,
    pub engine: Option<FileEngineConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn from_file_reads_nested_tables() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vbatch.toml");
        fs::write(
            &path,
            r#"
            receptor = "rec.pdbqt"
            ligands = ["a.pdbqt", "b.pdbqt"]
            scoring = "vinardo"
            max-gpu-memory = 12000.0

            [search]
            exhaustiveness = 512
            mode = "fast"

            [box]
            center = [1.0, -2.0, 3.5]
            size = [20.0, 20.0, 24.0]

            [engine]
            program = "/opt/vina-gpu/bin/vina-gpu"
            args = ["--verbosity", "0"]
            "#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        assert_eq!(config.receptor, Some(PathBuf::from("rec.pdbqt")));
        assert_eq!(config.ligands.len(), 2);
        assert_eq!(config.max_gpu_memory, Some(12000.0));
        let search = config.search.unwrap();
        assert_eq!(search.exhaustiveness, Some(512));
        assert_eq!(search.mode.as_deref(), Some("fast"));
        assert_eq!(config.search_box.unwrap().center, Some([1.0, -2.0, 3.5]));
        assert_eq!(config.engine.unwrap().args, vec!["--verbosity", "0"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vbatch.toml");
        fs::write(&path, "[search]\nexhaustivness = 8\n").unwrap();
        assert!(matches!(
            FileConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            FileConfig::from_file(&dir.path().join("absent.toml")),
            Err(CliError::Io(_))
        ));
    }
}
