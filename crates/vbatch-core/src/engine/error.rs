use thiserror::Error;

use super::job::JobId;
use crate::core::io::pdbqt::PdbqtError;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Failed to read input '{path}': {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: PdbqtError,
    },

    #[error("Search over a batch of {batch_len} ligand(s) failed: {reason}")]
    Search { batch_len: usize, reason: String },

    #[error("Engine returned no result for job {job} ('{name}')")]
    MissingResult { job: JobId, name: String },

    #[error("Failed to write output '{path}': {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: PdbqtError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
