//! Provides input/output functionality for molecular file formats.
//!
//! Ligands and receptors are read from PDBQT files; docked poses are written back as
//! multi-model PDBQT files named after the ligand they belong to.

pub mod pdbqt;
pub mod traits;
