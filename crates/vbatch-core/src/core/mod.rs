//! # Core Module
//!
//! This module provides the stateless building blocks the scheduler works with: the
//! in-memory molecule representation and the file formats used to read ligands and
//! receptors and to write docked poses.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, record layout and molecules
//! - **File I/O** ([`io`]) - The PDBQT reader, the pose writer and output naming

pub mod io;
pub mod models;
