//! # Core Models Module
//!
//! Data structures used to represent ligands and receptors.
//!
//! ## Key Components
//!
//! - [`atom`] - A single atom record with its coordinates, charge and AutoDock type
//! - [`molecule`] - An ordered collection of atoms together with the non-atom records
//!   (`ROOT`, `BRANCH`, `TORSDOF`, ...) needed to re-emit the molecule with new coordinates
//! - [`pose`] - One docked conformation of a ligand with its predicted affinity
//!
//! ## Usage
//!
//! ```ignore
//! use vbatch::core::models::{atom::Atom, molecule::Molecule};
//! use nalgebra::Point3;
//!
//! let mut ligand = Molecule::new("ligand_001");
//! ligand.push_atom(Atom::new(1, "C1", Point3::new(0.0, 0.0, 0.0)), None);
//! assert_eq!(ligand.atom_count(), 1);
//! ```

pub mod atom;
pub mod molecule;
pub mod pose;
