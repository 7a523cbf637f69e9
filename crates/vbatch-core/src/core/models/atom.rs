use nalgebra::Point3;

/// Represents a single atom record of a ligand or receptor.
///
/// Only the fields needed to schedule, submit and re-emit a molecule are kept.
/// Scoring-specific parameters are the concern of the docking engine, not of this
/// library.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The serial number from the input file.
    pub serial: usize,
    /// The atom name (e.g., "C1", "N3").
    pub name: String,
    /// The residue name the atom belongs to (e.g., "UNL" for ligands).
    pub residue_name: String,
    /// The chain identifier, if any.
    pub chain_id: char,
    /// The residue sequence number.
    pub residue_number: isize,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// The Gasteiger partial charge in elementary charge units.
    pub partial_charge: f64,
    /// The AutoDock atom type (e.g., "C", "A", "OA", "HD").
    pub ad_type: String,
}

impl Atom {
    /// Creates a new `Atom` with default values for most fields.
    ///
    /// # Arguments
    ///
    /// * `serial` - The serial number of the atom.
    /// * `name` - The name of the atom.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(serial: usize, name: &str, position: Point3<f64>) -> Self {
        Self {
            serial,
            name: name.to_string(),
            residue_name: "UNL".to_string(),
            chain_id: ' ',
            residue_number: 1,
            position,
            partial_charge: 0.0,
            ad_type: String::new(),
        }
    }

    /// Returns `true` if the AutoDock type marks a hydrogen atom.
    pub fn is_hydrogen(&self) -> bool {
        matches!(self.ad_type.as_str(), "H" | "HD" | "HS")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_has_expected_default_fields() {
        let atom = Atom::new(7, "C1", Point3::new(1.0, 2.0, 3.0));

        assert_eq!(atom.serial, 7);
        assert_eq!(atom.name, "C1");
        assert_eq!(atom.residue_name, "UNL");
        assert_eq!(atom.chain_id, ' ');
        assert_eq!(atom.residue_number, 1);
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.partial_charge, 0.0);
        assert_eq!(atom.ad_type, "");
    }

    #[test]
    fn is_hydrogen_recognizes_autodock_hydrogen_types() {
        let mut atom = Atom::new(1, "H1", Point3::origin());
        for ty in ["H", "HD", "HS"] {
            atom.ad_type = ty.to_string();
            assert!(atom.is_hydrogen(), "{} should be a hydrogen type", ty);
        }
        for ty in ["C", "A", "OA", "NA", ""] {
            atom.ad_type = ty.to_string();
            assert!(!atom.is_hydrogen(), "{} should not be a hydrogen type", ty);
        }
    }
}
