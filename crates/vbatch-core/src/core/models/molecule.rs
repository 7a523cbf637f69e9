use super::atom::Atom;

/// One line of a molecule's file layout, in input order.
///
/// Atom records reference the atom list by index and keep the original text so a
/// docked pose can be written back with the exact column layout of the input.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// An `ATOM`/`HETATM` line.
    Atom {
        /// Index into [`Molecule::atoms`].
        index: usize,
        /// The original line, if the atom was read from a file.
        raw: Option<String>,
    },
    /// Any other line (`ROOT`, `BRANCH`, `TORSDOF`, `REMARK`, ...), kept verbatim.
    Other(String),
}

/// An ordered collection of atoms forming a ligand or a receptor.
///
/// A `Molecule` with zero atoms is the degenerate sentinel produced for an input that
/// could not be parsed. It keeps its place in the scheduling order and simply yields no
/// poses downstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    /// The identity of the molecule, usually its source path.
    pub name: String,
    atoms: Vec<Atom>,
    records: Vec<Record>,
}

impl Molecule {
    /// Creates an empty molecule with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            atoms: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Creates the degenerate sentinel for an input that failed to parse.
    pub fn degenerate(name: &str) -> Self {
        Self::new(name)
    }

    /// Returns `true` if the molecule has no atoms.
    pub fn is_degenerate(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Appends an atom and its layout record.
    ///
    /// # Return
    ///
    /// Returns the index of the new atom.
    pub fn push_atom(&mut self, atom: Atom, raw: Option<String>) -> usize {
        let index = self.atoms.len();
        self.atoms.push(atom);
        self.records.push(Record::Atom { index, raw });
        index
    }

    /// Appends a non-atom line to the layout.
    pub fn push_other(&mut self, line: String) {
        self.records.push(Record::Other(line));
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| !a.is_hydrogen()).count()
    }

    /// Number of rotatable bonds declared by the `TORSDOF` record, if present.
    pub fn torsion_count(&self) -> Option<usize> {
        self.records.iter().find_map(|r| match r {
            Record::Other(line) if line.starts_with("TORSDOF") => {
                line.split_whitespace().nth(1)?.parse().ok()
            }
            _ => None,
        })
    }
}
