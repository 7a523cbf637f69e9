use crate::core::models::molecule::Molecule;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing molecular file formats.
///
/// Implementors handle format-specific parsing and serialization; the path-based
/// helpers are provided on top of the reader/writer methods.
pub trait MolecularFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a molecule from a buffered reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The buffered reader to read from.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Molecule, Self::Error>;

    /// Writes a molecule to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(molecule: &Molecule, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a molecule from a file path.
    ///
    /// The molecule is named after the path it was read from.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Molecule, Self::Error> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let mut molecule = Self::read_from(&mut reader)?;
        molecule.name = path.as_ref().display().to_string();
        Ok(molecule)
    }

    /// Writes a molecule to a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(molecule: &Molecule, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(molecule, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
