use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::molecule::{Molecule, Record};
use crate::core::models::pose::Pose;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const POSE_REMARK_PREFIX: &str = "REMARK VINA RESULT:";
const OUTPUT_SUFFIX: &str = "_out.pdbqt";

#[derive(Debug, Error)]
pub enum PdbqtError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PdbqtParseErrorKind,
    },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum PdbqtParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 54 chars)")]
    LineTooShort,
    #[error("Malformed pose remark: '{0}'")]
    InvalidRemark(String),
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn is_atom_record(line: &str) -> bool {
    line.starts_with("ATOM") || line.starts_with("HETATM")
}

fn parse_float(line: &str, start: usize, end: usize, line_num: usize) -> Result<f64, PdbqtError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbqtError::Parse {
        line: line_num,
        kind: PdbqtParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_position(line: &str, line_num: usize) -> Result<Point3<f64>, PdbqtError> {
    if line.len() < 54 {
        return Err(PdbqtError::Parse {
            line: line_num,
            kind: PdbqtParseErrorKind::LineTooShort,
        });
    }
    Ok(Point3::new(
        parse_float(line, 30, 38, line_num)?,
        parse_float(line, 38, 46, line_num)?,
        parse_float(line, 46, 54, line_num)?,
    ))
}

/// Parses one `ATOM`/`HETATM` record using the fixed PDBQT column layout.
pub fn parse_atom_line(line: &str, line_num: usize) -> Result<Atom, PdbqtError> {
    let position = parse_position(line, line_num)?;

    let serial_str = slice_and_trim(line, 6, 11);
    let serial: usize = serial_str.parse().map_err(|_| PdbqtError::Parse {
        line: line_num,
        kind: PdbqtParseErrorKind::InvalidInt {
            columns: "7-11".into(),
            value: serial_str.into(),
        },
    })?;

    let name = slice_and_trim(line, 12, 16);
    if name.is_empty() {
        return Err(PdbqtError::Parse {
            line: line_num,
            kind: PdbqtParseErrorKind::MissingRequiredField {
                columns: "13-16".into(),
            },
        });
    }

    let res_num_str = slice_and_trim(line, 22, 26);
    let residue_number: isize = if res_num_str.is_empty() {
        0
    } else {
        res_num_str.parse().map_err(|_| PdbqtError::Parse {
            line: line_num,
            kind: PdbqtParseErrorKind::InvalidInt {
                columns: "23-26".into(),
                value: res_num_str.into(),
            },
        })?
    };

    let charge_str = slice_and_trim(line, 70, 76);
    let partial_charge = if charge_str.is_empty() {
        0.0
    } else {
        parse_float(line, 70, 76, line_num)?
    };

    let mut atom = Atom::new(serial, name, position);
    atom.residue_name = slice_and_trim(line, 17, 20).to_string();
    atom.chain_id = slice_and_trim(line, 21, 22).chars().next().unwrap_or(' ');
    atom.residue_number = residue_number;
    atom.partial_charge = partial_charge;
    atom.ad_type = slice_and_trim(line, 77, 79).to_string();
    Ok(atom)
}

/// Formats an atom as a PDBQT `ATOM` record at the given position.
pub fn format_atom_line(atom: &Atom, position: &Point3<f64>) -> String {
    format!(
        "{:<6}{:>5} {:<4} {:>3} {:1}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}    {:>6.3} {:<2}",
        "ATOM",
        atom.serial,
        atom.name,
        atom.residue_name,
        atom.chain_id,
        atom.residue_number,
        position.x,
        position.y,
        position.z,
        1.0,
        0.0,
        atom.partial_charge,
        atom.ad_type
    )
}

fn relocate_line(raw: Option<&str>, atom: &Atom, position: &Point3<f64>) -> String {
    match raw {
        Some(line) if line.len() >= 54 && line.is_char_boundary(30) && line.is_char_boundary(54) => {
            format!(
                "{}{:>8.3}{:>8.3}{:>8.3}{}",
                &line[..30],
                position.x,
                position.y,
                position.z,
                &line[54..]
            )
        }
        _ => format_atom_line(atom, position),
    }
}

fn write_layout(
    molecule: &Molecule,
    positions: &[Point3<f64>],
    writer: &mut impl Write,
) -> io::Result<()> {
    let atoms = molecule.atoms();
    for record in molecule.records() {
        match record {
            Record::Atom { index, raw } => {
                let line = relocate_line(raw.as_deref(), &atoms[*index], &positions[*index]);
                writeln!(writer, "{}", line)?;
            }
            Record::Other(line) => writeln!(writer, "{}", line)?,
        }
    }
    Ok(())
}

pub struct PdbqtFile;

impl MolecularFile for PdbqtFile {
    type Error = PdbqtError;

    fn read_from(reader: &mut impl BufRead) -> Result<Molecule, Self::Error> {
        let mut molecule = Molecule::default();
        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            if is_atom_record(&line) {
                let atom = parse_atom_line(&line, line_num)?;
                molecule.push_atom(atom, Some(line));
            } else if !line.trim().is_empty() {
                molecule.push_other(line);
            }
        }
        Ok(molecule)
    }

    fn write_to(molecule: &Molecule, writer: &mut impl Write) -> Result<(), Self::Error> {
        let positions: Vec<_> = molecule.atoms().iter().map(|a| a.position).collect();
        write_layout(molecule, &positions, writer)?;
        Ok(())
    }
}

/// Writes docked poses of `molecule` as consecutive `MODEL` blocks.
///
/// # Errors
///
/// Returns [`PdbqtError::Inconsistency`] if a pose does not have one position per atom.
pub fn write_poses(
    molecule: &Molecule,
    poses: &[&Pose],
    writer: &mut impl Write,
) -> Result<(), PdbqtError> {
    for (i, pose) in poses.iter().enumerate() {
        if pose.positions.len() != molecule.atom_count() {
            return Err(PdbqtError::Inconsistency(format!(
                "pose {} of '{}' has {} positions for {} atoms",
                i + 1,
                molecule.name,
                pose.positions.len(),
                molecule.atom_count()
            )));
        }
        writeln!(writer, "MODEL {}", i + 1)?;
        writeln!(
            writer,
            "{}{:>10.3}{:>11.3}{:>11.3}",
            POSE_REMARK_PREFIX, pose.energy, pose.rmsd_lb, pose.rmsd_ub
        )?;
        write_layout(molecule, &pose.positions, writer)?;
        writeln!(writer, "ENDMDL")?;
    }
    Ok(())
}

fn parse_remark(line: &str, line_num: usize) -> Result<(f64, f64, f64), PdbqtError> {
    let invalid = || PdbqtError::Parse {
        line: line_num,
        kind: PdbqtParseErrorKind::InvalidRemark(line.to_string()),
    };
    let values: Vec<f64> = line[POSE_REMARK_PREFIX.len()..]
        .split_whitespace()
        .map(|v| v.parse().map_err(|_| invalid()))
        .collect::<Result<_, _>>()?;
    match values.as_slice() {
        [energy, lb, ub, ..] => Ok((*energy, *lb, *ub)),
        [energy] => Ok((*energy, 0.0, 0.0)),
        _ => Err(invalid()),
    }
}

/// Reads the poses of a multi-model PDBQT result file.
///
/// Atoms outside any `MODEL` block are treated as a single implicit model.
///
/// # Errors
///
/// Returns [`PdbqtError::MissingRecord`] if a model carries no affinity remark.
pub fn read_poses(reader: &mut impl BufRead) -> Result<Vec<Pose>, PdbqtError> {
    let mut poses = Vec::new();
    let mut current: Option<(Option<(f64, f64, f64)>, Vec<Point3<f64>>)> = None;

    let finish = |model: (Option<(f64, f64, f64)>, Vec<Point3<f64>>)| -> Result<Pose, PdbqtError> {
        let (scores, positions) = model;
        let (energy, rmsd_lb, rmsd_ub) =
            scores.ok_or_else(|| PdbqtError::MissingRecord(POSE_REMARK_PREFIX.to_string()))?;
        Ok(Pose {
            energy,
            rmsd_lb,
            rmsd_ub,
            positions,
        })
    };

    for (line_num, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let line_num = line_num + 1;
        if line.starts_with("MODEL") {
            if let Some(model) = current.take() {
                poses.push(finish(model)?);
            }
            current = Some((None, Vec::new()));
        } else if line.starts_with(POSE_REMARK_PREFIX) {
            let scores = parse_remark(&line, line_num)?;
            current.get_or_insert_with(|| (None, Vec::new())).0 = Some(scores);
        } else if is_atom_record(&line) {
            let position = parse_position(&line, line_num)?;
            current
                .get_or_insert_with(|| (None, Vec::new()))
                .1
                .push(position);
        } else if line.starts_with("ENDMDL") {
            if let Some(model) = current.take() {
                poses.push(finish(model)?);
            }
        }
    }
    if let Some(model) = current.take() {
        poses.push(finish(model)?);
    }
    Ok(poses)
}

/// Derives the output artifact path for a ligand source: the file name with a trailing
/// `.pdbqt` removed and `_out.pdbqt` appended, placed in `output_dir`.
pub fn default_output_path(source: &Path, output_dir: &Path) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());
    let stem = file_name.strip_suffix(".pdbqt").unwrap_or(&file_name);
    output_dir.join(format!("{}{}", stem, OUTPUT_SUFFIX))
}
