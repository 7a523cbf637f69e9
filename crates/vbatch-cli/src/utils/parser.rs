use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidKeyValue(String),

    #[error("Key cannot be empty in '{0}'.")]
    EmptyKey(String),
}

/// Splits a `-S KEY=VALUE` override at the first `=`.
pub fn parse_key_value(pair: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidKeyValue(pair.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyKey(pair.to_string()));
    }
    Ok((key, value.trim()))
}

/// Reads a ligand index: paths separated by any whitespace, in file order.
pub fn parse_ligand_index(content: &str) -> Vec<PathBuf> {
    content.split_whitespace().map(PathBuf::from).collect()
}
