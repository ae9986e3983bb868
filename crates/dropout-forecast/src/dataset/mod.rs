mod normalizer;
mod parser;
mod raw;

pub use normalizer::{normalize, normalize_value};
pub use raw::{is_affirmative, parse_numeric, RawCell, RawRecord};

use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug)]
pub enum DatasetImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for DatasetImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetImportError::Io(err) => write!(f, "failed to read municipal dataset: {}", err),
            DatasetImportError::Csv(err) => write!(f, "invalid municipal CSV data: {}", err),
        }
    }
}

impl std::error::Error for DatasetImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetImportError::Io(err) => Some(err),
            DatasetImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for DatasetImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for DatasetImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads the yearly municipal education export into raw records.
pub struct MunicipalDatasetImporter;

impl MunicipalDatasetImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>, DatasetImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<RawRecord>, DatasetImportError> {
        let parsed = parser::parse_records(reader)?;
        info!(
            rows = parsed.records.len(),
            skipped = parsed.skipped,
            "municipal dataset imported"
        );
        Ok(parsed.records)
    }
}
