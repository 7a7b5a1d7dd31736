//! IDS (Information Delivery Specification) import.

pub mod convert;

pub use crate::error::IdsError;
pub use convert::convert_ids;

use crate::validation::RulePack;
use std::path::Path;

/// A converted rule pack plus the non-fatal problems met on the way.
#[derive(Debug, Clone)]
pub struct IdsConversion {
    pub pack: RulePack,
    pub warnings: Vec<String>,
}

/// Reads and converts an IDS file.
pub fn load_ids<P: AsRef<Path>>(path: P) -> Result<IdsConversion, IdsError> {
    let xml = std::fs::read_to_string(&path).map_err(|source| IdsError::FileRead {
        path: path.as_ref().to_path_buf(),
        source,
    })?;
    convert_ids(&xml)
}
