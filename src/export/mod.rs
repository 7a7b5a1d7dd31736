//! Writing edited models back to STEP, and dumping validation results.
//!
//! An export first tries to patch the original text in place, swapping only
//! the edited value tokens. When any edit cannot be expressed that way (for
//! example a `$` becoming a value) the affected property records are
//! regenerated instead. Either way the `HEADER` section is kept verbatim and
//! an unedited model exports byte-identical.

pub mod csv;
pub mod json;
pub mod patch;
pub mod rewrite;

pub use crate::error::ExportError;
pub use csv::{export_result_csv, write_result_csv};
pub use json::export_result_json;
pub use patch::{collect_patches, try_patch, PropertyPatch};
pub use rewrite::{extract_header, rewrite};

use crate::model::IfcModel;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const STEP_MIME_TYPE: &str = "application/x-step";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportMode {
    /// Patch in place, fall back to rewriting.
    #[default]
    Auto,
    /// Always regenerate the edited records.
    Rewrite,
}

/// How the exported text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStrategy {
    Unchanged,
    Patched,
    Rewritten,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfcBlob {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub strategy: ExportStrategy,
}

impl IfcBlob {
    fn new(text: String, strategy: ExportStrategy) -> Self {
        Self {
            bytes: text.into_bytes(),
            mime_type: STEP_MIME_TYPE,
            strategy,
        }
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ExportError> {
        let path_ref = path.as_ref();
        std::fs::write(path_ref, &self.bytes).map_err(|source| ExportError::FileCreate {
            path: path_ref.to_path_buf(),
            source,
        })
    }
}

/// Produces the STEP text of `model` with every edited property applied.
pub fn export_ifc(model: &IfcModel, mode: ExportMode) -> Result<IfcBlob, ExportError> {
    let text = model
        .original_text
        .as_deref()
        .ok_or(ExportError::NoOriginalText)?;

    let patches = collect_patches(model);
    if patches.is_empty() {
        tracing::debug!("export: no edits, returning original text");
        return Ok(IfcBlob::new(text.to_string(), ExportStrategy::Unchanged));
    }

    if mode == ExportMode::Auto {
        if let Some(patched) = try_patch(text, &patches) {
            tracing::info!(edits = patches.len(), "export: patched in place");
            return Ok(IfcBlob::new(patched, ExportStrategy::Patched));
        }
        tracing::info!("export: patching not possible, rewriting records");
    }

    Ok(IfcBlob::new(rewrite(text, &patches), ExportStrategy::Rewritten))
}
