//! # IFC Checker
//!
//! Property-level quality checks and edits for IFC (STEP) models.
//!
//! ## Features
//!
//! - Load IFC files (IFC2x3 and IFC4 schemas) into an editable element model
//! - Validate elements against JSON rule packs or IDS documents
//! - Edit `Pset_*Common` properties with undo/redo
//! - Export edits back to STEP, patching in place where possible
//! - Dump validation results to CSV and JSON
//!
//! ## Example
//!
//! ```no_run
//! use ifc_checker::parser::load_model;
//! use ifc_checker::validation::{builtin::basic_pack, validate, DEFAULT_PROGRESS_INTERVAL};
//!
//! let model = load_model("model.ifc").expect("Failed to parse");
//! let result = validate(&model.snapshot(), &basic_pack(), DEFAULT_PROGRESS_INTERVAL, |_| {});
//! println!("{} of {} elements passed", result.passed, result.total_elements);
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod ids;
pub mod model;
pub mod parser;
pub mod validation;
