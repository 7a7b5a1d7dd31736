pub mod ifc;
pub mod step;

pub use crate::error::ParseError;
pub use ifc::{load_model, model_from_text};
pub use step::{split_top_level, split_top_level_spans, StepEntity, StepFile, StepValue};
