pub mod edit;
pub mod element;
pub mod ifc_model;
pub mod value;

pub use edit::{EditAction, EditHistory};
pub use element::{is_common_pset, Discipline, Element, Property, PropertySet};
pub use ifc_model::IfcModel;
pub use value::PropertyValue;
