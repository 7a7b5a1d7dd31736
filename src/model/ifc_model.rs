use super::{EditAction, Element, PropertyValue};
use crate::error::EditError;
use crate::validation::ElementSnapshot;
use std::collections::BTreeMap;
use std::time::SystemTime;

/// An in-memory IFC model: elements with their property sets, plus the text
/// the model was loaded from.
#[derive(Debug, Default)]
pub struct IfcModel {
    pub schema: String,
    pub description: String,
    pub file_path: String,
    /// Verbatim file content captured at load time. Required for export.
    pub original_text: Option<String>,
    pub elements: Vec<Element>,
}

impl IfcModel {
    #[must_use]
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn element(&self, express_id: u64) -> Option<&Element> {
        self.elements.iter().find(|e| e.express_id == express_id)
    }

    pub fn element_mut(&mut self, express_id: u64) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.express_id == express_id)
    }

    #[must_use]
    pub fn total_elements(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn editable_property_sets(&self) -> usize {
        self.elements
            .iter()
            .flat_map(|e| &e.property_sets)
            .filter(|p| p.is_editable)
            .count()
    }

    /// Sets one property on every listed element and returns the undo record.
    ///
    /// All targets are checked before anything is written, so a failing edit
    /// leaves the model untouched. `modified` is raised when the new value
    /// differs from the load-time value and is never cleared afterwards, even
    /// if a later edit restores the original.
    pub fn update_property_value(
        &mut self,
        element_ids: &[u64],
        pset_name: &str,
        property_name: &str,
        value: PropertyValue,
    ) -> Result<EditAction, EditError> {
        let mut before = BTreeMap::new();
        for &id in element_ids {
            let element = self.element(id).ok_or(EditError::ElementNotFound(id))?;
            let pset = element
                .property_set(pset_name)
                .ok_or_else(|| EditError::PropertySetNotFound {
                    element: id,
                    pset: pset_name.to_string(),
                })?;
            if !pset.is_editable {
                return Err(EditError::ReadOnlyPropertySet {
                    pset: pset_name.to_string(),
                });
            }
            let property = pset
                .property(property_name)
                .ok_or_else(|| EditError::PropertyNotFound {
                    element: id,
                    pset: pset_name.to_string(),
                    property: property_name.to_string(),
                })?;
            before.insert(id, property.value.clone());
        }

        for &id in element_ids {
            self.set_raw_value(id, pset_name, property_name, value.clone());
        }

        Ok(EditAction {
            element_ids: element_ids.to_vec(),
            pset_name: pset_name.to_string(),
            property_name: property_name.to_string(),
            before,
            new_value: value,
            timestamp: SystemTime::now(),
        })
    }

    /// Writes a value without validation. Used by undo/redo.
    pub(crate) fn set_raw_value(
        &mut self,
        express_id: u64,
        pset_name: &str,
        property_name: &str,
        value: PropertyValue,
    ) {
        let property = self
            .element_mut(express_id)
            .and_then(|e| e.property_set_mut(pset_name))
            .and_then(|p| p.property_mut(property_name));
        if let Some(property) = property {
            if value != property.original_value {
                property.modified = true;
            }
            property.value = value;
        }
    }

    /// Point-in-time copy of the fields validation needs.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ElementSnapshot> {
        self.elements.iter().map(ElementSnapshot::from_element).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Property, PropertySet};
    use pretty_assertions::assert_eq;

    fn model() -> IfcModel {
        let mut model = IfcModel::new("IFC4");
        let mut wall = Element::new(100, "2O2Fr$t4X7Zf8NOew3FLOH", "IFCWALL");
        wall.property_sets.push(PropertySet::new(
            200,
            "Pset_WallCommon",
            vec![Property::new(201, "FireRating", "1HR".into(), Some("IfcLabel".into()))],
        ));
        wall.property_sets.push(PropertySet::new(
            300,
            "Custom_Data",
            vec![Property::new(301, "Owner", "ACME".into(), None)],
        ));
        model.elements.push(wall);
        model
    }

    fn fire_rating(model: &IfcModel) -> &crate::model::Property {
        model
            .element(100)
            .and_then(|e| e.property_set("Pset_WallCommon"))
            .and_then(|p| p.property("FireRating"))
            .unwrap()
    }

    #[test]
    fn test_update_marks_modified() {
        let mut model = model();
        let action = model
            .update_property_value(&[100], "Pset_WallCommon", "FireRating", "2HR".into())
            .unwrap();
        assert_eq!(action.before.get(&100), Some(&PropertyValue::from("1HR")));
        let prop = fire_rating(&model);
        assert!(prop.modified);
        assert_eq!(prop.value, PropertyValue::from("2HR"));
        assert_eq!(prop.original_value, PropertyValue::from("1HR"));
    }

    #[test]
    fn test_same_value_does_not_mark_modified() {
        let mut model = model();
        model
            .update_property_value(&[100], "Pset_WallCommon", "FireRating", "1HR".into())
            .unwrap();
        assert!(!fire_rating(&model).modified);
    }

    #[test]
    fn test_modified_flag_is_sticky() {
        let mut model = model();
        model
            .update_property_value(&[100], "Pset_WallCommon", "FireRating", "2HR".into())
            .unwrap();
        model
            .update_property_value(&[100], "Pset_WallCommon", "FireRating", "1HR".into())
            .unwrap();
        let prop = fire_rating(&model);
        assert!(prop.modified);
        assert_eq!(prop.value, prop.original_value);
    }

    #[test]
    fn test_read_only_pset_rejected() {
        let mut model = model();
        let err = model
            .update_property_value(&[100], "Custom_Data", "Owner", "X".into())
            .unwrap_err();
        assert_eq!(
            err,
            EditError::ReadOnlyPropertySet {
                pset: "Custom_Data".into()
            }
        );
    }

    #[test]
    fn test_failed_batch_leaves_model_untouched() {
        let mut model = model();
        let err = model
            .update_property_value(&[100, 999], "Pset_WallCommon", "FireRating", "2HR".into())
            .unwrap_err();
        assert_eq!(err, EditError::ElementNotFound(999));
        assert!(!fire_rating(&model).modified);
    }
}
