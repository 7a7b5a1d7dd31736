use super::{IfcModel, PropertyValue};
use crate::error::EditError;
use std::collections::BTreeMap;
use std::time::SystemTime;

/// One undoable edit: a single new value applied to one property on many elements.
#[derive(Debug, Clone, PartialEq)]
pub struct EditAction {
    pub element_ids: Vec<u64>,
    pub pset_name: String,
    pub property_name: String,
    /// Value of each element before this action.
    pub before: BTreeMap<u64, PropertyValue>,
    pub new_value: PropertyValue,
    pub timestamp: SystemTime,
}

/// Undo/redo stacks for property edits.
#[derive(Debug, Default)]
pub struct EditHistory {
    undo: Vec<EditAction>,
    redo: Vec<EditAction>,
}

impl EditHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an edit to `model` and records it. Clears the redo stack.
    pub fn apply(
        &mut self,
        model: &mut IfcModel,
        element_ids: &[u64],
        pset_name: &str,
        property_name: &str,
        value: PropertyValue,
    ) -> Result<(), EditError> {
        let action = model.update_property_value(element_ids, pset_name, property_name, value)?;
        self.record(action);
        Ok(())
    }

    pub fn record(&mut self, action: EditAction) {
        self.undo.push(action);
        self.redo.clear();
    }

    /// Restores the before-values of the last action. Returns `false` if there
    /// was nothing to undo.
    pub fn undo(&mut self, model: &mut IfcModel) -> bool {
        let Some(action) = self.undo.pop() else {
            return false;
        };
        for (id, before) in &action.before {
            model.set_raw_value(*id, &action.pset_name, &action.property_name, before.clone());
        }
        self.redo.push(action);
        true
    }

    pub fn redo(&mut self, model: &mut IfcModel) -> bool {
        let Some(action) = self.redo.pop() else {
            return false;
        };
        for id in &action.element_ids {
            model.set_raw_value(
                *id,
                &action.pset_name,
                &action.property_name,
                action.new_value.clone(),
            );
        }
        self.undo.push(action);
        true
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}
