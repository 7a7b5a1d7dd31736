use crate::model::{Discipline, Element, PropertyValue};
use serde::{Deserialize, Serialize};

/// Property set name under which element attributes (`Name`, `GlobalId`, ...)
/// are exposed to rules.
pub const ATTRIBUTES_PSET: &str = "__attributes__";

/// Read-only copy of the element fields validation needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub express_id: u64,
    pub global_id: String,
    pub name: String,
    pub ifc_class: String,
    pub discipline: Discipline,
    pub property_sets: Vec<PsetSnapshot>,
    /// Entity attributes addressable through [`ATTRIBUTES_PSET`].
    pub attributes: Vec<(String, PropertyValue)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PsetSnapshot {
    pub name: String,
    pub properties: Vec<(String, PropertyValue)>,
}

/// Outcome of resolving `pset.property` on an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    MissingPropertySet,
    MissingProperty,
    Found(&'a PropertyValue),
}

impl ElementSnapshot {
    #[must_use]
    pub fn new(express_id: u64, ifc_class: impl Into<String>) -> Self {
        let ifc_class = ifc_class.into();
        Self {
            express_id,
            global_id: String::new(),
            name: String::new(),
            discipline: Discipline::from_ifc_class(&ifc_class),
            ifc_class,
            property_sets: Vec::new(),
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_pset(mut self, name: &str, properties: Vec<(&str, PropertyValue)>) -> Self {
        self.property_sets.push(PsetSnapshot {
            name: name.to_string(),
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        });
        self
    }

    #[must_use]
    pub fn from_element(element: &Element) -> Self {
        let mut attributes = vec![
            ("GlobalId".to_string(), PropertyValue::from(element.global_id.as_str())),
            ("Name".to_string(), PropertyValue::from(element.name.as_str())),
        ];
        let optional = [
            ("Description", &element.description),
            ("ObjectType", &element.object_type),
            ("Tag", &element.tag),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                attributes.push((name.to_string(), PropertyValue::from(value.as_str())));
            }
        }

        Self {
            express_id: element.express_id,
            global_id: element.global_id.clone(),
            name: element.name.clone(),
            ifc_class: element.ifc_class.clone(),
            discipline: element.discipline,
            property_sets: element
                .property_sets
                .iter()
                .map(|pset| PsetSnapshot {
                    name: pset.name.clone(),
                    properties: pset
                        .properties
                        .iter()
                        .map(|p| (p.name.clone(), p.value.clone()))
                        .collect(),
                })
                .collect(),
            attributes,
        }
    }

    /// Resolves a property. The attributes pseudo-set always exists.
    #[must_use]
    pub fn lookup(&self, pset_name: &str, property_name: &str) -> Lookup<'_> {
        let properties = if pset_name == ATTRIBUTES_PSET {
            &self.attributes
        } else {
            match self.property_sets.iter().find(|p| p.name == pset_name) {
                Some(pset) => &pset.properties,
                None => return Lookup::MissingPropertySet,
            }
        };

        properties
            .iter()
            .find(|(name, _)| name == property_name)
            .map_or(Lookup::MissingProperty, |(_, value)| Lookup::Found(value))
    }
}
