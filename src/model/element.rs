use super::PropertyValue;
use serde::{Deserialize, Serialize};

/// Coarse trade classification derived from the IFC class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Discipline {
    Architecture,
    Structure,
    #[serde(rename = "MEP")]
    Mep,
    Unknown,
}

const DISCIPLINES: &[(&str, Discipline)] = &[
    ("IFCWALL", Discipline::Architecture),
    ("IFCWALLSTANDARDCASE", Discipline::Architecture),
    ("IFCCURTAINWALL", Discipline::Architecture),
    ("IFCDOOR", Discipline::Architecture),
    ("IFCWINDOW", Discipline::Architecture),
    ("IFCROOF", Discipline::Architecture),
    ("IFCSTAIR", Discipline::Architecture),
    ("IFCSTAIRFLIGHT", Discipline::Architecture),
    ("IFCRAMP", Discipline::Architecture),
    ("IFCRAILING", Discipline::Architecture),
    ("IFCCOVERING", Discipline::Architecture),
    ("IFCFURNISHINGELEMENT", Discipline::Architecture),
    ("IFCSPACE", Discipline::Architecture),
    ("IFCSLAB", Discipline::Structure),
    ("IFCBEAM", Discipline::Structure),
    ("IFCCOLUMN", Discipline::Structure),
    ("IFCMEMBER", Discipline::Structure),
    ("IFCPLATE", Discipline::Structure),
    ("IFCFOOTING", Discipline::Structure),
    ("IFCPILE", Discipline::Structure),
    ("IFCREINFORCINGBAR", Discipline::Structure),
    ("IFCREINFORCINGMESH", Discipline::Structure),
    ("IFCDUCTSEGMENT", Discipline::Mep),
    ("IFCDUCTFITTING", Discipline::Mep),
    ("IFCPIPESEGMENT", Discipline::Mep),
    ("IFCPIPEFITTING", Discipline::Mep),
    ("IFCCABLESEGMENT", Discipline::Mep),
    ("IFCCABLECARRIERSEGMENT", Discipline::Mep),
    ("IFCFLOWSEGMENT", Discipline::Mep),
    ("IFCFLOWFITTING", Discipline::Mep),
    ("IFCFLOWTERMINAL", Discipline::Mep),
    ("IFCFLOWCONTROLLER", Discipline::Mep),
    ("IFCFLOWMOVINGDEVICE", Discipline::Mep),
    ("IFCFLOWFIXTURE", Discipline::Mep),
    ("IFCAIRTERMINAL", Discipline::Mep),
    ("IFCSANITARYTERMINAL", Discipline::Mep),
    ("IFCLIGHTFIXTURE", Discipline::Mep),
    ("IFCVALVE", Discipline::Mep),
    ("IFCPUMP", Discipline::Mep),
    ("IFCFAN", Discipline::Mep),
    ("IFCDISTRIBUTIONELEMENT", Discipline::Mep),
    ("IFCENERGYCONVERSIONDEVICE", Discipline::Mep),
];

impl Discipline {
    /// Looks up the discipline for an IFC class name (case-insensitive).
    #[must_use]
    pub fn from_ifc_class(ifc_class: &str) -> Self {
        let upper = ifc_class.to_ascii_uppercase();
        DISCIPLINES
            .iter()
            .find(|(class, _)| *class == upper)
            .map_or(Discipline::Unknown, |(_, discipline)| *discipline)
    }
}

/// A single property inside a property set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
    /// Value at load time. Never mutated afterwards.
    pub original_value: PropertyValue,
    /// Set once an edit changed the value away from `original_value`; sticky.
    pub modified: bool,
    /// Nominal IFC type tag, e.g. `IfcLabel`.
    pub nominal_type: Option<String>,
    pub express_id: u64,
}

impl Property {
    #[must_use]
    pub fn new(
        express_id: u64,
        name: impl Into<String>,
        value: PropertyValue,
        nominal_type: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            original_value: value.clone(),
            value,
            modified: false,
            nominal_type,
            express_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySet {
    pub name: String,
    pub express_id: u64,
    pub is_editable: bool,
    pub properties: Vec<Property>,
}

impl PropertySet {
    #[must_use]
    pub fn new(express_id: u64, name: impl Into<String>, properties: Vec<Property>) -> Self {
        let name = name.into();
        Self {
            is_editable: is_common_pset(&name),
            name,
            express_id,
            properties,
        }
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name == name)
    }
}

/// `Pset_<X>Common` with a non-empty `<X>`.
#[must_use]
pub fn is_common_pset(name: &str) -> bool {
    name.strip_prefix("Pset_")
        .and_then(|rest| rest.strip_suffix("Common"))
        .is_some_and(|middle| !middle.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub express_id: u64,
    pub global_id: String,
    pub name: String,
    pub description: Option<String>,
    pub object_type: Option<String>,
    pub tag: Option<String>,
    pub ifc_class: String,
    pub discipline: Discipline,
    pub level: String,
    pub zone: String,
    pub property_sets: Vec<PropertySet>,
}

impl Element {
    #[must_use]
    pub fn new(express_id: u64, global_id: impl Into<String>, ifc_class: impl Into<String>) -> Self {
        let ifc_class = ifc_class.into();
        Self {
            express_id,
            global_id: global_id.into(),
            name: String::new(),
            description: None,
            object_type: None,
            tag: None,
            discipline: Discipline::from_ifc_class(&ifc_class),
            ifc_class,
            level: String::new(),
            zone: String::new(),
            property_sets: Vec::new(),
        }
    }

    #[must_use]
    pub fn property_set(&self, name: &str) -> Option<&PropertySet> {
        self.property_sets.iter().find(|p| p.name == name)
    }

    pub fn property_set_mut(&mut self, name: &str) -> Option<&mut PropertySet> {
        self.property_sets.iter_mut().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discipline_lookup() {
        assert_eq!(Discipline::from_ifc_class("IfcWall"), Discipline::Architecture);
        assert_eq!(Discipline::from_ifc_class("IFCBEAM"), Discipline::Structure);
        assert_eq!(Discipline::from_ifc_class("IfcDuctSegment"), Discipline::Mep);
        assert_eq!(Discipline::from_ifc_class("IfcProxy"), Discipline::Unknown);
    }

    #[test]
    fn test_common_pset_is_editable() {
        assert!(PropertySet::new(1, "Pset_WallCommon", vec![]).is_editable);
        assert!(PropertySet::new(1, "Pset_DoorCommon", vec![]).is_editable);
        assert!(!PropertySet::new(1, "Pset_Common", vec![]).is_editable);
        assert!(!PropertySet::new(1, "Pset_WallCommonExtra", vec![]).is_editable);
        assert!(!PropertySet::new(1, "Custom_WallCommon", vec![]).is_editable);
        assert!(!PropertySet::new(1, "Pset_ManufacturerTypeInformation", vec![]).is_editable);
    }
}
