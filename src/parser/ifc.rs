use crate::error::ParseError;
use crate::model::{Element, IfcModel, Property, PropertySet, PropertyValue};
use crate::parser::step::{StepEntity, StepFile, StepValue};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

// Upper-case STEP type name → IFC nominal type tag
const NOMINAL_TYPES: &[(&str, &str)] = &[
    ("IFCLABEL", "IfcLabel"),
    ("IFCTEXT", "IfcText"),
    ("IFCIDENTIFIER", "IfcIdentifier"),
    ("IFCBOOLEAN", "IfcBoolean"),
    ("IFCLOGICAL", "IfcLogical"),
    ("IFCREAL", "IfcReal"),
    ("IFCINTEGER", "IfcInteger"),
    ("IFCCOUNTMEASURE", "IfcCountMeasure"),
    ("IFCLENGTHMEASURE", "IfcLengthMeasure"),
    ("IFCPOSITIVELENGTHMEASURE", "IfcPositiveLengthMeasure"),
    ("IFCAREAMEASURE", "IfcAreaMeasure"),
    ("IFCVOLUMEMEASURE", "IfcVolumeMeasure"),
    ("IFCPLANEANGLEMEASURE", "IfcPlaneAngleMeasure"),
    ("IFCRATIOMEASURE", "IfcRatioMeasure"),
    ("IFCPOSITIVERATIOMEASURE", "IfcPositiveRatioMeasure"),
    ("IFCNORMALISEDRATIOMEASURE", "IfcNormalisedRatioMeasure"),
    ("IFCTHERMALTRANSMITTANCEMEASURE", "IfcThermalTransmittanceMeasure"),
    ("IFCMASSMEASURE", "IfcMassMeasure"),
];

/// Loads an IFC file into an [`IfcModel`].
///
/// The file text is kept verbatim in [`IfcModel::original_text`] so the model
/// can later be exported with edits applied.
///
/// # Errors
///
/// Returns [`ParseError::FileRead`] if the file cannot be read.
/// Returns [`ParseError::InvalidStep`] if the STEP format is malformed.
///
/// # Example
///
/// ```no_run
/// use ifc_checker::parser::load_model;
///
/// let model = load_model("model.ifc")?;
/// println!("{} elements", model.total_elements());
/// # Ok::<(), ifc_checker::error::ParseError>(())
/// ```
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<IfcModel, ParseError> {
    let content = std::fs::read_to_string(&path).map_err(|source| ParseError::FileRead {
        path: path.as_ref().to_path_buf(),
        source,
    })?;

    let mut model = model_from_text(content)?;
    model.file_path = path.as_ref().to_string_lossy().to_string();
    Ok(model)
}

/// Builds a model from STEP text already in memory.
pub fn model_from_text(content: String) -> Result<IfcModel, ParseError> {
    let step_file = StepFile::parse(&content)?;

    let mut model = IfcModel::new(step_file.schema.clone());
    model.description = step_file.description.clone();

    let property_sets = extract_property_sets(&step_file);
    let element_psets = extract_pset_assignments(&step_file);
    let element_levels = extract_spatial_containment(&step_file);
    let element_zones = extract_zones(&step_file);

    let mut element_ids: Vec<u64> = element_psets
        .keys()
        .chain(element_levels.keys())
        .copied()
        .collect();
    element_ids.sort_unstable();
    element_ids.dedup();

    for id in element_ids {
        let Some(entity) = step_file.get_entity(id) else {
            continue;
        };
        let Some(global_id) = entity.string_at(0) else {
            continue;
        };

        let mut element = Element::new(id, global_id, &entity.entity_type);
        element.name = entity
            .string_at(2)
            .map_or_else(|| format!("{} #{id}", entity.entity_type), str::to_string);
        element.description = entity.string_at(3).map(str::to_string);
        element.object_type = entity.string_at(4).map(str::to_string);
        element.tag = entity.string_at(7).map(str::to_string);
        element.level = element_levels.get(&id).cloned().unwrap_or_default();
        element.zone = element_zones.get(&id).cloned().unwrap_or_default();

        if let Some(pset_ids) = element_psets.get(&id) {
            element.property_sets = pset_ids
                .iter()
                .filter_map(|pid| property_sets.get(pid).cloned())
                .collect();
        }

        model.elements.push(element);
    }

    model.original_text = Some(content);
    Ok(model)
}

/// Extract element → storey name from IFCRELCONTAINEDINSPATIALSTRUCTURE
fn extract_spatial_containment(step_file: &StepFile) -> HashMap<u64, String> {
    let mut element_to_level = HashMap::new();

    for rel in step_file.get_entities_by_type("IFCRELCONTAINEDINSPATIALSTRUCTURE") {
        // Index 4 = RelatedElements (list of element refs)
        // Index 5 = RelatingStructure (spatial element ref)
        let elements = rel.values.get(4).map(StepValue::references).unwrap_or_default();
        let Some(structure) = rel.reference_at(5).and_then(|id| step_file.get_entity(id)) else {
            continue;
        };

        let level = if structure.entity_type == "IFCBUILDINGSTOREY" {
            structure
                .string_at(2)
                .map_or_else(|| format!("Storey #{}", structure.id), str::to_string)
        } else {
            String::new()
        };

        for elem_id in elements {
            element_to_level.insert(elem_id, level.clone());
        }
    }

    element_to_level
}

/// Extract element → zone name from IFCRELASSIGNSTOGROUP where the group is an IFCZONE
fn extract_zones(step_file: &StepFile) -> HashMap<u64, String> {
    let mut element_to_zone = HashMap::new();

    for rel in step_file.get_entities_by_type("IFCRELASSIGNSTOGROUP") {
        // Index 4 = RelatedObjects, index 6 = RelatingGroup
        let Some(group) = rel.reference_at(6).and_then(|id| step_file.get_entity(id)) else {
            continue;
        };
        if group.entity_type != "IFCZONE" {
            continue;
        }
        let zone = group.string_at(2).unwrap_or_default().to_string();
        for elem_id in rel.values.get(4).map(StepValue::references).unwrap_or_default() {
            element_to_zone.insert(elem_id, zone.clone());
        }
    }

    element_to_zone
}

/// Element → ordered property set ids, via IFCRELDEFINESBYPROPERTIES.
fn extract_pset_assignments(step_file: &StepFile) -> BTreeMap<u64, Vec<u64>> {
    let mut element_psets: BTreeMap<u64, Vec<u64>> = BTreeMap::new();

    for rel in step_file.get_entities_by_type("IFCRELDEFINESBYPROPERTIES") {
        let Some(pset_id) = rel.reference_at(5) else {
            continue;
        };
        for elem_id in rel.values.get(4).map(StepValue::references).unwrap_or_default() {
            let psets = element_psets.entry(elem_id).or_default();
            if !psets.contains(&pset_id) {
                psets.push(pset_id);
            }
        }
    }

    element_psets
}

fn extract_property_sets(step_file: &StepFile) -> HashMap<u64, PropertySet> {
    let mut property_sets = HashMap::new();

    for pset in step_file.get_entities_by_type("IFCPROPERTYSET") {
        let name = pset.string_at(2).unwrap_or_default();
        let properties = pset
            .values
            .get(4)
            .map(StepValue::references)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|prop_id| step_file.get_entity(prop_id))
            .filter_map(single_value_property)
            .collect();

        property_sets.insert(pset.id, PropertySet::new(pset.id, name, properties));
    }

    property_sets
}

fn single_value_property(entity: &StepEntity) -> Option<Property> {
    if entity.entity_type != "IFCPROPERTYSINGLEVALUE" {
        return None;
    }
    let name = entity.string_at(0).filter(|n| !n.is_empty())?;

    let (value, nominal_type) = match entity.values.get(2) {
        Some(StepValue::Typed(type_name, inner)) => {
            (to_property_value(inner), Some(nominal_type_tag(type_name)))
        }
        Some(other) => (to_property_value(other), None),
        None => (PropertyValue::Absent, None),
    };

    Some(Property::new(entity.id, name, value, nominal_type))
}

fn to_property_value(value: &StepValue) -> PropertyValue {
    match value {
        StepValue::String(s) | StepValue::Enum(s) => PropertyValue::String(s.clone()),
        StepValue::Real(f) => PropertyValue::Number(*f),
        StepValue::Integer(i) => PropertyValue::Number(*i as f64),
        StepValue::Boolean(b) => PropertyValue::Boolean(*b),
        StepValue::Typed(_, inner) => to_property_value(inner),
        StepValue::Reference(id) => PropertyValue::String(format!("#{id}")),
        StepValue::List(_) | StepValue::Null | StepValue::Derived => PropertyValue::Absent,
    }
}

fn nominal_type_tag(step_type: &str) -> String {
    NOMINAL_TYPES
        .iter()
        .find(|(step, _)| step.eq_ignore_ascii_case(step_type))
        .map_or_else(
            || {
                // IFCFOOMEASURE → IfcFoomeasure
                let lower = step_type.to_ascii_lowercase();
                match lower.strip_prefix("ifc") {
                    Some(rest) => {
                        let mut chars = rest.chars();
                        chars.next().map_or_else(
                            || "Ifc".to_string(),
                            |first| format!("Ifc{}{}", first.to_ascii_uppercase(), chars.as_str()),
                        )
                    }
                    None => step_type.to_string(),
                }
            },
            |(_, tag)| (*tag).to_string(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Discipline;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('sample.ifc','2024-01-01T00:00:00',(''),(''),'','','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#10=IFCBUILDINGSTOREY('3aT0xk$9z2lQ6Q_a9wLaC1',$,'Level 1',$,$,$,$,$,.ELEMENT.,0.);
#20=IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',$,'Wall-01','Load-bearing exterior wall','WallType-A',$,$,'W1',$);
#21=IFCDOOR('1hqIFTRjfV6AWq_bMtnZwI',$,'Door-01',$,$,$,$,$,2100.,900.,$,$,$);
#30=IFCPROPERTYSINGLEVALUE('FireRating',$,IFCLABEL('2HR'),$);
#31=IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN(.T.),$);
#32=IFCPROPERTYSINGLEVALUE('ThermalTransmittance',$,IFCTHERMALTRANSMITTANCEMEASURE(0.24),$);
#33=IFCPROPERTYSINGLEVALUE('AcousticRating',$,$,$);
#40=IFCPROPERTYSET('0Fh4BxQ0jEuBO0A8cHNN2b',$,'Pset_WallCommon',$,(#30,#31,#32,#33));
#41=IFCPROPERTYSET('2Zp8mT0xj3Kf9W_PqHNN2c',$,'Custom_Data',$,(#30));
#50=IFCRELDEFINESBYPROPERTIES('1kTvXnbbzCWw8lcMd1dR4o',$,$,$,(#20),#40);
#51=IFCRELDEFINESBYPROPERTIES('0q6KLgk4f6Jhx9IRaoc1PS',$,$,$,(#20),#41);
#60=IFCRELCONTAINEDINSPATIALSTRUCTURE('3Sa3dTJGn0H8TQIGiuGQd5',$,$,$,(#20,#21),#10);
#70=IFCZONE('1Vg$hfxLT0ZvWu7Z0G1Lyt',$,'Fire Zone A',$,$);
#71=IFCRELASSIGNSTOGROUP('0dXwA9rVr8Ph5nZ3U1V3zd',$,$,$,(#20),$,#70);
ENDSEC;
END-ISO-10303-21;
";

    #[test]
    fn test_model_from_text() {
        let model = model_from_text(SAMPLE.to_string()).unwrap();
        assert_eq!(model.schema, "IFC4");
        assert_eq!(model.total_elements(), 2);
        assert_eq!(model.original_text.as_deref(), Some(SAMPLE));

        let wall = model.element(20).unwrap();
        assert_eq!(wall.name, "Wall-01");
        assert_eq!(wall.tag.as_deref(), Some("W1"));
        assert_eq!(wall.description.as_deref(), Some("Load-bearing exterior wall"));
        assert_eq!(wall.object_type.as_deref(), Some("WallType-A"));
        assert_eq!(wall.discipline, Discipline::Architecture);
        assert_eq!(wall.level, "Level 1");
        assert_eq!(wall.zone, "Fire Zone A");
        assert_eq!(wall.property_sets.len(), 2);

        let common = wall.property_set("Pset_WallCommon").unwrap();
        assert!(common.is_editable);
        assert_eq!(common.express_id, 40);
        let fire = common.property("FireRating").unwrap();
        assert_eq!(fire.express_id, 30);
        assert_eq!(fire.value, PropertyValue::from("2HR"));
        assert_eq!(fire.nominal_type.as_deref(), Some("IfcLabel"));
        assert_eq!(
            common.property("IsExternal").unwrap().value,
            PropertyValue::Boolean(true)
        );
        assert_eq!(
            common.property("ThermalTransmittance").unwrap().value,
            PropertyValue::Number(0.24)
        );
        assert_eq!(
            common.property("AcousticRating").unwrap().value,
            PropertyValue::Absent
        );
        assert!(!wall.property_set("Custom_Data").unwrap().is_editable);

        let door = model.element(21).unwrap();
        assert!(door.property_sets.is_empty());
        assert!(door.description.is_none());
        assert!(door.object_type.is_none());
        assert_eq!(door.zone, "");
    }

    #[test]
    fn test_nominal_type_fallback() {
        assert_eq!(nominal_type_tag("IFCLABEL"), "IfcLabel");
        assert_eq!(nominal_type_tag("IFCPOWERMEASURE"), "IfcPowermeasure");
    }
}
