use super::IdsConversion;
use crate::error::IdsError;
use crate::model::PropertyValue;
use crate::validation::{
    Applicability, CheckType, ExpectedValue, Requirement, RulePack, Severity, ValidationRule,
    ATTRIBUTES_PSET,
};
use roxmltree::{Document, Node};

/// Facets that are recognised but cannot be expressed as a requirement.
const UNSUPPORTED_FACETS: &[&str] = &["classification", "material", "partOf"];

const NUMERIC_DATA_TYPES: &[&str] = &[
    "IFCREAL",
    "IFCINTEGER",
    "IFCNUMERICMEASURE",
    "IFCCOUNTMEASURE",
    "IFCLENGTHMEASURE",
    "IFCPOSITIVELENGTHMEASURE",
    "IFCAREAMEASURE",
    "IFCVOLUMEMEASURE",
    "IFCMASSMEASURE",
    "IFCPLANEANGLEMEASURE",
    "IFCRATIOMEASURE",
    "IFCPOSITIVERATIOMEASURE",
    "IFCNORMALISEDRATIOMEASURE",
    "IFCTHERMALTRANSMITTANCEMEASURE",
];

/// A value or restriction attached to a facet parameter.
#[derive(Debug, Clone, PartialEq)]
enum Constraint {
    Literal(String),
    Pattern(String),
    Enumeration(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Cardinality {
    Required,
    Optional,
    Prohibited,
}

/// Converts an IDS document into a rule pack.
///
/// Applicability is taken from `entity` facets only. `property` and
/// `attribute` requirements become rule requirements; anything else is
/// skipped with a warning.
pub fn convert_ids(xml: &str) -> Result<IdsConversion, IdsError> {
    let doc = Document::parse(xml).map_err(|e| IdsError::InvalidXml {
        message: e.to_string(),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "ids" {
        return Err(IdsError::InvalidXml {
            message: format!("expected <ids> root, found <{}>", root.tag_name().name()),
        });
    }

    let info = child(root, "info");
    let info_text = |name: &str| info.and_then(|i| child(i, name)).and_then(text_of);

    let specifications: Vec<Node> = root
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "specification")
        .collect();
    if specifications.is_empty() {
        return Err(IdsError::NoSpecifications);
    }

    let mut warnings = Vec::new();
    let rules = specifications
        .iter()
        .enumerate()
        .map(|(index, spec)| convert_specification(*spec, index, &mut warnings))
        .collect();

    let pack = RulePack {
        name: info_text("title").unwrap_or_else(|| "IDS Rules".to_string()),
        version: info_text("version").unwrap_or_else(|| "1.0.0".to_string()),
        description: info_text("description").unwrap_or_default(),
        rules,
    };

    Ok(IdsConversion { pack, warnings })
}

fn convert_specification(spec: Node, index: usize, warnings: &mut Vec<String>) -> ValidationRule {
    let name = spec
        .attribute("name")
        .map_or_else(|| format!("Specification {}", index + 1), str::to_string);
    let id = format!("IDS-{}-{}", slug(&name), index + 1);

    let mut ifc_classes = Vec::new();
    if let Some(applicability) = child(spec, "applicability") {
        for facet in elements(applicability) {
            let facet_name = facet.tag_name().name();
            if facet_name == "entity" {
                match child(facet, "name").and_then(constraint_of) {
                    Some(Constraint::Literal(class)) => ifc_classes.push(class.to_uppercase()),
                    Some(Constraint::Enumeration(classes)) => {
                        ifc_classes.extend(classes.iter().map(|c| c.to_uppercase()));
                    }
                    _ => warnings.push(format!(
                        "{name}: entity facet without a literal name is ignored"
                    )),
                }
            } else if UNSUPPORTED_FACETS.contains(&facet_name) {
                tracing::warn!(specification = %name, facet = facet_name, "unsupported applicability facet");
                warnings.push(format!("{name}: {facet_name} applicability is not supported"));
            } else {
                warnings.push(format!("{name}: {facet_name} applicability is ignored"));
            }
        }
    }

    let mut requirements = Vec::new();
    if let Some(block) = child(spec, "requirements") {
        for facet in elements(block) {
            match facet.tag_name().name() {
                "property" => {
                    if let Some(req) = property_requirement(facet) {
                        requirements.push(req);
                    } else {
                        warnings.push(format!("{name}: property facet without names is ignored"));
                    }
                }
                "attribute" => {
                    if let Some(req) = attribute_requirement(facet) {
                        requirements.push(req);
                    } else {
                        warnings.push(format!("{name}: attribute facet without a name is ignored"));
                    }
                }
                other => {
                    tracing::warn!(specification = %name, facet = other, "unsupported requirement facet");
                    warnings.push(format!("{name}: {other} requirement is not supported"));
                }
            }
        }
    }
    if requirements.is_empty() {
        warnings.push(format!("{name}: no supported requirements"));
    }

    let mut description = spec
        .attribute("description")
        .map(str::to_string)
        .unwrap_or_default();
    if let Some(version) = spec.attribute("ifcVersion") {
        if !description.is_empty() {
            description.push(' ');
        }
        description.push_str(&format!("[{version}]"));
    }

    ValidationRule {
        id,
        name,
        description,
        applicability: Applicability {
            ifc_classes: (!ifc_classes.is_empty()).then_some(ifc_classes),
            disciplines: None,
        },
        requirements,
    }
}

fn property_requirement(facet: Node) -> Option<Requirement> {
    let pset = child(facet, "propertySet").and_then(literal_of)?;
    let property = child(facet, "baseName")
        .or_else(|| child(facet, "name"))
        .and_then(literal_of)?;
    Some(build_requirement(facet, pset, property))
}

fn attribute_requirement(facet: Node) -> Option<Requirement> {
    let attribute = child(facet, "name").and_then(literal_of)?;
    Some(build_requirement(facet, ATTRIBUTES_PSET.to_string(), attribute))
}

/// Literal value ⇒ `equals`, enumeration ⇒ `inList`, pattern ⇒ `regex`,
/// nothing ⇒ `notEmpty`. `prohibited` only checks presence.
fn build_requirement(facet: Node, pset: String, property: String) -> Requirement {
    let data_type = facet.attribute("dataType");
    let mut req = Requirement::new(pset, property, CheckType::NotEmpty);

    match cardinality(facet) {
        Cardinality::Prohibited => {
            req.check_type = CheckType::Exists;
            return req;
        }
        Cardinality::Optional => req.severity = Some(Severity::Warning),
        Cardinality::Required => {}
    }

    match child(facet, "value").and_then(constraint_of) {
        Some(Constraint::Literal(value)) => {
            req.check_type = CheckType::Equals;
            req.expected = Some(ExpectedValue::Single(typed_literal(&value, data_type)));
        }
        Some(Constraint::Enumeration(values)) => {
            req.check_type = CheckType::InList;
            req.expected = Some(ExpectedValue::List(
                values.iter().map(|v| typed_literal(v, data_type)).collect(),
            ));
        }
        Some(Constraint::Pattern(pattern)) => {
            req.check_type = CheckType::Regex;
            req.pattern = Some(pattern);
        }
        None => {}
    }

    req
}

fn cardinality(facet: Node) -> Cardinality {
    let declared = facet.attribute("cardinality").or_else(|| facet.attribute("use"));
    match declared {
        Some("prohibited") => return Cardinality::Prohibited,
        Some("optional") => return Cardinality::Optional,
        Some(_) => return Cardinality::Required,
        None => {}
    }
    // IDS 0.9 occurrence attributes
    if facet.attribute("maxOccurs") == Some("0") {
        Cardinality::Prohibited
    } else if facet.attribute("minOccurs") == Some("0") {
        Cardinality::Optional
    } else {
        Cardinality::Required
    }
}

/// Reads an IDS literal using the facet's declared data type.
fn typed_literal(text: &str, data_type: Option<&str>) -> PropertyValue {
    let Some(data_type) = data_type.map(str::to_ascii_uppercase) else {
        return PropertyValue::String(text.to_string());
    };
    if data_type == "IFCBOOLEAN" {
        match text.to_ascii_lowercase().as_str() {
            "true" => return PropertyValue::Boolean(true),
            "false" => return PropertyValue::Boolean(false),
            _ => {}
        }
    }
    if NUMERIC_DATA_TYPES.contains(&data_type.as_str()) {
        if let Ok(n) = text.trim().parse::<f64>() {
            return PropertyValue::Number(n);
        }
    }
    PropertyValue::String(text.to_string())
}

fn constraint_of(node: Node) -> Option<Constraint> {
    if let Some(simple) = child(node, "simpleValue") {
        return text_of(simple).map(Constraint::Literal);
    }

    let restriction = child(node, "restriction")?;
    if let Some(pattern) = child(restriction, "pattern").and_then(|p| p.attribute("value")) {
        return Some(Constraint::Pattern(pattern.to_string()));
    }
    let values: Vec<String> = elements(restriction)
        .filter(|n| n.tag_name().name() == "enumeration")
        .filter_map(|n| n.attribute("value").map(str::to_string))
        .collect();
    match values.len() {
        0 => None,
        1 => values.into_iter().next().map(Constraint::Literal),
        _ => Some(Constraint::Enumeration(values)),
    }
}

fn literal_of(node: Node) -> Option<String> {
    match constraint_of(node)? {
        Constraint::Literal(value) => Some(value),
        _ => None,
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    elements(node).find(|n| n.tag_name().name() == name)
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

fn text_of(node: Node) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_uppercase());
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    let trimmed = slug.trim_end_matches('_');
    if trimmed.is_empty() {
        "SPEC".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn ids(requirements: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ids xmlns="http://standards.buildingsmart.org/IDS" xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <info><title>Fire Safety</title><version>0.3.0</version></info>
  <specifications>
    <specification name="Wall fire rating" ifcVersion="IFC4">
      <applicability minOccurs="1">
        <entity><name><simpleValue>IFCWALL</simpleValue></name></entity>
      </applicability>
      <requirements>{requirements}</requirements>
    </specification>
  </specifications>
</ids>"#
        )
    }

    const NAMES: &str = "<propertySet><simpleValue>Pset_WallCommon</simpleValue></propertySet>\
                         <baseName><simpleValue>FireRating</simpleValue></baseName>";

    fn single_requirement(xml: &str) -> Requirement {
        let conversion = convert_ids(xml).unwrap();
        assert_eq!(conversion.pack.rules.len(), 1);
        let rule = &conversion.pack.rules[0];
        assert_eq!(rule.requirements.len(), 1);
        rule.requirements[0].clone()
    }

    #[test]
    fn test_property_without_value_is_not_empty() {
        let xml = ids(&format!(r#"<property cardinality="required">{NAMES}</property>"#));
        let conversion = convert_ids(&xml).unwrap();
        assert_eq!(conversion.pack.name, "Fire Safety");
        assert_eq!(conversion.pack.version, "0.3.0");

        let rule = &conversion.pack.rules[0];
        assert_eq!(rule.id, "IDS-WALL_FIRE_RATING-1");
        assert_eq!(rule.applicability.ifc_classes, Some(vec!["IFCWALL".to_string()]));
        assert!(rule.description.contains("IFC4"));

        let req = &rule.requirements[0];
        assert_eq!(req.pset_name, "Pset_WallCommon");
        assert_eq!(req.property_name, "FireRating");
        assert_eq!(req.check_type, CheckType::NotEmpty);
    }

    #[test]
    fn test_property_with_value_is_equals() {
        let xml = ids(&format!(
            r#"<property cardinality="required">{NAMES}<value><simpleValue>2HR</simpleValue></value></property>"#
        ));
        let req = single_requirement(&xml);
        assert_eq!(req.check_type, CheckType::Equals);
        assert_eq!(req.expected, Some(ExpectedValue::Single("2HR".into())));
    }

    #[test]
    fn test_property_with_pattern_is_regex() {
        let xml = ids(&format!(
            r#"<property cardinality="required">{NAMES}<value><xs:restriction base="xs:string"><xs:pattern value="[0-9]HR"/></xs:restriction></value></property>"#
        ));
        let req = single_requirement(&xml);
        assert_eq!(req.check_type, CheckType::Regex);
        assert_eq!(req.pattern.as_deref(), Some("[0-9]HR"));
    }

    #[test]
    fn test_enumeration_is_in_list() {
        let xml = ids(&format!(
            r#"<property>{NAMES}<value><xs:restriction base="xs:string"><xs:enumeration value="1HR"/><xs:enumeration value="2HR"/></xs:restriction></value></property>"#
        ));
        let req = single_requirement(&xml);
        assert_eq!(req.check_type, CheckType::InList);
        assert_eq!(
            req.expected,
            Some(ExpectedValue::List(vec!["1HR".into(), "2HR".into()]))
        );
    }

    #[test]
    fn test_typed_value_uses_data_type() {
        let xml = ids(
            r#"<property dataType="IFCBOOLEAN"><propertySet><simpleValue>Pset_WallCommon</simpleValue></propertySet><baseName><simpleValue>IsExternal</simpleValue></baseName><value><simpleValue>true</simpleValue></value></property>"#,
        );
        let req = single_requirement(&xml);
        assert_eq!(req.expected, Some(ExpectedValue::Single(true.into())));
    }

    #[test]
    fn test_prohibited_degrades_to_exists() {
        let xml = ids(&format!(
            r#"<property cardinality="prohibited">{NAMES}<value><simpleValue>2HR</simpleValue></value></property>"#
        ));
        let req = single_requirement(&xml);
        assert_eq!(req.check_type, CheckType::Exists);
        assert_eq!(req.expected, None);
    }

    #[test]
    fn test_optional_is_warning() {
        let xml = ids(&format!(r#"<property cardinality="optional">{NAMES}</property>"#));
        assert_eq!(single_requirement(&xml).severity, Some(Severity::Warning));
    }

    #[test]
    fn test_attribute_uses_pseudo_pset() {
        let xml = ids(
            r#"<attribute cardinality="required"><name><simpleValue>Name</simpleValue></name><value><xs:restriction base="xs:string"><xs:pattern value="^WL-[0-9]+$"/></xs:restriction></value></attribute>"#,
        );
        let req = single_requirement(&xml);
        assert_eq!(req.pset_name, ATTRIBUTES_PSET);
        assert_eq!(req.property_name, "Name");
        assert_eq!(req.check_type, CheckType::Regex);
    }

    #[test]
    fn test_unsupported_facets_warn() {
        let xml = r#"<ids><specifications>
            <specification name="Concrete">
              <applicability>
                <entity><name><simpleValue>IFCSLAB</simpleValue></name></entity>
                <material><value><simpleValue>Concrete</simpleValue></value></material>
              </applicability>
              <requirements>
                <classification><system><simpleValue>Uniclass</simpleValue></system></classification>
              </requirements>
            </specification></specifications></ids>"#;
        let conversion = convert_ids(xml).unwrap();
        let rule = &conversion.pack.rules[0];
        assert_eq!(rule.applicability.ifc_classes, Some(vec!["IFCSLAB".to_string()]));
        assert!(rule.requirements.is_empty());
        assert_eq!(conversion.warnings.len(), 3);
        assert!(conversion.warnings[0].contains("material"));
    }

    #[test]
    fn test_rule_ids_unique_across_specifications() {
        let spec = r#"<specification name="Same name"><requirements/></specification>"#;
        let xml = format!("<ids><specifications>{spec}{spec}{spec}</specifications></ids>");
        let conversion = convert_ids(&xml).unwrap();
        let ids: HashSet<&str> = conversion.pack.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_malformed_xml_fails() {
        let err = convert_ids("<ids><specification name='x'>").unwrap_err();
        assert!(matches!(err, IdsError::InvalidXml { .. }));
        assert!(err.to_string().starts_with("invalid IDS XML"));
    }

    #[test]
    fn test_no_specifications() {
        assert!(matches!(
            convert_ids("<ids><info/></ids>"),
            Err(IdsError::NoSpecifications)
        ));
        assert!(matches!(
            convert_ids("<root/>"),
            Err(IdsError::InvalidXml { .. })
        ));
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Wall fire rating"), "WALL_FIRE_RATING");
        assert_eq!(slug("  --"), "SPEC");
    }
}
