//! Rule packs shipped with the checker.

use super::{
    Applicability, CheckType, ExpectedValue, Requirement, RulePack, Severity, ValidationRule,
};
use crate::model::{Discipline, PropertyValue};

fn rule(
    id: &str,
    name: &str,
    description: &str,
    applicability: Applicability,
    requirements: Vec<Requirement>,
) -> ValidationRule {
    ValidationRule {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        applicability,
        requirements,
    }
}

fn classes(names: &[&str]) -> Applicability {
    Applicability {
        ifc_classes: Some(names.iter().map(|n| (*n).to_string()).collect()),
        disciplines: None,
    }
}

/// Basic data-quality checks for architectural and structural models.
#[must_use]
pub fn basic_pack() -> RulePack {
    RulePack {
        name: "Basic IFC Data Quality".to_string(),
        version: "1.0.0".to_string(),
        description: "Common property completeness checks for walls, doors, windows and structure"
            .to_string(),
        rules: vec![
            rule(
                "BASIC-001",
                "Wall fire rating",
                "Walls must state a fire rating",
                classes(&["IfcWall", "IfcWallStandardCase"]),
                vec![Requirement::new("Pset_WallCommon", "FireRating", CheckType::NotEmpty)],
            ),
            rule(
                "BASIC-002",
                "Wall external flag",
                "Walls must declare whether they are external",
                classes(&["IfcWall", "IfcWallStandardCase"]),
                vec![Requirement::new("Pset_WallCommon", "IsExternal", CheckType::Boolean)],
            ),
            rule(
                "BASIC-003",
                "Door fire rating",
                "Doors must state a fire rating",
                classes(&["IfcDoor"]),
                vec![Requirement::new("Pset_DoorCommon", "FireRating", CheckType::NotEmpty)],
            ),
            rule(
                "BASIC-004",
                "Window thermal transmittance",
                "Window U-values must be plausible",
                classes(&["IfcWindow"]),
                vec![Requirement::new(
                    "Pset_WindowCommon",
                    "ThermalTransmittance",
                    CheckType::Range,
                )
                .with_range(Some(0.0), Some(6.0))
                .with_severity(Severity::Warning)],
            ),
            rule(
                "BASIC-005",
                "Structural load bearing",
                "Structural members must declare load bearing",
                Applicability {
                    ifc_classes: None,
                    disciplines: Some(vec![Discipline::Structure]),
                },
                vec![Requirement::new("Pset_BeamCommon", "LoadBearing", CheckType::Boolean)],
            ),
            rule(
                "BASIC-006",
                "Slab type",
                "Slabs must be classified as floor, roof or landing",
                classes(&["IfcSlab"]),
                vec![Requirement::new("Pset_SlabCommon", "Reference", CheckType::InList)
                    .with_expected(ExpectedValue::List(vec![
                        PropertyValue::from("FLOOR"),
                        PropertyValue::from("ROOF"),
                        PropertyValue::from("LANDING"),
                    ]))
                    .with_severity(Severity::Warning)],
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{check_element, ElementSnapshot, IssueType};
    use std::collections::HashSet;

    #[test]
    fn test_rule_ids_unique() {
        let pack = basic_pack();
        let ids: HashSet<&str> = pack.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), pack.rules.len());
    }

    #[test]
    fn test_wall_without_pset_fails_fire_rating() {
        let pack = basic_pack();
        let wall = ElementSnapshot::new(1, "IFCWALL");
        let issues = check_element(&wall, &pack.rules[0]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::MissingParam);
        // a door is not a wall
        assert!(check_element(&ElementSnapshot::new(2, "IFCDOOR"), &pack.rules[0]).is_empty());
    }
}
