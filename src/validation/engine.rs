//! Rule evaluation.
//!
//! [`check_element`] evaluates one rule against one element; [`validate`] runs
//! a whole rule pack over a model snapshot in a single sequential pass.

use super::issue::issue_id;
use super::{
    CheckType, ElementSnapshot, ExpectedValue, IssueType, Lookup, Requirement, RulePack, Severity,
    ValidationIssue, ValidationResult, ValidationRule,
};
use crate::model::PropertyValue;
use regex::Regex;
use std::collections::HashSet;

/// Progress is reported every this many elements unless configured otherwise.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

struct Failure {
    issue_type: IssueType,
    default_severity: Severity,
    expected: String,
    actual: String,
    suggested_fix: Option<String>,
}

/// Evaluates `rule` against one element.
///
/// Returns no issues when the rule's applicability excludes the element.
#[must_use]
pub fn check_element(element: &ElementSnapshot, rule: &ValidationRule) -> Vec<ValidationIssue> {
    if !rule
        .applicability
        .applies_to(&element.ifc_class, element.discipline)
    {
        return Vec::new();
    }

    rule.requirements
        .iter()
        .filter_map(|req| {
            check_requirement(element, req).map(|failure| ValidationIssue {
                id: issue_id(element.express_id, &rule.id, &req.property_name),
                express_id: element.express_id,
                global_id: element.global_id.clone(),
                element_name: element.name.clone(),
                ifc_class: element.ifc_class.clone(),
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                issue_type: failure.issue_type,
                property_path: format!("{}.{}", req.pset_name, req.property_name),
                expected: failure.expected,
                actual: failure.actual,
                severity: req.severity.unwrap_or(failure.default_severity),
                suggested_fix: failure.suggested_fix,
            })
        })
        .collect()
}

fn check_requirement(element: &ElementSnapshot, req: &Requirement) -> Option<Failure> {
    let value = match element.lookup(&req.pset_name, &req.property_name) {
        // Only presence checks care about a missing property set; value
        // checks have nothing to compare and pass.
        Lookup::MissingPropertySet if req.check_type.is_presence_check() => {
            return Some(missing_param(req, "Property set missing"));
        }
        Lookup::MissingPropertySet => return None,
        Lookup::MissingProperty => return Some(missing_param(req, "Property missing")),
        Lookup::Found(value) => value,
    };

    match req.check_type {
        CheckType::Exists => None,
        CheckType::NotEmpty => value.is_empty().then(|| Failure {
            issue_type: IssueType::MissingValue,
            default_severity: Severity::Warning,
            expected: "Non-empty value".to_string(),
            actual: "(empty)".to_string(),
            suggested_fix: Some(format!("Fill in a value for '{}'", req.property_name)),
        }),
        CheckType::Equals => {
            let expected = req
                .expected
                .as_ref()
                .map(ExpectedValue::as_single)
                .unwrap_or_default();
            (*value != expected).then(|| Failure {
                issue_type: IssueType::WrongValue,
                default_severity: Severity::Error,
                suggested_fix: Some(format!("Set '{}' to '{expected}'", req.property_name)),
                expected: expected.to_string(),
                actual: value.to_string(),
            })
        }
        CheckType::InList => {
            let allowed = req
                .expected
                .as_ref()
                .map(ExpectedValue::as_list)
                .unwrap_or_default();
            (!allowed.contains(value)).then(|| Failure {
                issue_type: IssueType::WrongValue,
                default_severity: Severity::Error,
                expected: format!("One of: {}", join_values(&allowed)),
                actual: value.to_string(),
                suggested_fix: None,
            })
        }
        CheckType::Range => check_range(value, req.min, req.max),
        CheckType::Regex => check_pattern(value, req.pattern.as_deref()),
        CheckType::Boolean => (!value.is_boolean_like()).then(|| Failure {
            issue_type: IssueType::WrongValue,
            default_severity: Severity::Error,
            expected: "true or false".to_string(),
            actual: value.to_string(),
            suggested_fix: None,
        }),
    }
}

fn missing_param(req: &Requirement, actual: &str) -> Failure {
    Failure {
        issue_type: IssueType::MissingParam,
        default_severity: Severity::Error,
        expected: format!("{}.{} present", req.pset_name, req.property_name),
        actual: actual.to_string(),
        suggested_fix: Some(format!(
            "Add property '{}' to '{}'",
            req.property_name, req.pset_name
        )),
    }
}

/// Inclusive bounds; a value that does not coerce to a number always fails.
fn check_range(value: &PropertyValue, min: Option<f64>, max: Option<f64>) -> Option<Failure> {
    let in_range = value.as_number().is_some_and(|n| {
        min.is_none_or(|lo| n >= lo) && max.is_none_or(|hi| n <= hi)
    });
    if in_range {
        return None;
    }

    let expected = match (min, max) {
        (Some(lo), Some(hi)) => format!("Between {lo} and {hi}"),
        (Some(lo), None) => format!(">= {lo}"),
        (None, Some(hi)) => format!("<= {hi}"),
        (None, None) => "A numeric value".to_string(),
    };
    Some(Failure {
        issue_type: IssueType::WrongValue,
        default_severity: Severity::Error,
        expected,
        actual: value.to_string(),
        suggested_fix: None,
    })
}

/// Unanchored search against the value's string form.
///
/// An invalid pattern makes the requirement pass. The compile error is only
/// logged, never reported as an issue.
fn check_pattern(value: &PropertyValue, pattern: Option<&str>) -> Option<Failure> {
    let pattern = pattern?;
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(err) => {
            tracing::debug!(%pattern, %err, "invalid validation pattern, requirement skipped");
            return None;
        }
    };

    let text = value.to_string();
    if regex.is_match(&text) {
        return None;
    }
    Some(Failure {
        issue_type: IssueType::Naming,
        default_severity: Severity::Error,
        expected: format!("Matches pattern {pattern}"),
        actual: text,
        suggested_fix: Some("Rename to follow the naming convention".to_string()),
    })
}

fn join_values(values: &[PropertyValue]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Runs every rule of `pack` against every element.
///
/// `on_progress` receives a percentage after every `progress_interval`
/// elements and a final 100.
pub fn validate(
    elements: &[ElementSnapshot],
    pack: &RulePack,
    progress_interval: usize,
    on_progress: impl FnMut(u8),
) -> ValidationResult {
    run(elements, pack, progress_interval, on_progress, || true).unwrap_or_default()
}

/// Like [`validate`] but stops, returning `None`, as soon as `keep_going`
/// returns false between elements.
pub(crate) fn run(
    elements: &[ElementSnapshot],
    pack: &RulePack,
    progress_interval: usize,
    mut on_progress: impl FnMut(u8),
    keep_going: impl Fn() -> bool,
) -> Option<ValidationResult> {
    let interval = progress_interval.max(1);
    let total = elements.len();
    let mut issues = Vec::new();
    let mut failed_elements = HashSet::new();

    for (index, element) in elements.iter().enumerate() {
        if !keep_going() {
            return None;
        }

        for rule in &pack.rules {
            let found = check_element(element, rule);
            if !found.is_empty() {
                failed_elements.insert(element.express_id);
            }
            issues.extend(found);
        }

        let done = index + 1;
        if done % interval == 0 && done < total {
            on_progress((done * 100 / total) as u8);
        }
    }
    on_progress(100);

    let errors = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    let warnings = issues.len() - errors;

    tracing::info!(
        rule_pack = %pack.name,
        elements = total,
        issues = issues.len(),
        errors,
        warnings,
        "validation finished"
    );

    Some(ValidationResult {
        rule_pack_name: pack.name.clone(),
        total_elements: total,
        passed: total - failed_elements.len(),
        errors,
        warnings,
        issues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Discipline;
    use crate::validation::{Applicability, ATTRIBUTES_PSET};
    use pretty_assertions::assert_eq;

    fn wall(fire_rating: PropertyValue) -> ElementSnapshot {
        ElementSnapshot::new(101, "IFCWALL")
            .with_pset("Pset_WallCommon", vec![("FireRating", fire_rating)])
    }

    fn rule(requirements: Vec<Requirement>) -> ValidationRule {
        ValidationRule {
            id: "R1".into(),
            name: "Test rule".into(),
            description: String::new(),
            applicability: Applicability::default(),
            requirements,
        }
    }

    fn fire_req(check_type: CheckType) -> Requirement {
        Requirement::new("Pset_WallCommon", "FireRating", check_type)
    }

    #[test]
    fn test_equals_wrong_value() {
        let issues = check_element(
            &wall("2HR".into()),
            &rule(vec![fire_req(CheckType::Equals).with_expected(PropertyValue::from("1HR"))]),
        );
        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.issue_type, IssueType::WrongValue);
        assert_eq!(issue.expected, "1HR");
        assert_eq!(issue.actual, "2HR");
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.property_path, "Pset_WallCommon.FireRating");
        assert_eq!(issue.id, "101-R1-FireRating");
    }

    #[test]
    fn test_equals_is_strict() {
        let element = ElementSnapshot::new(1, "IFCWALL")
            .with_pset("Pset_WallCommon", vec![("Count", PropertyValue::from("2"))]);
        let req = Requirement::new("Pset_WallCommon", "Count", CheckType::Equals)
            .with_expected(PropertyValue::from(2.0));
        assert_eq!(check_element(&element, &rule(vec![req])).len(), 1);
    }

    #[test]
    fn test_not_empty() {
        let r = rule(vec![fire_req(CheckType::NotEmpty)]);
        assert!(check_element(&wall("2HR".into()), &r).is_empty());

        for empty in [PropertyValue::from(""), PropertyValue::Absent] {
            let issues = check_element(&wall(empty), &r);
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].issue_type, IssueType::MissingValue);
            assert_eq!(issues[0].severity, Severity::Warning);
        }
    }

    #[test]
    fn test_exists_without_psets() {
        let element = ElementSnapshot::new(7, "IFCWALL");
        let issues = check_element(
            &element,
            &rule(vec![Requirement::new("Pset_Any", "Anything", CheckType::Exists)]),
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::MissingParam);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_missing_pset_passes_value_checks() {
        let element = ElementSnapshot::new(7, "IFCWALL");
        let r = rule(vec![
            fire_req(CheckType::Equals).with_expected(PropertyValue::from("1HR")),
            fire_req(CheckType::InList),
            fire_req(CheckType::Range).with_range(Some(0.0), None),
            fire_req(CheckType::Regex).with_pattern("^x$"),
            fire_req(CheckType::Boolean),
        ]);
        assert!(check_element(&element, &r).is_empty());
    }

    #[test]
    fn test_missing_property_always_reported() {
        let element = ElementSnapshot::new(7, "IFCWALL").with_pset("Pset_WallCommon", vec![]);
        for check_type in [CheckType::Equals, CheckType::Regex, CheckType::Exists] {
            let issues = check_element(&element, &rule(vec![fire_req(check_type)]));
            assert_eq!(issues.len(), 1, "{check_type:?}");
            assert_eq!(issues[0].issue_type, IssueType::MissingParam);
        }
    }

    #[test]
    fn test_severity_override() {
        let element = ElementSnapshot::new(7, "IFCWALL");
        let issues = check_element(
            &element,
            &rule(vec![fire_req(CheckType::Exists).with_severity(Severity::Warning)]),
        );
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_in_list_accepts_scalar_expected() {
        let r = rule(vec![fire_req(CheckType::InList)
            .with_expected(ExpectedValue::List(vec!["1HR".into(), "2HR".into()]))]);
        assert!(check_element(&wall("2HR".into()), &r).is_empty());
        assert_eq!(check_element(&wall("3HR".into()), &r).len(), 1);

        let scalar = rule(vec![fire_req(CheckType::InList).with_expected(PropertyValue::from("2HR"))]);
        assert!(check_element(&wall("2HR".into()), &scalar).is_empty());
    }

    #[test]
    fn test_range_bounds() {
        let r = rule(vec![fire_req(CheckType::Range).with_range(Some(0.0), Some(1.0))]);
        assert_eq!(check_element(&wall((-1.0).into()), &r).len(), 1);
        assert!(check_element(&wall(0.5.into()), &r).is_empty());
        assert!(check_element(&wall(0.0.into()), &r).is_empty());
        assert!(check_element(&wall(1.0.into()), &r).is_empty());
        assert!(check_element(&wall("0.75".into()), &r).is_empty());
        assert_eq!(check_element(&wall("abc".into()), &r).len(), 1);

        let open = rule(vec![fire_req(CheckType::Range)]);
        assert!(check_element(&wall(1e9.into()), &open).is_empty());
        assert_eq!(check_element(&wall("n/a".into()), &open).len(), 1);
    }

    #[test]
    fn test_regex_naming() {
        let r = rule(vec![fire_req(CheckType::Regex).with_pattern("^[0-9]HR$")]);
        assert!(check_element(&wall("2HR".into()), &r).is_empty());
        let issues = check_element(&wall("two hours".into()), &r);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::Naming);
        assert!(issues[0].suggested_fix.is_some());

        // unanchored patterns search anywhere in the value
        let unanchored = rule(vec![fire_req(CheckType::Regex).with_pattern("HR")]);
        assert!(check_element(&wall("2HR".into()), &unanchored).is_empty());
    }

    #[test]
    fn test_invalid_regex_passes() {
        let r = rule(vec![fire_req(CheckType::Regex).with_pattern("([unclosed")]);
        assert!(check_element(&wall("anything".into()), &r).is_empty());
    }

    #[test]
    fn test_boolean_check() {
        let r = rule(vec![fire_req(CheckType::Boolean)]);
        for ok in [
            PropertyValue::from(true),
            "true".into(),
            "false".into(),
            ".T.".into(),
            ".F.".into(),
        ] {
            assert!(check_element(&wall(ok), &r).is_empty());
        }
        let issues = check_element(&wall("yes".into()), &r);
        assert_eq!(issues[0].issue_type, IssueType::WrongValue);
    }

    #[test]
    fn test_class_allow_list_excludes() {
        let mut r = rule(vec![
            fire_req(CheckType::Exists),
            Requirement::new("Pset_Missing", "X", CheckType::NotEmpty),
        ]);
        r.applicability.ifc_classes = Some(vec!["IfcDoor".into()]);
        assert!(check_element(&wall(PropertyValue::Absent), &r).is_empty());
        assert!(check_element(&ElementSnapshot::new(1, "IFCBEAM"), &r).is_empty());
    }

    #[test]
    fn test_discipline_allow_list() {
        let mut r = rule(vec![Requirement::new("Pset_Missing", "X", CheckType::Exists)]);
        r.applicability.disciplines = Some(vec![Discipline::Structure]);
        assert!(check_element(&ElementSnapshot::new(1, "IFCWALL"), &r).is_empty());
        assert_eq!(check_element(&ElementSnapshot::new(1, "IFCBEAM"), &r).len(), 1);
    }

    #[test]
    fn test_attribute_requirements() {
        let mut element = ElementSnapshot::new(3, "IFCWALL");
        element
            .attributes
            .push(("Name".into(), PropertyValue::from("Wall 01")));
        let r = rule(vec![
            Requirement::new(ATTRIBUTES_PSET, "Name", CheckType::Regex).with_pattern("^WL-"),
            Requirement::new(ATTRIBUTES_PSET, "Description", CheckType::NotEmpty),
        ]);
        let issues = check_element(&element, &r);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].issue_type, IssueType::Naming);
        assert_eq!(issues[1].issue_type, IssueType::MissingParam);
    }

    #[test]
    fn test_validate_counts_and_progress() {
        let elements: Vec<ElementSnapshot> = (0..250)
            .map(|i| {
                let rating = if i % 2 == 0 { "1HR" } else { "" };
                ElementSnapshot::new(i, "IFCWALL")
                    .with_pset("Pset_WallCommon", vec![("FireRating", rating.into())])
            })
            .collect();
        let pack = RulePack {
            name: "Fire".into(),
            version: "1.0.0".into(),
            description: String::new(),
            rules: vec![
                rule(vec![fire_req(CheckType::NotEmpty)]),
                ValidationRule {
                    id: "R2".into(),
                    ..rule(vec![Requirement::new("Pset_WallCommon", "IsExternal", CheckType::Exists)
                        .with_severity(Severity::Warning)])
                },
            ],
        };

        let mut progress = Vec::new();
        let result = validate(&elements, &pack, 100, |p| progress.push(p));

        assert_eq!(progress, vec![40, 80, 100]);
        assert_eq!(result.total_elements, 250);
        assert_eq!(result.passed, 0);
        assert_eq!(result.issues.len(), 250 + 125);
        assert_eq!(result.errors, 0);
        assert_eq!(result.warnings, 375);

        let ids: HashSet<&str> = result.issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), result.issues.len());
    }

    #[test]
    fn test_validate_passed_count() {
        let elements = vec![wall("1HR".into()), ElementSnapshot::new(5, "IFCBEAM")];
        let pack = RulePack {
            name: "Fire".into(),
            version: "1.0.0".into(),
            description: String::new(),
            rules: vec![rule(vec![fire_req(CheckType::Exists)])],
        };
        let result = validate(&elements, &pack, 100, |_| {});
        assert_eq!(result.passed, 1);
        assert_eq!(result.errors, 1);
        assert_eq!(result.failed(), 1);
    }
}
