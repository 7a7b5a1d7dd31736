use crate::error::RulePackError;
use crate::model::{Discipline, PropertyValue};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckType {
    Exists,
    NotEmpty,
    Equals,
    InList,
    Range,
    Regex,
    Boolean,
}

impl CheckType {
    /// Checks that only ask whether the property is there.
    #[must_use]
    pub fn is_presence_check(self) -> bool {
        matches!(self, CheckType::Exists | CheckType::NotEmpty)
    }
}

/// Expected value of an `equals` or `inList` requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpectedValue {
    List(Vec<PropertyValue>),
    Single(PropertyValue),
}

impl ExpectedValue {
    /// The value to compare against for `equals`.
    #[must_use]
    pub fn as_single(&self) -> PropertyValue {
        match self {
            ExpectedValue::Single(v) => v.clone(),
            ExpectedValue::List(list) => list.first().cloned().unwrap_or_default(),
        }
    }

    /// A scalar is treated as a one-element list.
    #[must_use]
    pub fn as_list(&self) -> Vec<PropertyValue> {
        match self {
            ExpectedValue::Single(v) => vec![v.clone()],
            ExpectedValue::List(list) => list.clone(),
        }
    }
}

impl From<PropertyValue> for ExpectedValue {
    fn from(value: PropertyValue) -> Self {
        ExpectedValue::Single(value)
    }
}

/// Which elements a rule applies to. Both filters must pass; each list matches
/// if any entry matches. A missing or empty list applies to everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ifc_classes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disciplines: Option<Vec<Discipline>>,
}

impl Applicability {
    #[must_use]
    pub fn applies_to(&self, ifc_class: &str, discipline: Discipline) -> bool {
        let class_ok = match &self.ifc_classes {
            Some(classes) if !classes.is_empty() => {
                classes.iter().any(|c| c.eq_ignore_ascii_case(ifc_class))
            }
            _ => true,
        };
        let discipline_ok = match &self.disciplines {
            Some(disciplines) if !disciplines.is_empty() => disciplines.contains(&discipline),
            _ => true,
        };
        class_ok && discipline_ok
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub pset_name: String,
    pub property_name: String,
    pub check_type: CheckType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<ExpectedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Overrides the check type's default severity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl Requirement {
    #[must_use]
    pub fn new(
        pset_name: impl Into<String>,
        property_name: impl Into<String>,
        check_type: CheckType,
    ) -> Self {
        Self {
            pset_name: pset_name.into(),
            property_name: property_name.into(),
            check_type,
            expected: None,
            min: None,
            max: None,
            pattern: None,
            severity: None,
        }
    }

    #[must_use]
    pub fn with_expected(mut self, expected: impl Into<ExpectedValue>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    #[must_use]
    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub applicability: Applicability,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePack {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub rules: Vec<ValidationRule>,
}

impl RulePack {
    pub fn from_json_str(json: &str) -> Result<Self, RulePackError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RulePackError> {
        let content =
            std::fs::read_to_string(&path).map_err(|source| RulePackError::FileRead {
                path: path.as_ref().to_path_buf(),
                source,
            })?;
        Self::from_json_str(&content)
    }

    #[must_use]
    pub fn total_requirements(&self) -> usize {
        self.rules.iter().map(|r| r.requirements.len()).sum()
    }
}
