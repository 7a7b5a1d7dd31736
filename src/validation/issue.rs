use super::Severity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueType {
    MissingParam,
    MissingValue,
    WrongValue,
    Naming,
}

/// One failed requirement on one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// `<expressID>-<ruleId>-<propertyName>`
    pub id: String,
    pub express_id: u64,
    pub global_id: String,
    pub element_name: String,
    pub ifc_class: String,
    pub rule_id: String,
    pub rule_name: String,
    pub issue_type: IssueType,
    /// `<psetName>.<propertyName>`
    pub property_path: String,
    pub expected: String,
    pub actual: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

#[must_use]
pub fn issue_id(express_id: u64, rule_id: &str, property_name: &str) -> String {
    format!("{express_id}-{rule_id}-{property_name}")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub rule_pack_name: String,
    pub total_elements: usize,
    /// Elements without any issue, whatever the severity.
    pub passed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    #[must_use]
    pub fn failed(&self) -> usize {
        self.total_elements - self.passed
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}
