pub mod builtin;
pub mod engine;
pub mod issue;
pub mod rules;
pub mod snapshot;
pub mod worker;

pub use engine::{check_element, validate, DEFAULT_PROGRESS_INTERVAL};
pub use issue::{IssueType, ValidationIssue, ValidationResult};
pub use rules::{
    Applicability, CheckType, ExpectedValue, Requirement, RulePack, Severity, ValidationRule,
};
pub use snapshot::{ElementSnapshot, Lookup, PsetSnapshot, ATTRIBUTES_PSET};
pub use worker::{spawn_validation, TaskEvent, ValidationTask};
