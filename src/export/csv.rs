use crate::error::ExportError;
use crate::validation::{IssueType, Severity, ValidationResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the issues of a validation run as a flat CSV table.
pub fn export_result_csv<P: AsRef<Path>>(
    result: &ValidationResult,
    path: P,
) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;
    write_result_csv(result, file)
}

pub fn write_result_csv<W: Write>(result: &ValidationResult, out: W) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);

    writer.write_record([
        "Express ID",
        "Global ID",
        "Element",
        "IFC Class",
        "Rule",
        "Issue",
        "Property",
        "Expected",
        "Actual",
        "Severity",
    ])?;

    for issue in &result.issues {
        writer.write_record([
            &issue.express_id.to_string(),
            &issue.global_id,
            &issue.element_name,
            &issue.ifc_class,
            &issue.rule_id,
            issue_label(issue.issue_type),
            &issue.property_path,
            &issue.expected,
            &issue.actual,
            severity_label(issue.severity),
        ])?;
    }

    writer.flush().map_err(|e| ExportError::WriteError {
        message: e.to_string(),
    })?;

    Ok(())
}

fn issue_label(issue_type: IssueType) -> &'static str {
    match issue_type {
        IssueType::MissingParam => "Missing parameter",
        IssueType::MissingValue => "Missing value",
        IssueType::WrongValue => "Wrong value",
        IssueType::Naming => "Naming",
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    }
}
