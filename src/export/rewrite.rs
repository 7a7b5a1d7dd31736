use super::patch::{find_record, nominal_value_span, PropertyPatch};
use crate::format::is_numeric_literal;
use std::ops::Range;

/// The `HEADER;` ... `ENDSEC;` section, both markers included.
#[must_use]
pub fn extract_header(text: &str) -> Option<&str> {
    header_span(text).map(|span| &text[span])
}

fn header_span(text: &str) -> Option<Range<usize>> {
    let start = text.find("HEADER;")?;
    let end = start + text[start..].find("ENDSEC;")? + "ENDSEC;".len();
    Some(start..end)
}

/// Wraps a formatted STEP literal in the IFC type constructor its shape implies.
#[must_use]
pub fn wrap_typed(literal: &str) -> String {
    match literal {
        "$" => literal.to_string(),
        ".T." | ".F." => format!("IFCBOOLEAN({literal})"),
        _ if is_numeric_literal(literal) => format!("IFCREAL({literal})"),
        _ if literal.starts_with('\'') => format!("IFCLABEL({literal})"),
        _ => literal.to_string(),
    }
}

/// Rebuilds `#id=IFCPROPERTYSINGLEVALUE(name, description, VALUE, unit);`
/// with a new nominal value. `None` if the record has another shape.
fn rebuild_record(record: &str, new_value: &str) -> Option<String> {
    let eq = record.find('=')?;
    let open = record.find('(')?;
    if !record[eq + 1..open]
        .trim()
        .eq_ignore_ascii_case("IFCPROPERTYSINGLEVALUE")
    {
        return None;
    }
    let value = nominal_value_span(record)?;
    Some(format!(
        "{}{}{}",
        &record[..value.start],
        wrap_typed(new_value),
        &record[value.end..]
    ))
}

/// Regenerates the value of each patched property record.
///
/// Best effort: a record that cannot be found or is not a single-value
/// property is left as is and logged. The HEADER section of the result is
/// always the original one, byte for byte.
#[must_use]
pub fn rewrite(text: &str, patches: &[PropertyPatch]) -> String {
    let original_header = extract_header(text).map(str::to_string);
    let mut output = text.to_string();

    for patch in patches {
        let Some(range) = find_record(&output, patch.express_id) else {
            tracing::warn!(
                id = patch.express_id,
                property = %format!("{}.{}", patch.pset_name, patch.property_name),
                "rewrite: record not found, edit dropped"
            );
            continue;
        };

        match rebuild_record(&output[range.clone()], &patch.new_value) {
            Some(record) => output.replace_range(range, &record),
            None => tracing::warn!(
                id = patch.express_id,
                property = %format!("{}.{}", patch.pset_name, patch.property_name),
                "rewrite: unexpected record shape, edit dropped"
            ),
        }
    }

    if let (Some(original), Some(span)) = (original_header, header_span(&output)) {
        if output[span.clone()] != original {
            tracing::debug!("rewrite: restoring original header");
            output.replace_range(span, &original);
        }
    }

    output
}
