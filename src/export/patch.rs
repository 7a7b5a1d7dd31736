use crate::format::format_value;
use crate::model::IfcModel;
use crate::parser::split_top_level_spans;
use std::collections::HashMap;
use std::ops::Range;

/// One edited property, with old and new values already in STEP syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyPatch {
    /// Id of the `IFCPROPERTYSINGLEVALUE` record.
    pub express_id: u64,
    pub pset_name: String,
    pub property_name: String,
    pub old_value: String,
    pub new_value: String,
}

/// Gathers every edited property of every editable property set.
///
/// A property record shared by several elements yields one patch; when the
/// copies disagree the last element's value wins.
#[must_use]
pub fn collect_patches(model: &IfcModel) -> Vec<PropertyPatch> {
    let mut patches: Vec<PropertyPatch> = Vec::new();
    let mut by_record: HashMap<u64, usize> = HashMap::new();

    for patch in edited_properties(model) {
        match by_record.get(&patch.express_id) {
            Some(&index) => patches[index] = patch,
            None => {
                by_record.insert(patch.express_id, patches.len());
                patches.push(patch);
            }
        }
    }
    patches
}

fn edited_properties(model: &IfcModel) -> impl Iterator<Item = PropertyPatch> + '_ {
    model
        .elements
        .iter()
        .flat_map(|element| &element.property_sets)
        .filter(|pset| pset.is_editable)
        .flat_map(|pset| {
            pset.properties
                .iter()
                .filter(|p| p.modified && p.value != p.original_value)
                .map(move |p| PropertyPatch {
                    express_id: p.express_id,
                    pset_name: pset.name.clone(),
                    property_name: p.name.clone(),
                    old_value: format_value(&p.original_value),
                    new_value: format_value(&p.value),
                })
        })
}

/// Byte range of the record `#<id>=...;`, including the terminating `;`.
///
/// The id must start a line so `#12=` never matches inside `#112=`.
#[must_use]
pub fn find_record(text: &str, express_id: u64) -> Option<Range<usize>> {
    let needle = format!("#{express_id}=");
    let mut from = 0;
    let start = loop {
        let pos = from + text[from..].find(&needle)?;
        if pos == 0 || text[..pos].ends_with(['\n', '\r']) {
            break pos;
        }
        from = pos + needle.len();
    };

    let mut in_string = false;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '\'' => in_string = !in_string,
            ';' if !in_string => return Some(start..start + offset + 1),
            _ => {}
        }
    }
    None
}

/// Byte range of the nominal value argument (third argument) of a record,
/// relative to the record start.
pub(crate) fn nominal_value_span(record: &str) -> Option<Range<usize>> {
    let open = record.find('(')?;
    let close = record.rfind(')')?;
    if close <= open {
        return None;
    }
    let args = &record[open + 1..close];
    let span = split_top_level_spans(args).into_iter().nth(2)?;
    Some(open + 1 + span.start..open + 1 + span.end)
}

/// Minimal in-place substitution of old value tokens.
///
/// Returns `None` if any patch cannot be applied as a plain token swap: the
/// record is missing or unterminated, the old value is `$`, or the old value
/// text does not appear in the record's value position. Patches apply in
/// order to the progressively patched text.
#[must_use]
pub fn try_patch(text: &str, patches: &[PropertyPatch]) -> Option<String> {
    let mut output = text.to_string();

    for patch in patches {
        let Some(record) = find_record(&output, patch.express_id) else {
            tracing::debug!(id = patch.express_id, "patch: record not found");
            return None;
        };
        if patch.old_value == "$" {
            tracing::debug!(id = patch.express_id, "patch: cannot replace a null value");
            return None;
        }

        let line = &output[record.clone()];
        let search = nominal_value_span(line).unwrap_or(0..line.len());
        let Some(found) = find_token(&line[search.clone()], &patch.old_value) else {
            tracing::debug!(
                id = patch.express_id,
                old = %patch.old_value,
                "patch: old value not found in record"
            );
            return None;
        };

        let at = record.start + search.start + found;
        output.replace_range(at..at + patch.old_value.len(), &patch.new_value);
    }

    Some(output)
}

/// First occurrence of `token` in `haystack` that is not part of a longer
/// number (so `2` never matches inside `2.5` or `12`).
fn find_token(haystack: &str, token: &str) -> Option<usize> {
    let numeric = token.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+');
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(token) {
        let at = from + pos;
        if !numeric {
            return Some(at);
        }
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + token.len()..].chars().next();
        let part_of_number = |c: Option<char>| {
            c.is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | 'E' | 'e'))
        };
        if !part_of_number(before) && !part_of_number(after) {
            return Some(at);
        }
        from = at + token.len();
    }
    None
}
