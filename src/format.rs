//! Conversion between property values and STEP literal syntax.
//!
//! [`format_value`] output is used verbatim as a search key inside the
//! original file text, so it must be exact.

use crate::model::PropertyValue;

/// Formats a value as a STEP literal.
///
/// - absent → `$`
/// - booleans → `.T.` / `.F.`
/// - integral numbers → digits only
/// - other numbers → 6 fractional digits, trailing zeros trimmed to at least one
/// - strings → single-quoted, inner quotes doubled
///
/// Non-finite numbers have no STEP literal and format as `$`.
#[must_use]
pub fn format_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Absent => "$".to_string(),
        PropertyValue::Boolean(true) => ".T.".to_string(),
        PropertyValue::Boolean(false) => ".F.".to_string(),
        PropertyValue::Number(n) => format_number(*n),
        PropertyValue::String(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return "$".to_string();
    }
    if n.fract() == 0.0 {
        // -0.0 prints as "-0"
        return format!("{:.0}", n + 0.0);
    }

    let fixed = format!("{n:.6}");
    let trimmed = fixed.trim_end_matches('0');
    if trimmed == "-0." {
        return "0.0".to_string();
    }
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

/// Parses a single STEP literal back into a value.
///
/// Accepts the four shapes [`format_value`] produces. Returns `None` for
/// anything else (references, enums, typed wrappers).
#[must_use]
pub fn parse_literal(literal: &str) -> Option<PropertyValue> {
    let s = literal.trim();
    match s {
        "$" => return Some(PropertyValue::Absent),
        ".T." => return Some(PropertyValue::Boolean(true)),
        ".F." => return Some(PropertyValue::Boolean(false)),
        _ => {}
    }

    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        return Some(PropertyValue::String(s[1..s.len() - 1].replace("''", "'")));
    }

    if is_numeric_literal(s) {
        return s.parse::<f64>().ok().map(PropertyValue::Number);
    }

    None
}

/// A bare decimal literal as written in STEP: optional sign, digits, optional
/// fraction and exponent.
#[must_use]
pub fn is_numeric_literal(s: &str) -> bool {
    let body = s.strip_prefix(['-', '+']).unwrap_or(s);
    if !body.starts_with(|c: char| c.is_ascii_digit()) {
        return false;
    }
    let (mantissa, exponent) = match body.find(['E', 'e']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };
    let mut dots = 0;
    for c in mantissa.chars() {
        match c {
            '0'..='9' => {}
            '.' => dots += 1,
            _ => return false,
        }
    }
    if dots > 1 {
        return false;
    }
    match exponent {
        Some(exp) => {
            let digits = exp.strip_prefix(['-', '+']).unwrap_or(exp);
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        }
        None => true,
    }
}
