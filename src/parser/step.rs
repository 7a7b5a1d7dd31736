use std::collections::HashMap;
use std::ops::Range;

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    String(String),
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Enum(String),
    Reference(u64),
    List(Vec<StepValue>),
    /// Type-wrapped value such as `IFCLABEL('x')`.
    Typed(String, Box<StepValue>),
    Null,
    Derived,
}

impl StepValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StepValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_reference(&self) -> Option<u64> {
        match self {
            StepValue::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// Referenced ids of a list value; empty for anything else.
    #[must_use]
    pub fn references(&self) -> Vec<u64> {
        match self {
            StepValue::List(list) => list.iter().filter_map(StepValue::as_reference).collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepEntity {
    pub id: u64,
    pub entity_type: String,
    pub values: Vec<StepValue>,
}

impl StepEntity {
    /// String attribute at `index`, if present and a string.
    #[must_use]
    pub fn string_at(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(StepValue::as_str)
    }

    #[must_use]
    pub fn reference_at(&self, index: usize) -> Option<u64> {
        self.values.get(index).and_then(StepValue::as_reference)
    }
}

#[derive(Debug)]
pub struct StepFile {
    pub entities: HashMap<u64, StepEntity>,
    pub schema: String,
    pub description: String,
}

impl StepFile {
    pub fn parse(content: &str) -> Result<Self, ParseError> {
        let mut entities = HashMap::new();
        let mut schema = String::new();
        let mut description = String::new();
        let mut in_data = false;
        let mut saw_header = false;
        let mut pending = String::new();

        for line in content.lines() {
            let line = line.trim();

            if line == "HEADER;" {
                saw_header = true;
                continue;
            }

            if line.starts_with("FILE_SCHEMA") {
                if let Some(value) = first_quoted(line) {
                    schema = value;
                }
                continue;
            }

            if line.starts_with("FILE_DESCRIPTION") {
                if let Some(value) = first_quoted(line) {
                    description = value;
                }
                continue;
            }

            if line == "DATA;" {
                in_data = true;
                continue;
            }
            if line == "ENDSEC;" {
                in_data = false;
                continue;
            }

            if !in_data {
                continue;
            }

            // Records may wrap over several physical lines.
            if pending.is_empty() && !line.starts_with('#') {
                continue;
            }
            pending.push_str(line);
            if !line.ends_with(';') {
                continue;
            }
            if let Some(entity) = Self::parse_entity_line(&pending) {
                entities.insert(entity.id, entity);
            }
            pending.clear();
        }

        if !saw_header {
            return Err(ParseError::InvalidStep {
                message: "missing HEADER section".to_string(),
            });
        }

        Ok(StepFile {
            entities,
            schema,
            description,
        })
    }

    fn parse_entity_line(line: &str) -> Option<StepEntity> {
        // Format: #123=IFCWALL('guid',#ref,'name',...);
        let line = line.trim_end_matches(';');

        let eq_pos = line.find('=')?;
        let id: u64 = line[1..eq_pos].trim().parse().ok()?;

        let rest = line[eq_pos + 1..].trim();
        let paren_pos = rest.find('(')?;
        let entity_type = rest[..paren_pos].trim().to_string();

        let values_str = rest[paren_pos + 1..].strip_suffix(')')?;
        let values = Self::parse_values(values_str);

        Some(StepEntity {
            id,
            entity_type,
            values,
        })
    }

    fn parse_values(s: &str) -> Vec<StepValue> {
        split_top_level(s)
            .into_iter()
            .map(Self::parse_single_value)
            .collect()
    }

    fn parse_single_value(s: &str) -> StepValue {
        let s = s.trim();

        if s == "$" {
            return StepValue::Null;
        }
        if s == "*" {
            return StepValue::Derived;
        }
        if let Some(stripped) = s.strip_prefix('#') {
            if let Ok(id) = stripped.parse::<u64>() {
                return StepValue::Reference(id);
            }
        }
        if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
            let raw = &s[1..s.len() - 1];
            return StepValue::String(decode_step_string(raw));
        }
        if s.len() >= 2 && s.starts_with('.') && s.ends_with('.') {
            let inner = &s[1..s.len() - 1];
            if inner == "T" {
                return StepValue::Boolean(true);
            }
            if inner == "F" {
                return StepValue::Boolean(false);
            }
            return StepValue::Enum(inner.to_string());
        }
        if s.starts_with('(') && s.ends_with(')') {
            let inner = &s[1..s.len() - 1];
            return StepValue::List(Self::parse_values(inner));
        }
        if let Ok(i) = s.parse::<i64>() {
            return StepValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return StepValue::Real(f);
        }
        // Typed value like IFCBOOLEAN(.T.)
        if let Some(paren_pos) = s.find('(') {
            if s.ends_with(')') {
                let type_name = s[..paren_pos].trim().to_string();
                let inner = &s[paren_pos + 1..s.len() - 1];
                return StepValue::Typed(type_name, Box::new(Self::parse_single_value(inner)));
            }
        }

        StepValue::String(s.to_string())
    }

    #[must_use]
    pub fn get_entity(&self, id: u64) -> Option<&StepEntity> {
        self.entities.get(&id)
    }

    #[must_use]
    pub fn get_entities_by_type(&self, entity_type: &str) -> Vec<&StepEntity> {
        let mut found: Vec<&StepEntity> = self
            .entities
            .values()
            .filter(|e| e.entity_type == entity_type)
            .collect();
        found.sort_by_key(|e| e.id);
        found
    }
}

/// Splits a STEP argument list on commas that are outside quotes and parentheses.
///
/// Each returned slice is trimmed. An empty input yields no arguments.
#[must_use]
pub fn split_top_level(s: &str) -> Vec<&str> {
    split_top_level_spans(s)
        .into_iter()
        .map(|span| s[span].trim())
        .collect()
}

/// Byte ranges of the top-level arguments of `s`, untrimmed.
#[must_use]
pub fn split_top_level_spans(s: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut in_string = false;
    let mut depth = 0usize;
    let mut start = 0;

    for (i, ch) in s.char_indices() {
        match ch {
            // '' inside a string toggles twice and stays in the string
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => depth = depth.saturating_sub(1),
            ',' if !in_string && depth == 0 => {
                spans.push(start..i);
                start = i + 1;
            }
            _ => {}
        }
    }

    if !s[start..].trim().is_empty() || !spans.is_empty() {
        spans.push(start..s.len());
    }
    spans
}

fn first_quoted(line: &str) -> Option<String> {
    let start = line.find('\'')?;
    let end = line[start + 1..].find('\'')?;
    Some(line[start + 1..start + 1 + end].to_string())
}

/// Decode STEP/IFC encoded strings with Unicode escape sequences.
/// Supports:
/// - `\X2\XXXX\X0\` - 2-byte Unicode (BMP), can have multiple 4-char hex codes
/// - `\X\XX` - 1-byte ISO 8859-1
/// - `\\` - escaped backslash
/// - `''` - escaped apostrophe
fn decode_step_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.peek() {
                Some('X') => {
                    chars.next(); // consume 'X'
                    match chars.peek() {
                        Some('2') => {
                            chars.next(); // consume '2'
                            chars.next(); // consume '\'

                            let mut hex = String::new();
                            while let Some(&c) = chars.peek() {
                                if c == '\\' {
                                    break;
                                }
                                hex.push(c);
                                chars.next();
                            }
                            // Skip \X0\
                            if chars.peek() == Some(&'\\') {
                                for _ in 0..4 {
                                    chars.next();
                                }
                            }
                            for chunk in hex.as_bytes().chunks(4) {
                                let code = std::str::from_utf8(chunk)
                                    .ok()
                                    .and_then(|s| u32::from_str_radix(s, 16).ok())
                                    .and_then(char::from_u32);
                                if let (4, Some(c)) = (chunk.len(), code) {
                                    result.push(c);
                                }
                            }
                        }
                        Some('\\') => {
                            chars.next(); // consume '\'
                            let hex: String = chars.by_ref().take(2).collect();
                            if let Ok(code) = u8::from_str_radix(&hex, 16) {
                                result.push(char::from(code));
                            }
                        }
                        _ => {
                            result.push('\\');
                            result.push('X');
                        }
                    }
                }
                Some('\\') => {
                    chars.next();
                    result.push('\\');
                }
                Some('S') => {
                    // \S\X - single char shift (ISO 8859-1 high bit)
                    chars.next(); // 'S'
                    chars.next(); // '\'
                    if let Some(c) = chars.next() {
                        if let Some(shifted) = char::from_u32(u32::from(c) + 128) {
                            result.push(shifted);
                        }
                    }
                }
                _ => result.push('\\'),
            }
        } else if ch == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
            }
            result.push('\'');
        } else {
            result.push(ch);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_respects_strings_and_parens() {
        assert_eq!(
            split_top_level("'a,b',$,IFCLABEL('x,(y'),#5"),
            vec!["'a,b'", "$", "IFCLABEL('x,(y')", "#5"]
        );
        assert_eq!(split_top_level("'it''s',2"), vec!["'it''s'", "2"]);
        assert!(split_top_level("").is_empty());
    }

    #[test]
    fn test_parse_typed_value() {
        let text = "ISO-10303-21;\nHEADER;\nFILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');\nFILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n#7=IFCPROPERTYSINGLEVALUE('FireRating',$,IFCLABEL('2HR'),$);\n#8=IFCPROPERTYSINGLEVALUE('IsExternal',$,\n  IFCBOOLEAN(.T.),$);\nENDSEC;\nEND-ISO-10303-21;\n";
        let file = StepFile::parse(text).unwrap();
        assert_eq!(file.schema, "IFC4");
        assert_eq!(file.description, "ViewDefinition [CoordinationView]");

        let prop = file.get_entity(7).unwrap();
        assert_eq!(prop.entity_type, "IFCPROPERTYSINGLEVALUE");
        assert_eq!(
            prop.values[2],
            StepValue::Typed("IFCLABEL".into(), Box::new(StepValue::String("2HR".into())))
        );
        assert_eq!(prop.values[1], StepValue::Null);

        let wrapped = file.get_entity(8).unwrap();
        assert_eq!(
            wrapped.values[2],
            StepValue::Typed("IFCBOOLEAN".into(), Box::new(StepValue::Boolean(true)))
        );
    }

    #[test]
    fn test_missing_header_is_invalid() {
        assert!(StepFile::parse("DATA;\n#1=IFCWALL('x');\nENDSEC;").is_err());
    }

    #[test]
    fn test_decode_unicode_escape() {
        assert_eq!(decode_step_string("\\X2\\00E9\\X0\\t\\X2\\00E9\\X0\\"), "été");
        assert_eq!(decode_step_string("it''s"), "it's");
    }
}
