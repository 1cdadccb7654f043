//! Uniform accessor over raw catalog fields.
//!
//! Upstream records disagree on shape: the same logical field can arrive as a
//! scalar, a single-element list, a list of objects, or nested one level inside
//! a sub-object. [`FlexValue`] is a borrowed view that answers the handful of
//! questions the normalizer asks ("give me the texts", "give me a flag") the
//! same way regardless of the shape underneath.

use serde_json::{Map, Number, Value};

use super::parse::{dedupe_preserving_order, extract_year, parse_bool, parse_number, split_multi};

/// Object members consulted, in order, when an object stands in for a text value.
const LABEL_KEYS: [&str; 5] = ["term", "name", "type", "title", "value"];

/// A borrowed, shape-agnostic view of one raw field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlexValue<'a> {
    /// The field is missing (or JSON `null`).
    Absent,
    /// A string value (CSV cell or JSON string), untrimmed.
    Text(&'a str),
    /// A JSON number.
    Number(&'a Number),
    /// A JSON boolean.
    Bool(bool),
    /// A JSON array.
    List(&'a [Value]),
    /// A JSON object.
    Object(&'a Map<String, Value>),
}

impl<'a> From<&'a Value> for FlexValue<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Self::Absent,
            Value::Bool(flag) => Self::Bool(*flag),
            Value::Number(number) => Self::Number(number),
            Value::String(text) => Self::Text(text),
            Value::Array(items) => Self::List(items),
            Value::Object(map) => Self::Object(map),
        }
    }
}

impl<'a> From<Option<&'a Value>> for FlexValue<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        value.map_or(Self::Absent, Self::from)
    }
}

impl<'a> FlexValue<'a> {
    /// Wraps an optional CSV cell. A missing column is `Absent`; an empty cell
    /// is present-but-empty `Text`.
    #[must_use]
    pub fn cell(cell: Option<&'a str>) -> Self {
        cell.map_or(Self::Absent, Self::Text)
    }

    /// Returns true when the source carried this field at all.
    #[must_use]
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// Returns `self` when present, otherwise `other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        if self.is_present() { self } else { other }
    }

    /// Looks up an object member. Non-objects have no members.
    #[must_use]
    pub fn get(&self, key: &str) -> FlexValue<'a> {
        match self {
            Self::Object(map) => FlexValue::from(map.get(key)),
            _ => Self::Absent,
        }
    }

    /// Looks up a member when this is an object, otherwise returns `self`.
    ///
    /// Used for fields that are a sub-object in one schema version and a bare
    /// value in another (e.g. `apc: {"has_apc": true}` vs `apc: "Yes"`).
    #[must_use]
    pub fn member_or_self(&self, key: &str) -> FlexValue<'a> {
        match self {
            Self::Object(_) => self.get(key),
            other => *other,
        }
    }

    /// Returns the first item (the value itself for non-lists).
    #[must_use]
    pub fn first(&self) -> FlexValue<'a> {
        match self {
            Self::List(items) => FlexValue::from(items.first()),
            other => *other,
        }
    }

    /// Returns a single trimmed, non-empty text for scalar-ish fields.
    #[must_use]
    pub fn first_text(&self) -> Option<String> {
        match self {
            Self::Absent | Self::Bool(_) => None,
            Self::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Self::Number(number) => Some(number.to_string()),
            Self::List(items) => items
                .iter()
                .find_map(|item| FlexValue::from(item).first_text()),
            Self::Object(_) => self.label().first_text(),
        }
    }

    /// Returns all text values, flattened one level, trimmed and deduplicated
    /// preserving first-seen order. A bare string is split on multi-value
    /// delimiters; list items are taken as-is.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        let mut collected = Vec::new();
        self.collect_texts(&mut collected, true);
        dedupe_preserving_order(collected)
    }

    fn collect_texts(&self, out: &mut Vec<String>, descend: bool) {
        match self {
            Self::Absent | Self::Bool(_) => {}
            Self::Text(text) if descend => out.extend(split_multi(text)),
            // List items are already individual values; commas inside them are content.
            Self::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            Self::Number(number) => out.push(number.to_string()),
            Self::Object(_) => self.label().collect_texts(out, false),
            Self::List(items) if descend => {
                for item in *items {
                    FlexValue::from(item).collect_texts(out, false);
                }
            }
            Self::List(_) => {}
        }
    }

    /// Interprets the value as a tri-state flag. Unknown stays `None`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            Self::Text(text) => parse_bool(text),
            Self::Number(number) => match number.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            Self::List(_) => self.first().as_bool(),
            Self::Absent | Self::Object(_) => None,
        }
    }

    /// Interprets the value as a decimal number.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => number.as_f64(),
            Self::Text(text) => parse_number(text),
            Self::List(_) => self.first().as_number(),
            Self::Absent | Self::Bool(_) | Self::Object(_) => None,
        }
    }

    /// Interprets the value as a calendar year (`19xx` / `20xx` inside text,
    /// or a plain integer).
    #[must_use]
    pub fn as_year(&self) -> Option<i32> {
        match self {
            Self::Number(number) => number
                .as_i64()
                .and_then(|year| i32::try_from(year).ok())
                .filter(|year| (1000..=9999).contains(year)),
            Self::Text(text) => extract_year(text),
            Self::List(_) => self.first().as_year(),
            Self::Object(_) => self.get("year").as_year(),
            Self::Absent | Self::Bool(_) => None,
        }
    }

    /// Picks the member an object would be displayed by.
    fn label(&self) -> FlexValue<'a> {
        LABEL_KEYS
            .iter()
            .map(|key| self.get(key))
            .find(|value| matches!(value, Self::Text(_) | Self::Number(_)))
            .unwrap_or(Self::Absent)
    }
}
