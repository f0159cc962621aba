
use doctable_primitives::AttributeType;
use serde_json::Value as JsonValue;
use std::fmt::{self, Write as _};

///
/// CONSTANTS
///

const NULL_LITERAL: &str = "null";
const QUOTE: char = '\'';
const ESCAPE: char = '\\';

///
/// Value
///
/// Runtime value carried by engine rows and runtime value maps.
///
/// Null    → attribute is absent or explicitly null.
/// Object  → opaque document fragment; rendered as a JSON literal.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Object(JsonValue),
}

impl Value {
    /// Return the attribute type this value naturally carries.
    /// `Null` has no type of its own.
    #[must_use]
    pub const fn attribute_type(&self) -> Option<AttributeType> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(AttributeType::Bool),
            Self::Int(_) => Some(AttributeType::Int),
            Self::Long(_) => Some(AttributeType::Long),
            Self::Float(_) => Some(AttributeType::Float),
            Self::Double(_) => Some(AttributeType::Double),
            Self::String(_) => Some(AttributeType::String),
            Self::Object(_) => Some(AttributeType::Object),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    ///
    /// JSON CONVERSION
    ///

    /// Convert into the JSON representation stored in documents.
    /// Non-finite floats have no JSON form and become `null`.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(v) => JsonValue::Bool(*v),
            Self::Int(v) => JsonValue::from(*v),
            Self::Long(v) => JsonValue::from(*v),
            Self::Float(v) => JsonValue::from(f64::from(*v)),
            Self::Double(v) => JsonValue::from(*v),
            Self::String(v) => JsonValue::String(v.clone()),
            Self::Object(v) => v.clone(),
        }
    }

    /// Read one document field as a value of the declared attribute type.
    ///
    /// Numbers are narrowed to the declared numeric type. A JSON kind that
    /// does not fit the declared type is kept verbatim as `Object` so no
    /// stored data is silently dropped.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_json(json: &JsonValue, ty: AttributeType) -> Self {
        if json.is_null() {
            return Self::Null;
        }

        let narrowed = match ty {
            AttributeType::Bool => json.as_bool().map(Self::Bool),
            AttributeType::Int => json
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Self::Int),
            AttributeType::Long => json.as_i64().map(Self::Long),
            AttributeType::Float => json.as_f64().map(|v| Self::Float(v as f32)),
            AttributeType::Double => json.as_f64().map(Self::Double),
            AttributeType::String => json.as_str().map(|v| Self::String(v.to_string())),
            AttributeType::Object => None,
        };

        narrowed.unwrap_or_else(|| Self::Object(json.clone()))
    }

    ///
    /// LITERAL RENDERING
    ///

    /// Append this value as a query literal for a placeholder of type `ty`.
    ///
    /// Quoting follows the placeholder's declared type; a text value bound to
    /// a non-text placeholder is still quoted so it can never splice raw
    /// query text.
    pub fn render_literal(&self, ty: AttributeType, out: &mut String) {
        match self {
            Self::Null => out.push_str(NULL_LITERAL),
            Self::String(text) => push_quoted(text, out),
            _ if ty.is_quoted_literal() => push_quoted(&self.to_string(), out),
            Self::Float(v) if !v.is_finite() => out.push_str(NULL_LITERAL),
            Self::Double(v) if !v.is_finite() => out.push_str(NULL_LITERAL),
            Self::Object(json) => out.push_str(&json.to_string()),
            _ => {
                let _ = write!(out, "{self}");
            }
        }
    }

    /// Append this value as a quoted text literal regardless of its type.
    pub fn render_text_literal(&self, out: &mut String) {
        match self {
            Self::Null => out.push_str(NULL_LITERAL),
            Self::String(text) => push_quoted(text, out),
            other => push_quoted(&other.to_string(), out),
        }
    }
}

// Quote one text literal, escaping the quote and escape characters.
fn push_quoted(text: &str, out: &mut String) {
    out.reserve(text.len() + 2);
    out.push(QUOTE);
    for ch in text.chars() {
        if ch == QUOTE || ch == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
    out.push(QUOTE);
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str(NULL_LITERAL),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Object(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
