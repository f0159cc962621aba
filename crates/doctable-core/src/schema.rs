use crate::{resolve::BindError, value::Value};
use derive_more::Deref;
use doctable_primitives::AttributeType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// Values
///
/// Runtime value map keyed by attribute name.
/// Supplied per invocation to bind attribute-reference placeholders.
///

pub type Values = BTreeMap<String, Value>;

///
/// Row
///
/// Engine row-tuple; positions follow the owning schema.
///

pub type Row = Vec<Value>;

///
/// Attribute
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: AttributeType,
}

impl Attribute {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: AttributeType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

///
/// Schema
///
/// Ordered attribute list; defines the row-tuple projection order for reads
/// and the attribute-to-value mapping for writes.
///

#[derive(Clone, Debug, Default, Deref, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Schema(Vec<Attribute>);

impl Schema {
    #[must_use]
    pub const fn new(attributes: Vec<Attribute>) -> Self {
        Self(attributes)
    }

    /// Position of one attribute in projection order.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|attribute| attribute.name == name)
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.0.iter().find(|attribute| attribute.name == name)
    }

    /// Attribute names in projection order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|attribute| attribute.name.as_str())
    }

    /// Map one positional row onto attribute names.
    pub fn values_to_map(&self, row: &[Value]) -> Result<Values, BindError> {
        if row.len() != self.0.len() {
            return Err(BindError::ArityMismatch {
                expected: self.0.len(),
                found: row.len(),
            });
        }

        Ok(self
            .0
            .iter()
            .zip(row)
            .map(|(attribute, value)| (attribute.name.clone(), value.clone()))
            .collect())
    }
}

impl FromIterator<Attribute> for Schema {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
