#[macro_use]
mod macros;

use serde::{Deserialize, Serialize};
use std::fmt;

///
/// AttributeType
///
/// Canonical attribute type declared by a table or stream definition.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    Bool,
    Double,
    Float,
    Int,
    Long,
    Object,
    String,
}

impl AttributeType {
    /// Return the full metadata descriptor for one attribute type.
    #[must_use]
    pub const fn metadata(self) -> AttributeMetadata {
        attribute_type_registry!(metadata_from_registry, self)
    }

    /// Return the coarse routing family for this attribute type.
    #[must_use]
    pub const fn family(self) -> AttributeFamily {
        self.metadata().family
    }

    /// Return whether literals of this type render inside quotes.
    #[must_use]
    pub const fn is_quoted_literal(self) -> bool {
        self.metadata().is_quoted_literal
    }

    /// Return whether this type supports ordering comparisons.
    #[must_use]
    pub const fn supports_ordering(self) -> bool {
        self.metadata().supports_ordering
    }

    /// Return whether this type supports arithmetic operators.
    #[must_use]
    pub const fn supports_arithmetic(self) -> bool {
        self.metadata().supports_arithmetic
    }

    /// Return the lowercase name used by stream definitions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Double => "double",
            Self::Float => "float",
            Self::Int => "int",
            Self::Long => "long",
            Self::Object => "object",
            Self::String => "string",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// AttributeMetadata
///
/// Capability metadata shared by the compiler and the resolver.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AttributeMetadata {
    pub family: AttributeFamily,
    pub is_quoted_literal: bool,
    pub supports_ordering: bool,
    pub supports_arithmetic: bool,
}

///
/// AttributeFamily
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AttributeFamily {
    Bool,
    Numeric,
    Object,
    Textual,
}

/// Ordered list of all attribute types in registry order.
pub const ALL_ATTRIBUTE_TYPES: [AttributeType; 7] =
    attribute_type_registry!(all_types_from_registry);
