use crate::value::Value;
use doctable_primitives::AttributeType;

///
/// ParameterDescriptor
///
/// Binding source of one positional placeholder.
///
/// Constant            → fixed literal captured at compile time.
/// AttributeReference  → looked up by name in the runtime value map.
/// Field               → persisted document field path; rendered verbatim
///                       and never bound from runtime values.
///

#[derive(Clone, Debug, PartialEq)]
pub enum ParameterDescriptor {
    Constant { ty: AttributeType, value: Value },
    AttributeReference { name: String, ty: AttributeType },
    Field { path: String, ty: AttributeType },
}

impl ParameterDescriptor {
    /// Build a constant descriptor typed by its value.
    /// Null constants carry no type of their own and are recorded as objects.
    #[must_use]
    pub fn constant(value: Value) -> Self {
        Self::Constant {
            ty: value.attribute_type().unwrap_or(AttributeType::Object),
            value,
        }
    }

    #[must_use]
    pub fn attribute(name: impl Into<String>, ty: AttributeType) -> Self {
        Self::AttributeReference {
            name: name.into(),
            ty,
        }
    }

    #[must_use]
    pub fn field(path: impl Into<String>, ty: AttributeType) -> Self {
        Self::Field {
            path: path.into(),
            ty,
        }
    }

    #[must_use]
    pub const fn ty(&self) -> AttributeType {
        match self {
            Self::Constant { ty, .. }
            | Self::AttributeReference { ty, .. }
            | Self::Field { ty, .. } => *ty,
        }
    }

    #[must_use]
    pub const fn is_constant(&self) -> bool {
        matches!(self, Self::Constant { .. })
    }

    /// Runtime attribute name this descriptor binds from, if any.
    #[must_use]
    pub fn bound_attribute(&self) -> Option<&str> {
        match self {
            Self::AttributeReference { name, .. } => Some(name),
            _ => None,
        }
    }
}
