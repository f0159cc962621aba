use crate::value::Value;
use doctable_primitives::AttributeType;
use std::{
    fmt,
    ops::{BitAnd, BitOr},
};

///
/// CONSTANTS
///

/// Namespace of the incremental-aggregation functions.
pub const INCREMENTAL_AGGREGATOR_NAMESPACE: &str = "incrementalAggregator";

/// Namespace of the string functions.
pub const STR_NAMESPACE: &str = "str";

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    /// Operator symbol in the document-store query dialect.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }

    /// Whether this operator needs ordered operands.
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::Lt | Self::Lte | Self::Gt | Self::Gte)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

///
/// MathOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MathOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Mod,
}

impl MathOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Mod => "%",
        }
    }
}

impl fmt::Display for MathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

///
/// Expr
///
/// Closed expression tree handed over by the query engine.
///
/// Attribute       → stream-side attribute; bound from the runtime value map.
/// TableAttribute  → persisted-side attribute; rendered as a document field path.
/// In              → membership against another table; never pushed down.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Constant(Value),
    Attribute {
        name: String,
        ty: AttributeType,
    },
    TableAttribute {
        name: String,
        ty: AttributeType,
    },
    Compare {
        op: CompareOp,
        left: Box<Self>,
        right: Box<Self>,
    },
    And(Box<Self>, Box<Self>),
    Or(Box<Self>, Box<Self>),
    Not(Box<Self>),
    IsNull(Box<Self>),
    Contains {
        attribute: Box<Self>,
        pattern: Box<Self>,
    },
    Math {
        op: MathOp,
        left: Box<Self>,
        right: Box<Self>,
    },
    Function {
        namespace: Option<String>,
        name: String,
        args: Vec<Self>,
    },
    In {
        left: Box<Self>,
        table: String,
    },
}

impl Expr {
    ///
    /// LEAVES
    ///

    #[must_use]
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant(value.into())
    }

    /// The root-level always-true condition.
    #[must_use]
    pub const fn always_true() -> Self {
        Self::Constant(Value::Bool(true))
    }

    #[must_use]
    pub fn attribute(name: impl Into<String>, ty: AttributeType) -> Self {
        Self::Attribute {
            name: name.into(),
            ty,
        }
    }

    #[must_use]
    pub fn table_attribute(name: impl Into<String>, ty: AttributeType) -> Self {
        Self::TableAttribute {
            name: name.into(),
            ty,
        }
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(
            self,
            Self::Constant(_) | Self::Attribute { .. } | Self::TableAttribute { .. }
        )
    }

    /// Whether this is the root always-true sentinel.
    #[must_use]
    pub const fn is_always_true(&self) -> bool {
        matches!(self, Self::Constant(Value::Bool(true)))
    }

    /// Name carried by an attribute leaf.
    #[must_use]
    pub fn leaf_name(&self) -> Option<&str> {
        match self {
            Self::Attribute { name, .. } | Self::TableAttribute { name, .. } => Some(name),
            _ => None,
        }
    }

    ///
    /// COMPARISON
    ///

    #[must_use]
    pub fn compare(op: CompareOp, left: Self, right: Self) -> Self {
        Self::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn eq(left: Self, right: Self) -> Self {
        Self::compare(CompareOp::Eq, left, right)
    }

    #[must_use]
    pub fn ne(left: Self, right: Self) -> Self {
        Self::compare(CompareOp::Ne, left, right)
    }

    #[must_use]
    pub fn lt(left: Self, right: Self) -> Self {
        Self::compare(CompareOp::Lt, left, right)
    }

    #[must_use]
    pub fn lte(left: Self, right: Self) -> Self {
        Self::compare(CompareOp::Lte, left, right)
    }

    #[must_use]
    pub fn gt(left: Self, right: Self) -> Self {
        Self::compare(CompareOp::Gt, left, right)
    }

    #[must_use]
    pub fn gte(left: Self, right: Self) -> Self {
        Self::compare(CompareOp::Gte, left, right)
    }

    ///
    /// CONNECTIVES
    ///

    #[must_use]
    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    #[must_use]
    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    #[expect(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    #[must_use]
    pub fn is_null(inner: Self) -> Self {
        Self::IsNull(Box::new(inner))
    }

    #[must_use]
    pub fn contains(attribute: Self, pattern: Self) -> Self {
        Self::Contains {
            attribute: Box::new(attribute),
            pattern: Box::new(pattern),
        }
    }

    #[must_use]
    pub fn in_table(left: Self, table: impl Into<String>) -> Self {
        Self::In {
            left: Box::new(left),
            table: table.into(),
        }
    }

    ///
    /// ARITHMETIC
    ///

    #[must_use]
    pub fn math(op: MathOp, left: Self, right: Self) -> Self {
        Self::Math {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    ///
    /// FUNCTIONS
    ///

    #[must_use]
    pub fn function(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Function {
            namespace: None,
            name: name.into(),
            args,
        }
    }

    #[must_use]
    pub fn namespaced(
        namespace: impl Into<String>,
        name: impl Into<String>,
        args: Vec<Self>,
    ) -> Self {
        Self::Function {
            namespace: Some(namespace.into()),
            name: name.into(),
            args,
        }
    }

    #[must_use]
    pub fn sum(arg: Self) -> Self {
        Self::function("sum", vec![arg])
    }

    #[must_use]
    pub fn count() -> Self {
        Self::function("count", Vec::new())
    }

    #[must_use]
    pub fn avg(arg: Self) -> Self {
        Self::function("avg", vec![arg])
    }

    #[must_use]
    pub fn min(arg: Self) -> Self {
        Self::function("min", vec![arg])
    }

    #[must_use]
    pub fn max(arg: Self) -> Self {
        Self::function("max", vec![arg])
    }

    /// `incrementalAggregator:last(value, timestamp)`.
    #[must_use]
    pub fn last(value: Self, timestamp: Self) -> Self {
        Self::namespaced(
            INCREMENTAL_AGGREGATOR_NAMESPACE,
            "last",
            vec![value, timestamp],
        )
    }

    /// Whether this node is an `incrementalAggregator:last(..)` call.
    #[must_use]
    pub fn is_last_value(&self) -> bool {
        self.last_value_args().is_some()
    }

    /// Arguments of an `incrementalAggregator:last(..)` call.
    #[must_use]
    pub fn last_value_args(&self) -> Option<&[Self]> {
        match self {
            Self::Function {
                namespace: Some(ns),
                name,
                args,
            } if ns == INCREMENTAL_AGGREGATOR_NAMESPACE && name == "last" => Some(args),
            _ => None,
        }
    }
}

impl BitAnd for Expr {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::and(self, rhs)
    }
}

impl BitOr for Expr {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::or(self, rhs)
    }
}
