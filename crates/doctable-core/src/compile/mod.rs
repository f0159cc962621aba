//! Expression-to-query compilation.
//!
//! Compilers run once per query and produce immutable artifacts holding
//! parameterized text plus an ordinal-ordered descriptor list. Binding the
//! artifacts to runtime values is the resolver's job.

mod condition;
mod param;
mod selection;
mod template;

#[cfg(test)]
mod tests;

use crate::expr::{CompareOp, MathOp};
use doctable_primitives::AttributeType;
use std::fmt;
use thiserror::Error as ThisError;

pub use condition::{CompiledCondition, ConditionCompiler, InMemoryFilter, UpdateReducer};
pub use param::ParameterDescriptor;
pub use selection::{
    CompiledSelection, OrderByKey, SelectColumn, Selection, SelectionCompiler, SortOrder, SubSelect,
    UNBOUNDED_LIMIT,
};
pub use template::{Template, merge_ordinals};

///
/// CONSTANTS
///

pub(crate) const PLACEHOLDER: &str = "?";
pub(crate) const SQL_AS: &str = " AS ";
pub(crate) const SQL_AND: &str = " AND ";
pub(crate) const SQL_MAX: &str = "MAX";
pub(crate) const SEPARATOR: &str = ", ";

/// Alias of the correlated sub-select in a last-value rewrite.
pub const SUB_SELECT_ALIAS: &str = "t2";

/// Text of the always-true sentinel condition.
pub const ALWAYS_TRUE_TEXT: &str = "true";

///
/// ClauseKind
///
/// Clause an expression is compiled for; controls which node kinds are legal.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClauseKind {
    Condition,
    Selection,
    GroupBy,
    Having,
    OrderBy,
    SetAttribute,
}

impl ClauseKind {
    #[must_use]
    pub const fn allows_aggregates(self) -> bool {
        matches!(self, Self::Selection | Self::Having)
    }

    /// Having clauses reference select aliases, so table fields render bare.
    #[must_use]
    pub const fn qualifies_fields(self) -> bool {
        !matches!(self, Self::Having)
    }
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Condition => "condition",
            Self::Selection => "selection",
            Self::GroupBy => "group by",
            Self::Having => "having",
            Self::OrderBy => "order by",
            Self::SetAttribute => "set attribute",
        };
        write!(f, "{label}")
    }
}

///
/// CompileError
///
/// Compile-time failures; reported before any artifact exists.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CompileError {
    #[error("unsupported function '{name}'")]
    UnsupportedFunction { name: String },

    #[error("unsupported expression '{kind}'")]
    UnsupportedExpression { kind: &'static str },

    #[error("function '{name}' expects {expected} argument(s), found {found}")]
    Arity {
        name: String,
        expected: &'static str,
        found: usize,
    },

    #[error("operator {op} needs ordered operands, found {ty}")]
    NotOrderable { op: CompareOp, ty: AttributeType },

    #[error("operator {op} needs numeric operands, found {ty}")]
    NotArithmetic { op: MathOp, ty: AttributeType },

    #[error("function '{name}' cannot aggregate {ty}")]
    NotAggregatable { name: String, ty: AttributeType },

    #[error("{connective} needs bool operands, found {ty}")]
    NotBoolean {
        connective: &'static str,
        ty: AttributeType,
    },

    #[error("contains pattern must be a constant or an attribute")]
    ContainsPatternNotLeaf,

    #[error("aggregate '{name}' is not allowed in a {clause} clause")]
    AggregateNotAllowed { name: String, clause: ClauseKind },

    #[error("incrementalAggregator:last is only allowed as a select column")]
    LastValueMisplaced,

    #[error("incrementalAggregator:last arguments must be attributes")]
    LastValueArguments,

    #[error("set value must be a constant or a stream attribute")]
    SetValueNotLeaf,

    #[error("table has no attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("selection has no columns")]
    EmptySelection,

    #[error("invalid identifier '{name}'")]
    InvalidIdentifier { name: String },
}

impl CompileError {
    /// Whether this names a construct the document store cannot express.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFunction { .. } | Self::UnsupportedExpression { .. }
        )
    }
}

/// Accept names that can be spliced into query text as-is.
pub(crate) fn validate_identifier(name: &str) -> Result<(), CompileError> {
    let mut chars = name.chars();
    let valid_head = chars
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_');

    if valid_head && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        Ok(())
    } else {
        Err(CompileError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}
