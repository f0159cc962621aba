//! Core runtime for doctable: expression compilation, runtime binding,
//! document-backed tables and result iteration.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod compile;
pub mod config;
pub mod error;
pub mod expr;
pub mod iter;
pub mod obs;
pub mod resolve;
pub mod schema;
pub mod table;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Domain vocabulary only; errors, backends and metrics stay in their modules.
///

pub mod prelude {
    pub use crate::{
        compile::{ClauseKind, OrderByKey, SelectColumn, Selection, SortOrder},
        expr::{CompareOp, Expr, MathOp},
        iter::RecordIterator,
        schema::{Attribute, Row, Schema, Values},
        value::Value,
    };
    pub use doctable_primitives::AttributeType;
}
