//! ## Crate layout
//! - `core`: compilers, resolver, document table, iterator, config and observability.
//! - `primitives`: the attribute type registry shared by every layer.
//!
//! The `prelude` module carries the vocabulary needed to build expressions,
//! selections and schemas; tables and backends come from `core::table`.

pub use doctable_core as core;
pub use doctable_primitives as primitives;

pub use doctable_core::{
    config::StoreConfig,
    error::InternalError as Error,
    table::{Backend, DocumentTable, TableDefinition},
};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::{
        compile::{
            ClauseKind, CompiledCondition, CompiledSelection, OrderByKey, SelectColumn, Selection,
            SortOrder,
        },
        expr::{CompareOp, Expr, MathOp},
        iter::{RecordIterator, rows},
        schema::{Attribute, Row, Schema, Values},
        table::{BatchOutcome, Document, SetClause},
        value::Value,
    };
    pub use crate::primitives::AttributeType;
}
