//! Lazy projection of backend records into engine row-tuples.

#[cfg(test)]
mod tests;

use crate::{
    schema::{Row, Schema},
    table::Document,
    value::Value,
};
use std::vec;

///
/// RecordIterator
///
/// Engine-facing cursor over query results.
///
/// After exhaustion or `close`, `next` keeps returning the terminal empty
/// tuple and `has_next` reports `false`.
///

pub trait RecordIterator {
    fn has_next(&mut self) -> bool;

    fn next(&mut self) -> Row;

    /// Removal is not supported; calls are ignored.
    fn remove(&mut self) {}

    fn close(&mut self);
}

///
/// IterState
///

#[derive(Clone, Debug, Eq, PartialEq)]
enum IterState {
    Pending,
    Buffered,
    Closed,
}

///
/// DocumentIterator
///
/// Single-pass, single-consumer iterator over fetched documents. Rows are
/// built in schema order; a field absent from the document becomes `Null`.
///

#[derive(Debug)]
pub struct DocumentIterator {
    documents: vec::IntoIter<Document>,
    schema: Schema,
    state: IterState,
    buffered: Option<Row>,
}

impl DocumentIterator {
    #[must_use]
    pub fn new(documents: Vec<Document>, schema: Schema) -> Self {
        Self {
            documents: documents.into_iter(),
            schema,
            state: IterState::Pending,
            buffered: None,
        }
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    fn project(&self, document: &Document) -> Row {
        self.schema
            .iter()
            .map(|attribute| {
                document
                    .field(&attribute.name)
                    .map_or(Value::Null, |json| Value::from_json(json, attribute.ty))
            })
            .collect()
    }

    fn fetch(&mut self) {
        match self.documents.next() {
            Some(document) => {
                self.buffered = Some(self.project(&document));
                self.state = IterState::Buffered;
            }
            None => {
                self.buffered = None;
                self.state = IterState::Closed;
            }
        }
    }
}

impl RecordIterator for DocumentIterator {
    fn has_next(&mut self) -> bool {
        if self.state == IterState::Pending {
            self.fetch();
        }

        self.state == IterState::Buffered
    }

    fn next(&mut self) -> Row {
        if self.state == IterState::Pending {
            self.fetch();
        }
        if self.state == IterState::Buffered {
            self.state = IterState::Pending;
        }

        self.buffered.take().unwrap_or_default()
    }

    fn close(&mut self) {
        self.buffered = None;
        self.state = IterState::Closed;
        self.documents = Vec::new().into_iter();
    }
}

/// Drain any record iterator as a standard iterator of rows.
pub fn rows<I: RecordIterator>(mut records: I) -> impl Iterator<Item = Row> {
    std::iter::from_fn(move || {
        if records.has_next() {
            Some(records.next())
        } else {
            records.close();
            None
        }
    })
}
