//! Document-store backed table.
//!
//! Every operation resolves compiled artifacts into flat query text and
//! hands it to the owned [`Backend`] session together with the table's
//! container link.

mod backend;
mod query;


pub use backend::{Backend, BackendError, Document};

use crate::{
    compile::{
        ClauseKind, CompileError, CompiledCondition, CompiledSelection, ConditionCompiler,
        Selection, SelectionCompiler, validate_identifier,
    },
    config::StoreConfig,
    error::InternalError,
    expr::Expr,
    iter::DocumentIterator,
    obs::{
        CompileKind, ExecKind, MetricsEvent,
        sink::{self, Span},
    },
    resolve::{resolve, resolve_scalar},
    schema::{Row, Schema, Values},
    value::Value,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use ulid::Ulid;

///
/// TableDefinition
///
/// Table id plus the attribute schema rows are projected through.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableDefinition {
    pub id: String,
    pub schema: Schema,
}

impl TableDefinition {
    #[must_use]
    pub fn new(id: impl Into<String>, schema: Schema) -> Self {
        Self {
            id: id.into(),
            schema,
        }
    }
}

///
/// SetClause
///
/// One `attribute = value` assignment of an update.
///

#[derive(Clone, Debug)]
pub struct SetClause {
    pub attribute: String,
    pub value: CompiledCondition,
}

///
/// RecordFailure
///

#[derive(Debug)]
pub struct RecordFailure {
    pub index: usize,
    pub error: InternalError,
}

///
/// BatchOutcome
///
/// Per-record results of a batched write. `processed` counts records that
/// completed; `affected` counts documents created, replaced or deleted.
///

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub processed: usize,
    pub affected: usize,
    pub failures: Vec<RecordFailure>,
}

impl BatchOutcome {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|failure| failure.index).collect()
    }
}

///
/// PartialFailure
///
/// A record that failed after `done` documents were already written.
///

struct PartialFailure {
    done: usize,
    error: InternalError,
}

impl From<InternalError> for PartialFailure {
    fn from(error: InternalError) -> Self {
        Self { done: 0, error }
    }
}

///
/// PendingInsert
///

struct PendingInsert {
    index: usize,
    values: Values,
}

///
/// DocumentTable
///

#[derive(Debug)]
pub struct DocumentTable<B: Backend> {
    definition: TableDefinition,
    collection: String,
    container: String,
    backend: B,
}

impl<B: Backend> DocumentTable<B> {
    /// Bind a table definition to one collection of the configured database.
    ///
    /// The table id is spliced into every query, so it must be an identifier.
    pub fn new(
        definition: TableDefinition,
        config: &StoreConfig,
        backend: B,
    ) -> Result<Self, InternalError> {
        validate_identifier(&definition.id)?;
        config.validate()?;
        let collection = config.collection_for(&definition.id)?.to_string();
        let container = config.container_link(&collection);

        debug!(table = %definition.id, %container, "document table bound");

        Ok(Self {
            definition,
            collection,
            container,
            backend,
        })
    }

    #[must_use]
    pub const fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.definition.schema
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn container(&self) -> &str {
        &self.container
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    ///
    /// COMPILE
    ///

    pub fn compile_condition(&self, expr: &Expr) -> Result<CompiledCondition, InternalError> {
        let compiled = ConditionCompiler::new(self.id(), ClauseKind::Condition).compile(expr)?;
        self.record_compile(CompileKind::Condition, &compiled.query_text());

        Ok(compiled)
    }

    /// Compile the value side of `attribute = expr`.
    pub fn compile_set_attribute(
        &self,
        attribute: &str,
        expr: &Expr,
    ) -> Result<SetClause, InternalError> {
        if self.schema().attribute(attribute).is_none() {
            return Err(CompileError::UnknownAttribute {
                name: attribute.to_string(),
            }
            .into());
        }

        let value = ConditionCompiler::new(self.id(), ClauseKind::SetAttribute).compile(expr)?;
        self.record_compile(CompileKind::SetAttribute, &value.query_text());

        Ok(SetClause {
            attribute: attribute.to_string(),
            value,
        })
    }

    pub fn compile_selection(
        &self,
        selection: &Selection,
    ) -> Result<CompiledSelection, InternalError> {
        let compiled = SelectionCompiler::new(self.id()).compile(selection)?;
        self.record_compile(CompileKind::Selection, &compiled.select().query_text());

        Ok(compiled)
    }

    ///
    /// READ
    ///

    #[instrument(name = "doctable::table::find", level = "debug", skip_all, fields(table = %self.definition.id))]
    pub fn find(
        &self,
        values: &Values,
        condition: &CompiledCondition,
    ) -> Result<DocumentIterator, InternalError> {
        let _span = Span::new(ExecKind::Find, self.id());

        let filter = self.resolve_filter(condition, values)?;
        let documents = self.run_query(&query::find_query(self.id(), &filter))?;

        Ok(DocumentIterator::new(documents, self.schema().clone()))
    }

    #[instrument(name = "doctable::table::contains", level = "debug", skip_all, fields(table = %self.definition.id))]
    pub fn contains(
        &self,
        values: &Values,
        condition: &CompiledCondition,
    ) -> Result<bool, InternalError> {
        let _span = Span::new(ExecKind::Contains, self.id());

        let filter = self.resolve_filter(condition, values)?;
        let documents = self.run_query(&query::contains_query(self.id(), &filter))?;

        Ok(!documents.is_empty())
    }

    /// Execute a compiled selection filtered by `condition`.
    #[instrument(name = "doctable::table::query", level = "debug", skip_all, fields(table = %self.definition.id))]
    pub fn query(
        &self,
        values: &Values,
        condition: &CompiledCondition,
        selection: &CompiledSelection,
    ) -> Result<DocumentIterator, InternalError> {
        let _span = Span::new(ExecKind::Query, self.id());

        let filter = self.resolve_filter(condition, values)?;
        let text = selection.resolve(values, &filter)?;
        self.record_resolve(selection.placeholder_count());

        let documents = self.run_query(&text)?;

        Ok(DocumentIterator::new(
            documents,
            selection.output_schema().clone(),
        ))
    }

    ///
    /// WRITE
    ///

    /// Insert one document per row. Rows without an `id` value get a
    /// freshly generated one.
    #[instrument(name = "doctable::table::add", level = "debug", skip_all, fields(table = %self.definition.id, rows = rows.len()))]
    pub fn add(&self, rows: &[Row]) -> BatchOutcome {
        let mut span = Span::new(ExecKind::Add, self.id());
        let mut outcome = BatchOutcome::default();

        for (index, row) in rows.iter().enumerate() {
            let result = self
                .schema()
                .values_to_map(row)
                .map_err(InternalError::from)
                .and_then(|values| self.create(&values));

            match result {
                Ok(()) => {
                    outcome.processed += 1;
                    outcome.affected += 1;
                }
                Err(err) => self.fail_record(ExecKind::Add, &mut outcome, index, err),
            }
        }

        span.set_rows(count(outcome.affected));
        outcome
    }

    /// Delete every document matching `condition`, once per value map.
    #[instrument(name = "doctable::table::delete", level = "debug", skip_all, fields(table = %self.definition.id, batch = batch.len()))]
    pub fn delete(&self, batch: &[Values], condition: &CompiledCondition) -> BatchOutcome {
        let mut span = Span::new(ExecKind::Delete, self.id());
        let mut outcome = BatchOutcome::default();

        for (index, values) in batch.iter().enumerate() {
            match self.delete_matching(values, condition) {
                Ok(deleted) => {
                    outcome.processed += 1;
                    outcome.affected += deleted;
                }
                Err(PartialFailure { done, error }) => {
                    outcome.affected += done;
                    self.fail_record(ExecKind::Delete, &mut outcome, index, error);
                }
            }
        }

        span.set_rows(count(outcome.affected));
        outcome
    }

    /// Apply `set_clauses` to every document matching `condition`.
    ///
    /// `batch[i]` binds the condition and `set_values[i]` binds the set
    /// clauses of record `i`.
    #[instrument(name = "doctable::table::update", level = "debug", skip_all, fields(table = %self.definition.id, batch = batch.len()))]
    pub fn update(
        &self,
        condition: &CompiledCondition,
        batch: &[Values],
        set_clauses: &[SetClause],
        set_values: &[Values],
    ) -> Result<BatchOutcome, InternalError> {
        ensure_batch_len("set values", batch.len(), set_values.len())?;

        let mut span = Span::new(ExecKind::Update, self.id());
        let mut outcome = BatchOutcome::default();

        for (index, (values, set)) in batch.iter().zip(set_values).enumerate() {
            let result = self
                .matching(values, condition)
                .map_err(PartialFailure::from)
                .and_then(|documents| self.replace_all(documents, set_clauses, set));

            match result {
                Ok(updated) => {
                    outcome.processed += 1;
                    outcome.affected += updated;
                }
                Err(PartialFailure { done, error }) => {
                    outcome.affected += done;
                    self.fail_record(ExecKind::Update, &mut outcome, index, error);
                }
            }
        }

        span.set_rows(count(outcome.affected));
        Ok(outcome)
    }

    /// Update matching documents, inserting `add_rows[i]` when record `i`
    /// matches nothing.
    ///
    /// Inserts are held until the end of the batch. A later record whose
    /// condition already holds for a pending insert (per the condition's
    /// in-memory filter) is folded into it instead of issuing a new query.
    #[instrument(name = "doctable::table::update_or_add", level = "debug", skip_all, fields(table = %self.definition.id, batch = batch.len()))]
    pub fn update_or_add(
        &self,
        condition: &CompiledCondition,
        batch: &[Values],
        set_clauses: &[SetClause],
        set_values: &[Values],
        add_rows: &[Row],
    ) -> Result<BatchOutcome, InternalError> {
        ensure_batch_len("set values", batch.len(), set_values.len())?;
        ensure_batch_len("add rows", batch.len(), add_rows.len())?;

        let mut span = Span::new(ExecKind::UpdateOrAdd, self.id());
        let mut outcome = BatchOutcome::default();
        let mut pending: Vec<PendingInsert> = Vec::new();

        for (index, ((values, set), row)) in batch.iter().zip(set_values).zip(add_rows).enumerate()
        {
            let result = self.upsert_record(
                condition,
                values,
                set_clauses,
                set,
                row,
                index,
                &mut pending,
            );

            match result {
                Ok(Some(updated)) => {
                    outcome.processed += 1;
                    outcome.affected += updated;
                }
                // Queued as a pending insert; counted once it is created.
                Ok(None) => {}
                Err(PartialFailure { done, error }) => {
                    outcome.affected += done;
                    self.fail_record(ExecKind::UpdateOrAdd, &mut outcome, index, error);
                }
            }
        }

        for insert in pending {
            match self.create(&insert.values) {
                Ok(()) => {
                    outcome.processed += 1;
                    outcome.affected += 1;
                }
                Err(err) => {
                    self.fail_record(ExecKind::UpdateOrAdd, &mut outcome, insert.index, err);
                }
            }
        }

        outcome.failures.sort_by_key(|failure| failure.index);
        span.set_rows(count(outcome.affected));
        Ok(outcome)
    }

    ///
    /// INTERNAL
    ///

    // Returns the number of documents updated, or `None` when the record
    // was queued as a pending insert.
    #[expect(clippy::too_many_arguments)]
    fn upsert_record(
        &self,
        condition: &CompiledCondition,
        values: &Values,
        set_clauses: &[SetClause],
        set: &Values,
        row: &[Value],
        index: usize,
        pending: &mut Vec<PendingInsert>,
    ) -> Result<Option<usize>, PartialFailure> {
        if let Some(filter) = condition.in_memory_filter()
            && let Some(target) = pending
                .iter_mut()
                .find(|insert| filter.matches(&insert.values, values))
        {
            match condition.update_reducer() {
                Some(reducer) => {
                    let incoming = self
                        .schema()
                        .values_to_map(row)
                        .map_err(InternalError::from)?;
                    reducer.reduce(&mut target.values, &incoming);
                }
                None => {
                    for (attribute, value) in assignments(set_clauses, set)? {
                        target.values.insert(attribute.to_string(), value);
                    }
                }
            }
            debug!(index, pending = target.index, "record folded into pending insert");

            return Ok(Some(0));
        }

        let documents = self.matching(values, condition)?;
        if documents.is_empty() {
            let values = self
                .schema()
                .values_to_map(row)
                .map_err(InternalError::from)?;
            pending.push(PendingInsert { index, values });

            return Ok(None);
        }

        self.replace_all(documents, set_clauses, set).map(Some)
    }

    fn resolve_filter(
        &self,
        condition: &CompiledCondition,
        values: &Values,
    ) -> Result<String, InternalError> {
        let filter = resolve(condition, values)?;
        self.record_resolve(condition.placeholder_count());

        Ok(filter)
    }

    fn run_query(&self, text: &str) -> Result<Vec<Document>, InternalError> {
        debug!(table = %self.definition.id, query = %text, "issuing query");
        let documents = self.backend.query(&self.container, text)?;

        sink::record(MetricsEvent::RowsReturned {
            table: self.id(),
            rows: count(documents.len()),
        });

        Ok(documents)
    }

    fn matching(
        &self,
        values: &Values,
        condition: &CompiledCondition,
    ) -> Result<Vec<Document>, InternalError> {
        let filter = self.resolve_filter(condition, values)?;

        self.run_query(&query::find_query(self.id(), &filter))
    }

    fn delete_matching(
        &self,
        values: &Values,
        condition: &CompiledCondition,
    ) -> Result<usize, PartialFailure> {
        let documents = self.matching(values, condition)?;

        for (done, document) in documents.iter().enumerate() {
            self.delete_document(document)
                .map_err(|error| PartialFailure { done, error })?;
        }

        Ok(documents.len())
    }

    fn delete_document(&self, document: &Document) -> Result<(), InternalError> {
        let id = document.id().ok_or(BackendError::MissingId)?;
        self.backend.delete(&self.container, id)?;

        Ok(())
    }

    fn replace_all(
        &self,
        documents: Vec<Document>,
        set_clauses: &[SetClause],
        set: &Values,
    ) -> Result<usize, PartialFailure> {
        let assignments = assignments(set_clauses, set)?;
        let updated = documents.len();

        for (done, mut document) in documents.into_iter().enumerate() {
            for (attribute, value) in &assignments {
                document.set(attribute, value);
            }
            self.backend
                .replace(&self.container, document)
                .map_err(|error| PartialFailure {
                    done,
                    error: error.into(),
                })?;
        }

        Ok(updated)
    }

    fn create(&self, values: &Values) -> Result<(), InternalError> {
        let document = Document::from_values(values, || Ulid::new().to_string());
        self.backend.create(&self.container, document)?;

        Ok(())
    }

    fn fail_record(
        &self,
        kind: ExecKind,
        outcome: &mut BatchOutcome,
        index: usize,
        error: InternalError,
    ) {
        warn!(
            table = %self.definition.id,
            index,
            error = %error.display_with_class(),
            "record failed; continuing batch"
        );
        sink::record(MetricsEvent::RecordFailed {
            kind,
            table: self.id(),
        });

        outcome.failures.push(RecordFailure { index, error });
    }

    fn record_compile(&self, kind: CompileKind, text: &str) {
        debug!(table = %self.definition.id, ?kind, query = %text, "compiled");
        sink::record(MetricsEvent::Compile {
            kind,
            table: self.id(),
        });
    }

    fn record_resolve(&self, placeholders: usize) {
        sink::record(MetricsEvent::Resolve {
            table: self.id(),
            placeholders: count(placeholders),
        });
    }
}

// Evaluate every set clause against one record's set values.
fn assignments<'a>(
    set_clauses: &'a [SetClause],
    set: &Values,
) -> Result<Vec<(&'a str, Value)>, InternalError> {
    set_clauses
        .iter()
        .map(|clause| {
            let value = resolve_scalar(&clause.value, set)?;
            Ok((clause.attribute.as_str(), value))
        })
        .collect()
}

fn ensure_batch_len(what: &str, expected: usize, found: usize) -> Result<(), InternalError> {
    if expected == found {
        Ok(())
    } else {
        Err(InternalError::table_invariant(format!(
            "batch has {expected} records but {found} {what}"
        )))
    }
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}
