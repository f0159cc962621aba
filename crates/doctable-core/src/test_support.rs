//! Scripted in-memory backend for table tests.

use crate::{
    schema::Values,
    table::{Backend, BackendError, Document},
    value::Value,
};
use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
};

///
/// ScriptedBackend
///
/// Answers queries from a text-keyed script and records every request.
/// Unscripted queries match nothing.
///

#[derive(Debug, Default)]
pub(crate) struct ScriptedBackend {
    responses: RefCell<BTreeMap<String, Vec<Document>>>,
    failing_queries: RefCell<BTreeSet<String>>,
    failing_deletes: RefCell<BTreeSet<String>>,
    failing_replaces: RefCell<BTreeSet<String>>,
    queries: RefCell<Vec<(String, String)>>,
    created: RefCell<Vec<Document>>,
    replaced: RefCell<Vec<Document>>,
    deleted: RefCell<Vec<String>>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(&self, query: &str, documents: Vec<Document>) {
        self.responses
            .borrow_mut()
            .insert(query.to_string(), documents);
    }

    pub(crate) fn fail_query(&self, query: &str) {
        self.failing_queries.borrow_mut().insert(query.to_string());
    }

    pub(crate) fn fail_delete(&self, id: &str) {
        self.failing_deletes.borrow_mut().insert(id.to_string());
    }

    pub(crate) fn fail_replace(&self, id: &str) {
        self.failing_replaces.borrow_mut().insert(id.to_string());
    }

    /// Issued query texts, in order.
    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries
            .borrow()
            .iter()
            .map(|(_, query)| query.clone())
            .collect()
    }

    /// Container links every query was issued against.
    pub(crate) fn containers(&self) -> Vec<String> {
        self.queries
            .borrow()
            .iter()
            .map(|(container, _)| container.clone())
            .collect()
    }

    pub(crate) fn created(&self) -> Vec<Document> {
        self.created.borrow().clone()
    }

    pub(crate) fn replaced(&self) -> Vec<Document> {
        self.replaced.borrow().clone()
    }

    pub(crate) fn deleted(&self) -> Vec<String> {
        self.deleted.borrow().clone()
    }
}

impl Backend for ScriptedBackend {
    fn query(&self, container: &str, query: &str) -> Result<Vec<Document>, BackendError> {
        self.queries
            .borrow_mut()
            .push((container.to_string(), query.to_string()));

        if self.failing_queries.borrow().contains(query) {
            return Err(BackendError::Unavailable {
                message: format!("scripted failure for '{query}'"),
            });
        }

        Ok(self
            .responses
            .borrow()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    fn create(&self, _container: &str, document: Document) -> Result<(), BackendError> {
        self.created.borrow_mut().push(document);

        Ok(())
    }

    fn replace(&self, _container: &str, document: Document) -> Result<(), BackendError> {
        let id = document.id().ok_or(BackendError::MissingId)?;
        if self.failing_replaces.borrow().contains(id) {
            return Err(BackendError::NotFound { id: id.to_string() });
        }
        self.replaced.borrow_mut().push(document);

        Ok(())
    }

    fn delete(&self, _container: &str, id: &str) -> Result<(), BackendError> {
        if self.failing_deletes.borrow().contains(id) {
            return Err(BackendError::NotFound { id: id.to_string() });
        }
        self.deleted.borrow_mut().push(id.to_string());

        Ok(())
    }
}

/// Stored document with the given id and attribute values.
pub(crate) fn document(id: &str, pairs: &[(&str, Value)]) -> Document {
    Document::from_values(&values(pairs), || id.to_string())
}

/// Runtime value map from name/value pairs.
pub(crate) fn values(pairs: &[(&str, Value)]) -> Values {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}
