//! In-memory document store understanding single-equality filters.
#![allow(dead_code)]

use doctable::{
    Backend,
    core::table::{BackendError, Document},
};
use serde_json::Value as JsonValue;
use std::{cell::RefCell, collections::BTreeMap};

#[derive(Debug, Default)]
pub struct MemoryBackend {
    containers: RefCell<BTreeMap<String, Vec<Document>>>,
}

impl MemoryBackend {
    pub fn documents(&self, container: &str) -> Vec<Document> {
        self.containers
            .borrow()
            .get(container)
            .cloned()
            .unwrap_or_default()
    }
}

impl Backend for MemoryBackend {
    fn query(&self, container: &str, query: &str) -> Result<Vec<Document>, BackendError> {
        let (head, filter) = match query.split_once(" WHERE ") {
            Some((head, filter)) => (head, Some(parse_equality(filter)?)),
            None => (query, None),
        };
        let limit = if head.starts_with("SELECT TOP 1 ") { 1 } else { usize::MAX };

        Ok(self
            .documents(container)
            .into_iter()
            .filter(|doc| {
                filter
                    .as_ref()
                    .is_none_or(|(field, expected)| doc.field(field) == Some(expected))
            })
            .take(limit)
            .collect())
    }

    fn create(&self, container: &str, document: Document) -> Result<(), BackendError> {
        let mut containers = self.containers.borrow_mut();
        let documents = containers.entry(container.to_string()).or_default();
        if documents.iter().any(|doc| doc.id() == document.id()) {
            return Err(BackendError::Conflict {
                id: document.id().unwrap_or_default().to_string(),
            });
        }
        documents.push(document);

        Ok(())
    }

    fn replace(&self, container: &str, document: Document) -> Result<(), BackendError> {
        let id = document.id().ok_or(BackendError::MissingId)?.to_string();
        let mut containers = self.containers.borrow_mut();
        let slot = containers
            .get_mut(container)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id() == Some(id.as_str())))
            .ok_or(BackendError::NotFound { id })?;
        *slot = document;

        Ok(())
    }

    fn delete(&self, container: &str, id: &str) -> Result<(), BackendError> {
        let mut containers = self.containers.borrow_mut();
        let documents = containers
            .get_mut(container)
            .ok_or_else(|| BackendError::NotFound { id: id.to_string() })?;
        let before = documents.len();
        documents.retain(|doc| doc.id() != Some(id));

        if documents.len() == before {
            return Err(BackendError::NotFound { id: id.to_string() });
        }

        Ok(())
    }
}

// `(<table>.<field> = <literal>)`
fn parse_equality(filter: &str) -> Result<(String, JsonValue), BackendError> {
    let rejected = || BackendError::Rejected {
        message: format!("unsupported filter '{filter}'"),
    };
    let inner = filter
        .strip_prefix('(')
        .and_then(|f| f.strip_suffix(')'))
        .ok_or_else(rejected)?;
    let (path, literal) = inner.split_once(" = ").ok_or_else(rejected)?;
    let field = path.rsplit('.').next().ok_or_else(rejected)?;

    let expected = match literal.strip_prefix('\'').and_then(|l| l.strip_suffix('\'')) {
        Some(text) => JsonValue::String(text.to_string()),
        None => serde_json::from_str(literal).map_err(|_| rejected())?,
    };

    Ok((field.to_string(), expected))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
