use crate::{
    iter::{DocumentIterator, RecordIterator, rows},
    schema::{Attribute, Schema},
    table::Document,
    value::Value,
};
use doctable_primitives::AttributeType;
use serde_json::json;

fn schema() -> Schema {
    Schema::new(vec![
        Attribute::new("symbol", AttributeType::String),
        Attribute::new("volume", AttributeType::Long),
    ])
}

fn document(value: serde_json::Value) -> Document {
    match value {
        serde_json::Value::Object(fields) => Document::new(fields),
        other => panic!("test document must be an object, got {other}"),
    }
}

fn three_documents() -> Vec<Document> {
    vec![
        document(json!({ "id": "1", "symbol": "IBM", "volume": 100 })),
        document(json!({ "id": "2", "symbol": "WSO2", "volume": 20 })),
        document(json!({ "id": "3", "symbol": "ORCL" })),
    ]
}

#[test]
fn yields_rows_in_schema_order_then_terminal_empty_tuple() {
    let mut iter = DocumentIterator::new(three_documents(), schema());

    assert!(iter.has_next());
    assert_eq!(iter.next(), vec![Value::from("IBM"), Value::Long(100)]);
    assert!(iter.has_next());
    assert_eq!(iter.next(), vec![Value::from("WSO2"), Value::Long(20)]);
    assert!(iter.has_next());
    assert_eq!(iter.next(), vec![Value::from("ORCL"), Value::Null]);

    assert!(!iter.has_next());
    assert!(iter.next().is_empty());
    assert!(iter.next().is_empty());
}

#[test]
fn repeated_has_next_does_not_skip_records() {
    let mut iter = DocumentIterator::new(three_documents(), schema());

    assert!(iter.has_next());
    assert!(iter.has_next());
    assert_eq!(iter.next()[0], Value::from("IBM"));
}

#[test]
fn next_without_has_next_still_advances() {
    let mut iter = DocumentIterator::new(three_documents(), schema());

    assert_eq!(iter.next()[0], Value::from("IBM"));
    assert_eq!(iter.next()[0], Value::from("WSO2"));
}

#[test]
fn remove_is_ignored() {
    let mut iter = DocumentIterator::new(three_documents(), schema());

    iter.remove();
    assert_eq!(iter.next()[0], Value::from("IBM"));
    iter.remove();
    assert_eq!(iter.next()[0], Value::from("WSO2"));
}

#[test]
fn close_ends_iteration() {
    let mut iter = DocumentIterator::new(three_documents(), schema());
    assert!(iter.has_next());

    iter.close();

    assert!(!iter.has_next());
    assert!(iter.next().is_empty());
}

#[test]
fn empty_result_reports_no_rows() {
    let mut iter = DocumentIterator::new(Vec::new(), schema());

    assert!(!iter.has_next());
    assert!(iter.next().is_empty());
}

#[test]
fn rows_adapter_drains_all_records() {
    let iter = DocumentIterator::new(three_documents(), schema());
    let symbols: Vec<Value> = rows(iter).map(|row| row[0].clone()).collect();

    assert_eq!(
        symbols,
        [Value::from("IBM"), Value::from("WSO2"), Value::from("ORCL")]
    );
}
