mod common;

use common::{MemoryBackend, init_tracing};
use doctable::{DocumentTable, StoreConfig, TableDefinition, prelude::*};
use serde_json::json;

const CONFIG: &str = r#"
[store]
uri = "https://localhost:8081"
access_key = "secret"
database = "market"
collection_name = "stock_quotes"
"#;

fn stock_table() -> DocumentTable<MemoryBackend> {
    init_tracing();

    let config = StoreConfig::from_toml_str(CONFIG).expect("valid config");
    let schema = Schema::new(vec![
        Attribute::new("symbol", AttributeType::String),
        Attribute::new("price", AttributeType::Float),
        Attribute::new("volume", AttributeType::Long),
    ]);

    DocumentTable::new(
        TableDefinition::new("StockTable", schema),
        &config,
        MemoryBackend::default(),
    )
    .expect("table binds")
}

fn seed(table: &DocumentTable<MemoryBackend>) {
    let outcome = table.add(&[
        vec![Value::from("IBM"), Value::Float(75.5), Value::Long(100)],
        vec![Value::from("WSO2"), Value::Float(57.5), Value::Long(20)],
        vec![Value::from("IBM"), Value::Float(76.0), Value::Long(40)],
    ]);
    assert!(outcome.is_complete());
}

fn by_symbol(table: &DocumentTable<MemoryBackend>) -> CompiledCondition {
    table
        .compile_condition(&Expr::eq(
            Expr::table_attribute("symbol", AttributeType::String),
            Expr::attribute("symbol", AttributeType::String),
        ))
        .expect("condition compiles")
}

fn symbol(name: &str) -> Values {
    Values::from([("symbol".to_string(), Value::from(name))])
}

#[test]
fn rows_written_by_add_are_found_by_condition() {
    let table = stock_table();
    seed(&table);

    let iter = table
        .find(&symbol("IBM"), &by_symbol(&table))
        .expect("find");
    let found: Vec<Row> = rows(iter).collect();

    assert_eq!(
        found,
        [
            vec![Value::from("IBM"), Value::Float(75.5), Value::Long(100)],
            vec![Value::from("IBM"), Value::Float(76.0), Value::Long(40)],
        ]
    );
}

#[test]
fn documents_land_in_the_configured_collection() {
    let table = stock_table();
    seed(&table);

    assert_eq!(table.container(), "/dbs/market/colls/stock_quotes");
    assert_eq!(table.backend().documents(table.container()).len(), 3);
}

#[test]
fn delete_then_contains_reports_absence() {
    let table = stock_table();
    seed(&table);
    let condition = by_symbol(&table);

    assert!(table.contains(&symbol("IBM"), &condition).expect("contains"));

    let outcome = table.delete(&[symbol("IBM")], &condition);
    assert_eq!(outcome.processed, 1);
    assert_eq!(outcome.affected, 2);

    assert!(!table.contains(&symbol("IBM"), &condition).expect("contains"));
    assert!(table.contains(&symbol("WSO2"), &condition).expect("contains"));
}

#[test]
fn update_rewrites_matching_documents_only() {
    let table = stock_table();
    seed(&table);
    let condition = by_symbol(&table);
    let set_price = table
        .compile_set_attribute("price", &Expr::attribute("newPrice", AttributeType::Float))
        .expect("set clause compiles");

    let outcome = table
        .update(
            &condition,
            &[symbol("WSO2")],
            &[set_price],
            &[Values::from([("newPrice".to_string(), Value::Float(60.0))])],
        )
        .expect("batch lengths match");
    assert_eq!(outcome.affected, 1);

    let wso2: Vec<Row> = rows(table.find(&symbol("WSO2"), &condition).expect("find")).collect();
    assert_eq!(wso2[0][1], Value::Float(60.0));

    let stored = table.backend().documents(table.container());
    assert!(
        stored
            .iter()
            .filter(|doc| doc.field("symbol") == Some(&json!("IBM")))
            .all(|doc| doc.field("price") != Some(&json!(60.0)))
    );
}

#[test]
fn update_or_add_inserts_missing_records() {
    let table = stock_table();
    seed(&table);
    let condition = by_symbol(&table);
    let set_volume = table
        .compile_set_attribute("volume", &Expr::attribute("volume", AttributeType::Long))
        .expect("set clause compiles");

    let outcome = table
        .update_or_add(
            &condition,
            &[symbol("WSO2"), symbol("ORCL")],
            &[set_volume],
            &[
                Values::from([("volume".to_string(), Value::Long(1))]),
                Values::from([("volume".to_string(), Value::Long(2))]),
            ],
            &[
                vec![Value::from("WSO2"), Value::Float(1.0), Value::Long(1)],
                vec![Value::from("ORCL"), Value::Float(9.5), Value::Long(2)],
            ],
        )
        .expect("batch lengths match");

    assert!(outcome.is_complete());
    assert_eq!(outcome.processed, 2);
    assert!(table.contains(&symbol("ORCL"), &condition).expect("contains"));
    assert_eq!(table.backend().documents(table.container()).len(), 4);
}

#[test]
fn unsupported_expression_fails_at_compile_time() {
    let table = stock_table();

    let err = table
        .compile_condition(&Expr::in_table(
            Expr::attribute("symbol", AttributeType::String),
            "Watchlist",
        ))
        .expect_err("in is unsupported");

    assert!(err.is_compile());
}

#[test]
fn version_is_exported() {
    assert!(!doctable::VERSION.is_empty());
}
