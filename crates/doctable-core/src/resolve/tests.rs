use crate::{
    compile::{ClauseKind, CompiledCondition, ConditionCompiler},
    expr::Expr,
    resolve::{BindError, resolve, resolve_scalar},
    schema::Values,
    value::Value,
};
use doctable_primitives::AttributeType;

const TABLE: &str = "StockTable";

fn compile(expr: &Expr) -> CompiledCondition {
    ConditionCompiler::new(TABLE, ClauseKind::Condition)
        .compile(expr)
        .expect("condition should compile")
}

fn values(pairs: &[(&str, Value)]) -> Values {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}

fn symbol_equals_stream_symbol() -> Expr {
    Expr::eq(
        Expr::table_attribute("symbol", AttributeType::String),
        Expr::attribute("symbol", AttributeType::String),
    )
}

#[test]
fn text_attribute_is_quoted() {
    let compiled = compile(&symbol_equals_stream_symbol());
    let text = resolve(&compiled, &values(&[("symbol", Value::from("IBM"))]))
        .expect("symbol is bound");

    assert_eq!(text, "(StockTable.symbol = 'IBM')");
}

#[test]
fn numeric_constant_is_unquoted() {
    let compiled = compile(&Expr::gt(
        Expr::table_attribute("volume", AttributeType::Long),
        Expr::constant(100_i64),
    ));

    assert_eq!(
        resolve(&compiled, &Values::new()).expect("no attribute references"),
        "(StockTable.volume > 100)"
    );
}

#[test]
fn substitution_follows_ordinal_order() {
    let compiled = compile(&Expr::and(
        Expr::eq(
            Expr::table_attribute("symbol", AttributeType::String),
            Expr::attribute("symbol", AttributeType::String),
        ),
        Expr::lt(
            Expr::table_attribute("price", AttributeType::Float),
            Expr::attribute("price", AttributeType::Float),
        ),
    ));
    let text = resolve(
        &compiled,
        &values(&[("symbol", Value::from("WSO2")), ("price", Value::Float(55.5))]),
    )
    .expect("both attributes are bound");

    assert_eq!(
        text,
        "((StockTable.symbol = 'WSO2') AND (StockTable.price < 55.5))"
    );
}

#[test]
fn question_mark_inside_literal_is_not_a_placeholder() {
    let compiled = compile(&Expr::and(
        Expr::eq(
            Expr::table_attribute("symbol", AttributeType::String),
            Expr::attribute("symbol", AttributeType::String),
        ),
        Expr::eq(
            Expr::table_attribute("volume", AttributeType::Long),
            Expr::attribute("volume", AttributeType::Long),
        ),
    ));
    let text = resolve(
        &compiled,
        &values(&[("symbol", Value::from("a?b")), ("volume", Value::Long(7))]),
    )
    .expect("both attributes are bound");

    assert_eq!(
        text,
        "((StockTable.symbol = 'a?b') AND (StockTable.volume = 7))"
    );
}

#[test]
fn always_true_resolves_to_empty_filter_without_values() {
    let compiled = compile(&Expr::always_true());

    assert!(compiled.is_always_true());
    assert_eq!(resolve(&compiled, &Values::new()).expect("sentinel"), "");
}

#[test]
fn missing_attribute_is_a_binding_error_and_artifact_stays_usable() {
    let compiled = compile(&symbol_equals_stream_symbol());
    let before = compiled.query_text();

    let err = resolve(&compiled, &Values::new()).expect_err("symbol is unbound");
    assert_eq!(
        err,
        BindError::MissingAttribute {
            name: "symbol".to_string()
        }
    );

    assert_eq!(compiled.query_text(), before);
    let text = resolve(&compiled, &values(&[("symbol", Value::from("IBM"))]))
        .expect("later invocation still binds");
    assert_eq!(text, "(StockTable.symbol = 'IBM')");
}

#[test]
fn null_runtime_value_renders_as_null() {
    let compiled = compile(&symbol_equals_stream_symbol());
    let text = resolve(&compiled, &values(&[("symbol", Value::Null)])).expect("bound to null");

    assert_eq!(text, "(StockTable.symbol = null)");
}

#[test]
fn contains_pattern_renders_as_text_literal() {
    let compiled = compile(&Expr::contains(
        Expr::table_attribute("symbol", AttributeType::String),
        Expr::attribute("code", AttributeType::Int),
    ));
    let text = resolve(&compiled, &values(&[("code", Value::Int(42))])).expect("code is bound");

    assert_eq!(text, "CONTAINS(StockTable.symbol, '42')");
}

#[test]
fn repeated_resolution_is_stable() {
    let compiled = compile(&symbol_equals_stream_symbol());
    let bound = values(&[("symbol", Value::from("IBM"))]);

    let first = resolve(&compiled, &bound).expect("bound");
    let second = resolve(&compiled, &bound).expect("bound");
    assert_eq!(first, second);
}

#[test]
fn resolve_scalar_reads_constants_and_attributes() {
    let compiler = ConditionCompiler::new(TABLE, ClauseKind::SetAttribute);
    let constant = compiler
        .compile(&Expr::constant(10.5_f64))
        .expect("constant set value");
    let attribute = compiler
        .compile(&Expr::attribute("price", AttributeType::Double))
        .expect("attribute set value");
    let bound = values(&[("price", Value::Double(99.0))]);

    assert_eq!(
        resolve_scalar(&constant, &bound).expect("constant"),
        Value::Double(10.5)
    );
    assert_eq!(
        resolve_scalar(&attribute, &bound).expect("attribute"),
        Value::Double(99.0)
    );
}

#[test]
fn resolve_scalar_rejects_compound_templates() {
    let compiled = compile(&symbol_equals_stream_symbol());

    assert_eq!(
        resolve_scalar(&compiled, &values(&[("symbol", Value::from("IBM"))])),
        Err(BindError::NotScalar)
    );
}
