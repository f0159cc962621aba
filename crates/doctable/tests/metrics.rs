mod common;

use common::MemoryBackend;
use doctable::{
    DocumentTable, StoreConfig, TableDefinition,
    core::obs::{MetricsEvent, MetricsSink, metrics_report, with_metrics_sink},
    prelude::*,
};
use std::{cell::RefCell, rc::Rc};

#[derive(Default)]
struct RecordingSink {
    events: RefCell<Vec<String>>,
}

impl MetricsSink for RecordingSink {
    fn record(&self, event: MetricsEvent<'_>) {
        let label = match event {
            MetricsEvent::Compile { .. } => "compile".to_string(),
            MetricsEvent::Resolve { placeholders, .. } => format!("resolve:{placeholders}"),
            MetricsEvent::ExecStart { kind, .. } => format!("start:{kind:?}"),
            MetricsEvent::ExecFinish {
                kind, rows_touched, ..
            } => format!("finish:{kind:?}:{rows_touched}"),
            MetricsEvent::RowsReturned { rows, .. } => format!("rows:{rows}"),
            MetricsEvent::RecordFailed { kind, .. } => format!("failed:{kind:?}"),
        };
        self.events.borrow_mut().push(label);
    }
}

fn table() -> DocumentTable<MemoryBackend> {
    let config = StoreConfig {
        uri: "https://localhost:8081".to_string(),
        access_key: "secret".to_string(),
        database: "market".to_string(),
        collection_name: None,
    };

    DocumentTable::new(
        TableDefinition::new(
            "StockTable",
            Schema::new(vec![Attribute::new("symbol", AttributeType::String)]),
        ),
        &config,
        MemoryBackend::default(),
    )
    .expect("table binds")
}

#[test]
fn scoped_sink_sees_operation_events_in_order() {
    let sink = Rc::new(RecordingSink::default());
    let table = table();

    with_metrics_sink(sink.clone(), || {
        let outcome = table.add(&[vec![Value::from("IBM")], vec![]]);
        assert_eq!(outcome.failed_indices(), [1]);

        let condition = table
            .compile_condition(&Expr::eq(
                Expr::table_attribute("symbol", AttributeType::String),
                Expr::attribute("symbol", AttributeType::String),
            ))
            .expect("condition compiles");
        let values = Values::from([("symbol".to_string(), Value::from("IBM"))]);
        let _ = table.find(&values, &condition).expect("find");
    });

    assert_eq!(
        *sink.events.borrow(),
        [
            "start:Add",
            "failed:Add",
            "finish:Add:1",
            "compile",
            "start:Find",
            "resolve:2",
            "rows:1",
            "finish:Find:0",
        ]
    );
}

#[test]
fn scoped_sink_keeps_events_out_of_global_counters() {
    let sink = Rc::new(RecordingSink::default());
    let table = table();
    let before = metrics_report(None)
        .counters
        .map_or(0, |counters| counters.ops.add_calls);

    with_metrics_sink(sink, || {
        let _ = table.add(&[vec![Value::from("IBM")]]);
    });

    let after = metrics_report(None)
        .counters
        .map_or(0, |counters| counters.ops.add_calls);
    assert_eq!(before, after);
}
