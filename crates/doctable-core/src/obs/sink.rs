//! Metrics sink boundary.
//!
//! Table and compiler code never touch `obs::metrics` directly; all
//! instrumentation flows through `MetricsEvent` and `MetricsSink`.
use crate::obs::metrics::{self, TableCounters};
use std::{cell::RefCell, rc::Rc, time::Instant};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// ExecKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecKind {
    Add,
    Find,
    Contains,
    Delete,
    Update,
    UpdateOrAdd,
    Query,
}

///
/// CompileKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompileKind {
    Condition,
    Selection,
    SetAttribute,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent<'a> {
    Compile {
        kind: CompileKind,
        table: &'a str,
    },
    Resolve {
        table: &'a str,
        placeholders: u64,
    },
    ExecStart {
        kind: ExecKind,
        table: &'a str,
    },
    ExecFinish {
        kind: ExecKind,
        table: &'a str,
        rows_touched: u64,
        elapsed_micros: u64,
    },
    RowsReturned {
        table: &'a str,
        rows: u64,
    },
    RecordFailed {
        kind: ExecKind,
        table: &'a str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

///
/// GlobalMetricsSink
/// Default sink writing into the thread-local counters.
///

pub(crate) struct GlobalMetricsSink;

impl GlobalMetricsSink {
    fn table_entry<'m>(
        tables: &'m mut std::collections::BTreeMap<String, TableCounters>,
        table: &str,
    ) -> &'m mut TableCounters {
        tables.entry(table.to_string()).or_default()
    }
}

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::Compile { table, .. } => metrics::with_state_mut(|m| {
                m.ops.compiles = m.ops.compiles.saturating_add(1);
                let entry = Self::table_entry(&mut m.tables, table);
                entry.compiles = entry.compiles.saturating_add(1);
            }),

            MetricsEvent::Resolve {
                table,
                placeholders,
            } => metrics::with_state_mut(|m| {
                m.ops.resolutions = m.ops.resolutions.saturating_add(1);
                m.ops.placeholders_bound = m.ops.placeholders_bound.saturating_add(placeholders);
                let entry = Self::table_entry(&mut m.tables, table);
                entry.resolutions = entry.resolutions.saturating_add(1);
            }),

            MetricsEvent::ExecStart { kind, table } => metrics::with_state_mut(|m| {
                let calls = match kind {
                    ExecKind::Add => &mut m.ops.add_calls,
                    ExecKind::Find => &mut m.ops.find_calls,
                    ExecKind::Contains => &mut m.ops.contains_calls,
                    ExecKind::Delete => &mut m.ops.delete_calls,
                    ExecKind::Update => &mut m.ops.update_calls,
                    ExecKind::UpdateOrAdd => &mut m.ops.update_or_add_calls,
                    ExecKind::Query => &mut m.ops.query_calls,
                };
                *calls = calls.saturating_add(1);

                let entry = Self::table_entry(&mut m.tables, table);
                entry.exec_calls = entry.exec_calls.saturating_add(1);
                if kind == ExecKind::Find {
                    entry.find_calls = entry.find_calls.saturating_add(1);
                }
            }),

            MetricsEvent::ExecFinish {
                kind,
                table,
                rows_touched,
                elapsed_micros,
            } => metrics::with_state_mut(|m| {
                metrics::add_latency(&mut m.perf, elapsed_micros);

                let entry = Self::table_entry(&mut m.tables, table);
                match kind {
                    ExecKind::Add => {
                        m.ops.rows_added = m.ops.rows_added.saturating_add(rows_touched);
                        entry.rows_added = entry.rows_added.saturating_add(rows_touched);
                    }
                    ExecKind::Delete => {
                        m.ops.rows_deleted = m.ops.rows_deleted.saturating_add(rows_touched);
                        entry.rows_deleted = entry.rows_deleted.saturating_add(rows_touched);
                    }
                    ExecKind::Update | ExecKind::UpdateOrAdd => {
                        m.ops.rows_updated = m.ops.rows_updated.saturating_add(rows_touched);
                        entry.rows_updated = entry.rows_updated.saturating_add(rows_touched);
                    }
                    ExecKind::Find | ExecKind::Contains | ExecKind::Query => {}
                }
            }),

            MetricsEvent::RowsReturned { table, rows } => metrics::with_state_mut(|m| {
                m.ops.rows_returned = m.ops.rows_returned.saturating_add(rows);
                let entry = Self::table_entry(&mut m.tables, table);
                entry.rows_returned = entry.rows_returned.saturating_add(rows);
            }),

            MetricsEvent::RecordFailed { table, .. } => metrics::with_state_mut(|m| {
                m.ops.records_failed = m.ops.records_failed.saturating_add(1);
                let entry = Self::table_entry(&mut m.tables, table);
                entry.records_failed = entry.records_failed.saturating_add(1);
            }),
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    // Clone out of the slot so a sink may itself record without a double borrow.
    let installed = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match installed {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state.
///
/// `window_start_ms` filters by window start (`EventState::window_start_ms`),
/// not by per-event timestamps.
#[must_use]
pub fn metrics_report(window_start_ms: Option<u64>) -> metrics::EventReport {
    metrics::report_window_start(window_start_ms)
}

/// Reset all metrics state (counters + perf).
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with `sink` receiving every event recorded on this thread.
///
/// Overrides nest; the previous sink is restored on return and on unwind.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let previous = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = previous;
            });
        }
    }

    let previous = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(previous);

    f()
}

///
/// Span
/// RAII guard that emits start/finish events for one table operation.
/// Finish accounting happens even on unwind.
///

pub(crate) struct Span<'a> {
    kind: ExecKind,
    table: &'a str,
    start: Instant,
    rows: u64,
}

impl<'a> Span<'a> {
    #[must_use]
    pub(crate) fn new(kind: ExecKind, table: &'a str) -> Self {
        record(MetricsEvent::ExecStart { kind, table });

        Self {
            kind,
            table,
            start: Instant::now(),
            rows: 0,
        }
    }

    pub(crate) const fn set_rows(&mut self, rows: u64) {
        self.rows = rows;
    }
}

impl Drop for Span<'_> {
    fn drop(&mut self) {
        let elapsed_micros = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX);

        record(MetricsEvent::ExecFinish {
            kind: self.kind,
            table: self.table,
            rows_touched: self.rows,
            elapsed_micros,
        });
    }
}

///
/// TESTS
///
