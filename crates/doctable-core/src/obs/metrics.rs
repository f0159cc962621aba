use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    cmp::Ordering,
    collections::BTreeMap,
    time::{SystemTime, UNIX_EPOCH},
};

///
/// EventState
/// Ephemeral, in-memory counters and simple latency totals for table operations.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub perf: EventPerf,
    pub tables: BTreeMap<String, TableCounters>,
    pub window_start_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            perf: EventPerf::default(),
            tables: BTreeMap::new(),
            window_start_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Table entrypoints
    pub add_calls: u64,
    pub find_calls: u64,
    pub contains_calls: u64,
    pub delete_calls: u64,
    pub update_calls: u64,
    pub update_or_add_calls: u64,
    pub query_calls: u64,

    // Compiler / resolver
    pub compiles: u64,
    pub resolutions: u64,
    pub placeholders_bound: u64,

    // Rows touched
    pub rows_added: u64,
    pub rows_returned: u64,
    pub rows_deleted: u64,
    pub rows_updated: u64,

    // Per-record batch failures
    pub records_failed: u64,
}

///
/// TableCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TableCounters {
    pub exec_calls: u64,
    pub find_calls: u64,
    pub compiles: u64,
    pub resolutions: u64,
    pub rows_added: u64,
    pub rows_returned: u64,
    pub rows_deleted: u64,
    pub rows_updated: u64,
    pub records_failed: u64,
}

///
/// EventPerf
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventPerf {
    pub exec_micros_total: u128,
    pub exec_micros_max: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters and open a new window.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Accumulate a latency sample and track the max.
pub(crate) fn add_latency(perf: &mut EventPerf, micros: u64) {
    perf.exec_micros_total = perf.exec_micros_total.saturating_add(u128::from(micros));
    perf.exec_micros_max = perf.exec_micros_max.max(micros);
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}

///
/// EventReport
/// Counter report for one metrics window.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// Ephemeral runtime counters since `window_start_ms`.
    pub counters: Option<EventState>,
    /// Per-table counters and averages.
    pub table_counters: Vec<TableSummary>,
}

///
/// TableSummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TableSummary {
    pub table: String,
    pub exec_calls: u64,
    pub find_calls: u64,
    pub compiles: u64,
    pub resolutions: u64,
    pub rows_returned: u64,
    pub rows_deleted: u64,
    pub records_failed: u64,
    pub avg_rows_per_find: f64,
}

/// Build a report of the current window.
///
/// A `window_start_ms` later than the current window's start yields an
/// empty report.
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub(crate) fn report_window_start(window_start_ms: Option<u64>) -> EventReport {
    let snap = with_state(Clone::clone);
    if window_start_ms.is_some_and(|start| start > snap.window_start_ms) {
        return EventReport::default();
    }

    let mut table_counters: Vec<TableSummary> = snap
        .tables
        .iter()
        .map(|(table, ops)| TableSummary {
            table: table.clone(),
            exec_calls: ops.exec_calls,
            find_calls: ops.find_calls,
            compiles: ops.compiles,
            resolutions: ops.resolutions,
            rows_returned: ops.rows_returned,
            rows_deleted: ops.rows_deleted,
            records_failed: ops.records_failed,
            avg_rows_per_find: if ops.find_calls > 0 {
                ops.rows_returned as f64 / ops.find_calls as f64
            } else {
                0.0
            },
        })
        .collect();

    table_counters.sort_by(|a, b| {
        b.avg_rows_per_find
            .partial_cmp(&a.avg_rows_per_find)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.exec_calls.cmp(&a.exec_calls))
            .then_with(|| a.table.cmp(&b.table))
    });

    EventReport {
        counters: Some(snap),
        table_counters,
    }
}

///
/// TESTS
///
