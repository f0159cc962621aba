//! Observability: runtime counters and the sink that feeds them.
//!
//! Events are recorded per thread; reports cover the current window only.
pub(crate) mod metrics;
pub(crate) mod sink;

pub use metrics::{EventOps, EventPerf, EventReport, EventState, TableCounters, TableSummary};
pub use sink::{
    CompileKind, ExecKind, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all,
    with_metrics_sink,
};
