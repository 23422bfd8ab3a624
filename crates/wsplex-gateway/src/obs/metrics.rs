//! Minimal metrics registry for consumers, streams and the transport.
//!
//! Counter/gauge/histogram families keyed by sorted label vectors in a
//! `DashMap`, rendered in Prometheus text format. Histogram buckets are fixed
//! in microseconds so observation stays integer-only.

use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use dashmap::DashMap;

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn render_labels(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| {
            let v = v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n");
            format!("{k}=\"{v}\"")
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Current value for an exact label set (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} counter");
        for r in self.map.iter() {
            let _ = writeln!(out, "{name}{{{}}} {}", render_labels(r.key()), r.value().load(Ordering::Relaxed));
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<LabelKey, AtomicI64>,
}

impl GaugeVec {
    pub fn inc(&self, labels: &[(&str, &str)]) { self.add(labels, 1); }
    pub fn dec(&self, labels: &[(&str, &str)]) { self.add(labels, -1); }

    fn add(&self, labels: &[(&str, &str)], v: i64) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicI64::new(0))
            .fetch_add(v, Ordering::Relaxed);
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} gauge");
        for r in self.map.iter() {
            let _ = writeln!(out, "{name}{{{}}} {}", render_labels(r.key()), r.value().load(Ordering::Relaxed));
        }
    }
}

// 100us .. 5s
const BUCKETS_MICROS: [u64; 8] = [100, 1_000, 10_000, 50_000, 100_000, 500_000, 1_000_000, 5_000_000];

#[derive(Default)]
struct Histogram {
    count: AtomicU64,
    sum_micros: AtomicU64,
    buckets: [AtomicU64; 8],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, Histogram>,
}

impl HistogramVec {
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self.map.entry(label_key(labels)).or_default();
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum_micros.fetch_add(micros, Ordering::Relaxed);
        for (bucket, le) in hist.buckets.iter().zip(BUCKETS_MICROS) {
            if micros <= le {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} histogram");
        for r in self.map.iter() {
            let labels = render_labels(r.key());
            let prefix = if labels.is_empty() { String::new() } else { format!("{labels},") };
            let hist = r.value();
            for (bucket, le) in hist.buckets.iter().zip(BUCKETS_MICROS) {
                let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"{le}\"}} {}", bucket.load(Ordering::Relaxed));
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"+Inf\"}} {count}");
            let _ = writeln!(out, "{name}_sum{{{labels}}} {}", hist.sum_micros.load(Ordering::Relaxed));
            let _ = writeln!(out, "{name}_count{{{labels}}} {count}");
        }
    }
}

#[derive(Default)]
pub struct GatewayMetrics {
    pub connections: CounterVec,
    pub connections_active: GaugeVec,
    pub consumer_errors: CounterVec,
    pub group_op_failures: CounterVec,
    pub streams_spawned: CounterVec,
    pub shutdown_timeouts: CounterVec,
    pub hook_duration: HistogramVec,
}

impl GatewayMetrics {
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.connections.render("wsplex_connections_total", &mut out);
        self.connections_active.render("wsplex_connections_active", &mut out);
        self.consumer_errors.render("wsplex_consumer_errors_total", &mut out);
        self.group_op_failures.render("wsplex_group_op_failures_total", &mut out);
        self.streams_spawned.render("wsplex_streams_spawned_total", &mut out);
        self.shutdown_timeouts.render("wsplex_shutdown_timeouts_total", &mut out);
        self.hook_duration.render("wsplex_hook_duration_micros", &mut out);
        out
    }
}

/// Process-wide registry.
pub fn global() -> &'static GatewayMetrics {
    static METRICS: OnceLock<GatewayMetrics> = OnceLock::new();
    METRICS.get_or_init(GatewayMetrics::default)
}
