//! Prometheus metrics for GroupDesk.
//!
//! Covers the group-trade fan-out, commission tracking and the
//! fire-and-forget notification path, so side effects that are swallowed
//! for the caller still show up somewhere.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, which should crash at startup. These panics
//! only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, register_int_gauge, Counter,
    CounterVec, Encoder, HistogramVec, IntGauge, TextEncoder,
};

use crate::error::TelemetryResult;

/// Group trades by outcome.
/// Labels: outcome (all_filled/partial/all_failed/rejected)
pub static GROUP_TRADES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "groupdesk_group_trades_total",
        "Group trades by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Per-client order submissions within group trades.
/// Labels: result (success/failure/timeout)
pub static CLIENT_ORDERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "groupdesk_client_orders_total",
        "Per-client order submissions",
        &["result"]
    )
    .unwrap()
});

/// Wall time of a full fan-out in milliseconds.
pub static GROUP_TRADE_DURATION_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "groupdesk_group_trade_duration_ms",
        "Group trade fan-out duration in milliseconds",
        &["order_type"],
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

/// Commission entries written.
pub static COMMISSIONS_RECORDED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "groupdesk_commissions_recorded_total",
        "Commission entries recorded"
    )
    .unwrap()
});

/// Commission jobs that produced no entry.
/// Labels: reason (order_not_found/advisor_not_found/store_error/queue_full)
pub static COMMISSIONS_SKIPPED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "groupdesk_commissions_skipped_total",
        "Commission jobs that produced no entry",
        &["reason"]
    )
    .unwrap()
});

/// Notifications by kind and delivery result.
/// Labels: kind, result (delivered/failed/dropped)
pub static NOTIFICATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "groupdesk_notifications_total",
        "Notifications by kind and delivery result",
        &["kind", "result"]
    )
    .unwrap()
});

/// Advisors registered since start.
pub static ADVISORS_REGISTERED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "groupdesk_advisors_registered_total",
        "Advisors registered"
    )
    .unwrap()
});

/// Active client links (moves with link/unlink).
pub static ACTIVE_LINKS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("groupdesk_active_links", "Active client links").unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a finished group trade.
    pub fn group_trade_completed(
        order_type: &str,
        success_count: usize,
        total_count: usize,
        elapsed_ms: f64,
    ) {
        let outcome = if success_count == total_count {
            "all_filled"
        } else if success_count == 0 {
            "all_failed"
        } else {
            "partial"
        };
        GROUP_TRADES_TOTAL.with_label_values(&[outcome]).inc();
        GROUP_TRADE_DURATION_MS
            .with_label_values(&[order_type])
            .observe(elapsed_ms);
    }

    /// Record a group trade rejected before fan-out.
    pub fn group_trade_rejected() {
        GROUP_TRADES_TOTAL.with_label_values(&["rejected"]).inc();
    }

    /// Record one client's submission result.
    pub fn client_order(result: &str) {
        CLIENT_ORDERS_TOTAL.with_label_values(&[result]).inc();
    }

    pub fn commission_recorded() {
        COMMISSIONS_RECORDED_TOTAL.inc();
    }

    pub fn commission_skipped(reason: &str) {
        COMMISSIONS_SKIPPED_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn notification(kind: &str, result: &str) {
        NOTIFICATIONS_TOTAL.with_label_values(&[kind, result]).inc();
    }

    pub fn advisor_registered() {
        ADVISORS_REGISTERED_TOTAL.inc();
    }

    pub fn link_opened() {
        ACTIVE_LINKS.inc();
    }

    pub fn link_closed() {
        ACTIVE_LINKS.dec();
    }
}

/// Render every registered metric in the Prometheus text format.
pub fn gather_text() -> TelemetryResult<String> {
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buf)?;
    String::from_utf8(buf).map_err(|e| crate::error::TelemetryError::Metrics(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_trade_outcome_labels() {
        let before = GROUP_TRADES_TOTAL.with_label_values(&["partial"]).get();
        Metrics::group_trade_completed("market", 2, 3, 12.0);
        let after = GROUP_TRADES_TOTAL.with_label_values(&["partial"]).get();
        assert!(after >= before + 1.0);
    }

    #[test]
    fn test_gather_text_contains_registered_metrics() {
        Metrics::commission_skipped("order_not_found");
        let text = gather_text().unwrap();
        assert!(text.contains("groupdesk_commissions_skipped_total"));
    }
}
