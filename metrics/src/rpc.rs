use std::time::Duration;

use super::REGISTRY;
use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

const RESPONSE_TIME_MS_BUCKETS: &[f64; 10] = &[
    5_f64, 10_f64, 30_f64, 50_f64, 100_f64, 250_f64, 500_f64, 1000_f64, 5000_f64, 30000_f64,
];

static METHOD_CALLS: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("rpc_client_method_calls", "JSON-RPC calls issued, by method"),
        &["method"],
    )
    .expect("rpc_client_method_calls metric can't be created");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("cannot register metric");
    counter
});

static RESPONSE_TIMES_MS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts {
            common_opts: Opts::new(
                "rpc_client_response_times",
                "Time from issuing a call until its final outcome in milliseconds, retries included",
            ),
            buckets: Vec::from(RESPONSE_TIME_MS_BUCKETS as &'static [f64]),
        },
        &["method", "status"],
    )
    .expect("rpc_client_response_times metric can't be created");
    REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("cannot register metric");
    histogram
});

static RETRIES: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "rpc_client_retries",
            "Attempts re-sent after a transport failure, by method",
        ),
        &["method"],
    )
    .expect("rpc_client_retries metric can't be created");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("cannot register metric");
    counter
});

static TRANSPORT_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "rpc_client_transport_failures",
        "Individual attempts that failed before a JSON-RPC response was decoded",
    )
    .expect("rpc_client_transport_failures metric can't be created");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("cannot register metric");
    counter
});

pub fn inc_method_call(method: &str) {
    METHOD_CALLS.with_label_values(&[method]).inc();
}

pub fn observe_response_time(method: &str, status: &str, response_time: Duration) {
    let response_time = response_time.as_secs_f64() * 1000.0;
    RESPONSE_TIMES_MS
        .with_label_values(&[method, status])
        .observe(response_time);
}

pub fn inc_retry(method: &str) {
    RETRIES.with_label_values(&[method]).inc();
}

pub fn inc_transport_failure() {
    TRANSPORT_FAILURES.inc();
}
