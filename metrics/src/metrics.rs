use std::fmt::{Display, Formatter};

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static ERROR_COUNTS: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("rpc_client_error_counts", "Failed calls by error kind and method"),
        &["kind", "method"],
    )
    .expect("rpc_client_error_counts metric can't be created");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("cannot register metric");
    counter
});

/// Counts a call that ended in an error of the given `kind`.
pub fn observe_error(kind: &str, method: &str) {
    ERROR_COUNTS.with_label_values(&[kind, method]).inc();
}

#[derive(Debug)]
pub struct MetricCollectionError {
    reason: String,
}

impl Display for MetricCollectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MetricCollectionError: {}", self.reason)
    }
}

impl std::error::Error for MetricCollectionError {}

impl MetricCollectionError {
    fn new(reason: String) -> Self {
        MetricCollectionError { reason }
    }
}

fn encode(families: &[prometheus::proto::MetricFamily]) -> Result<String, MetricCollectionError> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(families, &mut buffer)
        .map_err(|e| MetricCollectionError::new(format!("could not encode metrics: {e}")))?;
    String::from_utf8(buffer)
        .map_err(|e| MetricCollectionError::new(format!("metrics have a non-utf8 character: {e}")))
}

/// Renders the client's metrics followed by the process-wide default registry in the
/// Prometheus text exposition format.
pub fn metrics_summary() -> Result<String, MetricCollectionError> {
    let mut summary = encode(&REGISTRY.gather())?;
    summary.push_str(&encode(&prometheus::gather())?);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_should_be_labelled_by_kind_and_method() {
        observe_error("network_failure", "account_put_deploy");
        let summary = metrics_summary().unwrap_or_else(|err| panic!("{}", err));
        assert!(summary.contains(
            "rpc_client_error_counts{kind=\"network_failure\",method=\"account_put_deploy\"} 1"
        ));
    }
}
