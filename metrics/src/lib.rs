pub mod metrics;
pub use metrics::{metrics_summary, observe_error, MetricCollectionError};
pub mod rpc;

use metrics::REGISTRY;
