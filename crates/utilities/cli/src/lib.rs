//! Utilities shared by the katana binaries: tracing and prometheus setup, and process helpers.

#![doc(issue_tracker_base_url = "https://github.com/katana-network/katana-monitor/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod backtrace;

mod error;
pub use error::{PrometheusError, TracingError};

pub mod log;
pub use log::init_tracing_subscriber;

pub mod metrics_args;

mod prometheus;
pub use prometheus::init_prometheus_server;
