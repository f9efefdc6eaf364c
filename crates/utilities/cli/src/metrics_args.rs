//! Prometheus CLI arguments.

use crate::{PrometheusError, init_prometheus_server};
use clap::Args;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Configuration of the prometheus exporter.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct MetricsArgs {
    /// Address the metrics server listens on.
    #[arg(long = "metrics.addr", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED), env = "METRICS_ADDR")]
    pub addr: IpAddr,
    /// Port the metrics server listens on. `0` picks a free port.
    #[arg(long = "metrics.port", default_value_t = 9090, env = "METRICS_PORT")]
    pub port: u16,
}

impl Default for MetricsArgs {
    fn default() -> Self {
        Self { addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 9090 }
    }
}

impl MetricsArgs {
    /// Installs the prometheus recorder and starts serving it.
    pub fn init_metrics(&self) -> Result<SocketAddr, PrometheusError> {
        init_prometheus_server(self.addr, self.port)
    }
}
