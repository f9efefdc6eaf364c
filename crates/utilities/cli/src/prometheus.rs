//! Utilities for spinning up a prometheus metrics server.

use crate::PrometheusError;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{IpAddr, SocketAddr, TcpListener};
use tracing::info;

/// Installs the global prometheus recorder and serves it over http on `addr:port`.
///
/// Port `0` picks a free port. Returns the address the metrics are served at.
pub fn init_prometheus_server(addr: IpAddr, port: u16) -> Result<SocketAddr, PrometheusError> {
    let socket = if port == 0 {
        // Bind once to learn a free port, then release it for the exporter.
        let listener = TcpListener::bind((addr, 0))?;
        listener.local_addr()?
    } else {
        SocketAddr::from((addr, port))
    };

    PrometheusBuilder::new().with_http_listener(socket).install()?;

    info!(target: "prometheus", "Serving metrics at: http://{socket}");
    Ok(socket)
}
