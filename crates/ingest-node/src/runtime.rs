//! # Node Runtime
//!
//! Owns the process lifecycle. Startup binds the port before it truncates
//! the log file.
//!
//! ## Shutdown Sequence
//!
//! 1. A client sends `terminate`, or Ctrl+C triggers the same handle
//! 2. The listener closes its socket and stops accepting
//! 3. Open sessions run until their clients leave (a second Ctrl+C abandons them)
//! 4. The reporter emits a final report and stops
//! 5. The log file is flushed

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::oneshot;
use tracing::{info, warn};

use ingest_core::{
    FileLogSink, IngestConfig, IngestService, Listener, LogSink, Reporter, SessionDrain,
    ShutdownHandle,
};

/// A configured, bound ingestion service ready to run.
pub struct IngestNode {
    config: IngestConfig,
    sink: Arc<FileLogSink>,
    service: Arc<IngestService>,
    listener: Listener,
}

impl IngestNode {
    /// Bind the listener, then create the log file.
    ///
    /// The port is claimed first so that a launch against a busy address
    /// fails before truncating the log file of the instance holding it.
    pub async fn new(config: IngestConfig) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let socket = Listener::bind_socket(&config)
            .await
            .context("Failed to start listener")?;

        let sink = Arc::new(
            FileLogSink::create(&config.log_path)
                .await
                .context("Failed to create log file")?,
        );
        let service = Arc::new(IngestService::new(sink.clone()));
        let listener = Listener::from_socket(socket, &config, Arc::clone(&service));

        Ok(Self {
            config,
            sink,
            service,
            listener,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Listener has no local address")
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.listener.shutdown_handle()
    }

    pub fn service(&self) -> &Arc<IngestService> {
        &self.service
    }

    /// Serve until shutdown, then wind down in order.
    pub async fn run(self) -> Result<()> {
        let Self {
            config,
            sink,
            service,
            listener,
        } = self;

        info!(
            addr = %config.listen_addr,
            log_path = %config.log_path.display(),
            max_clients = config.max_clients,
            "Ingest node running. Send `terminate` or press Ctrl+C to stop."
        );

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let reporter = Reporter::new(Arc::clone(service.counters()), config.report_interval());
        let reporter_task = tokio::spawn(reporter.run(async move {
            let _ = stop_rx.await;
        }));

        let shutdown = listener.shutdown_handle();
        let signal_task = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl+C received");
                shutdown.trigger();
            }
        });

        let drain = listener.run().await;
        signal_task.abort();

        wait_for_sessions(drain).await;

        let _ = stop_tx.send(());
        if let Err(e) = reporter_task.await {
            warn!(error = %e, "Reporter task failed");
        }

        sink.flush().await.context("Failed to flush log file")?;
        info!("Shutdown complete");

        Ok(())
    }
}

async fn wait_for_sessions(drain: SessionDrain) {
    if drain.in_flight() == 0 {
        return;
    }

    info!(
        in_flight = drain.in_flight(),
        "Waiting for open sessions to finish (Ctrl+C to abandon)"
    );

    tokio::select! {
        outcomes = drain.wait() => {
            info!(sessions = outcomes.len(), "Open sessions finished");
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Abandoning open sessions");
        }
    }
}
