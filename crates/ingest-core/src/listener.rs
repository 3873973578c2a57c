//! # Listener
//!
//! Binds one TCP address and spawns a [`ConnectionSession`] per admitted
//! connection. Connections above the admission ceiling are closed on the
//! spot, before any byte is read.
//!
//! ## Shutdown
//!
//! A [`ShutdownHandle`] is shared with every session. When any session
//! receives `terminate` (or the process owner triggers the handle) the accept
//! loop stops and the socket is closed. Sessions already running are left
//! alone; [`Listener::run`] hands them back as a [`SessionDrain`].

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, info_span, warn, Instrument};

use crate::config::IngestConfig;
use crate::domain::{AdmissionGate, IngestError, SessionOutcome};
use crate::ports::IngestApi;
use crate::service::IngestService;
use crate::session::ConnectionSession;

/// Pause after a failed `accept`.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Cloneable one-way shutdown signal.
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once shutdown has been requested (immediately if it already was).
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }

    /// Sleep for `duration`, cut short by shutdown.
    ///
    /// Returns `true` if shutdown was requested before the time elapsed.
    pub async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.wait() => true,
            _ = tokio::time::sleep(duration) => false,
        }
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// TCP accept loop with admission control.
pub struct Listener {
    socket: TcpListener,
    service: Arc<IngestService>,
    gate: AdmissionGate,
    max_frame_bytes: usize,
    shutdown: ShutdownHandle,
}

impl Listener {
    /// Validate `config`, bind `config.listen_addr` and wire in `service`.
    pub async fn bind(
        config: &IngestConfig,
        service: Arc<IngestService>,
    ) -> Result<Self, IngestError> {
        let socket = Self::bind_socket(config).await?;
        Ok(Self::from_socket(socket, config, service))
    }

    /// Validate `config` and bind `config.listen_addr` without serving yet.
    ///
    /// Lets a caller claim the port before touching any other resource.
    pub async fn bind_socket(config: &IngestConfig) -> Result<TcpListener, IngestError> {
        config.validate()?;

        TcpListener::bind(&config.listen_addr)
            .await
            .map_err(|source| IngestError::Bind {
                addr: config.listen_addr.clone(),
                source,
            })
    }

    /// Serve `service` on an already bound socket.
    pub fn from_socket(
        socket: TcpListener,
        config: &IngestConfig,
        service: Arc<IngestService>,
    ) -> Self {
        let gate = AdmissionGate::new(Arc::clone(service.counters()), config.max_clients);

        info!(
            addr = %config.listen_addr,
            max_clients = config.max_clients,
            "Listening for connections"
        );

        Self {
            socket,
            service,
            gate,
            max_frame_bytes: config.max_frame_bytes,
            shutdown: ShutdownHandle::new(),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Accept connections until shutdown is requested.
    ///
    /// Returns once the socket is closed. Sessions still running are handed
    /// back in the drain.
    pub async fn run(self) -> SessionDrain {
        let mut sessions = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.wait() => break,

                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "Session task failed");
                    }
                }

                accepted = self.socket.accept() => match accepted {
                    Ok((stream, peer)) => self.dispatch(stream, peer, &mut sessions),
                    Err(e) => {
                        warn!(error = %e, "Failed to accept connection");
                        if self.shutdown.pause(ACCEPT_ERROR_BACKOFF).await {
                            break;
                        }
                    }
                },
            }
        }

        drop(self.socket);
        info!(
            in_flight = sessions.len(),
            "No longer accepting connections"
        );

        SessionDrain { sessions }
    }

    fn dispatch(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
        sessions: &mut JoinSet<SessionOutcome>,
    ) {
        let Some(permit) = self.gate.try_admit() else {
            warn!(
                peer = %peer,
                ceiling = self.gate.ceiling(),
                "Admission ceiling reached, closing connection"
            );
            drop(stream);
            return;
        };

        info!(peer = %peer, active = self.gate.active(), "Client admitted");

        let api: Arc<dyn IngestApi> = self.service.clone();
        let session = ConnectionSession::new(
            stream,
            api,
            self.shutdown.clone(),
            self.max_frame_bytes,
            permit,
        );
        sessions.spawn(session.run().instrument(info_span!("session", peer = %peer)));
    }
}

/// Sessions still running when the listener stopped.
///
/// Dropping the drain aborts them; their permits are released as they drop.
pub struct SessionDrain {
    sessions: JoinSet<SessionOutcome>,
}

impl SessionDrain {
    /// Number of sessions not yet reaped.
    pub fn in_flight(&self) -> usize {
        self.sessions.len()
    }

    /// Wait for every remaining session to end on its own.
    pub async fn wait(mut self) -> Vec<SessionOutcome> {
        let mut outcomes = Vec::with_capacity(self.sessions.len());
        while let Some(joined) = self.sessions.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!(error = %e, "Session task failed"),
            }
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Counter, SinkError};
    use crate::ports::LogSink;

    #[tokio::test]
    async fn test_shutdown_handle_trigger() {
        let handle = ShutdownHandle::new();
        assert!(!handle.is_triggered());

        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.wait().await })
        };

        handle.trigger();
        handle.trigger();
        waiter.await.unwrap();
        assert!(handle.is_triggered());
    }

    #[tokio::test]
    async fn test_wait_after_trigger_returns_immediately() {
        let handle = ShutdownHandle::new();
        handle.trigger();
        tokio::time::timeout(Duration::from_millis(100), handle.wait())
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_runs_full_duration_without_shutdown() {
        let handle = ShutdownHandle::new();
        let started = tokio::time::Instant::now();

        assert!(!handle.pause(ACCEPT_ERROR_BACKOFF).await);
        assert!(started.elapsed() >= ACCEPT_ERROR_BACKOFF);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_cut_short_by_shutdown() {
        let handle = ShutdownHandle::new();
        let started = tokio::time::Instant::now();

        let pausing = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.pause(Duration::from_secs(3600)).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        handle.trigger();

        assert!(pausing.await.unwrap());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    /// Sink whose appends panic, taking the session task down with them.
    struct PanickingSink;

    #[async_trait::async_trait]
    impl LogSink for PanickingSink {
        async fn append(&self, _record: &[u8]) -> Result<(), SinkError> {
            panic!("sink exploded");
        }
    }

    #[tokio::test]
    async fn test_panicked_session_is_reaped_and_listener_keeps_serving() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let config = IngestConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            ..Default::default()
        };
        let service = Arc::new(IngestService::new(Arc::new(PanickingSink)));
        let counters = Arc::clone(service.counters());
        let listener = Listener::bind(&config, service).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = listener.shutdown_handle();
        let task = tokio::spawn(listener.run());

        let mut doomed = TcpStream::connect(addr).await.unwrap();
        doomed.write_all(b"123456789\n").await.unwrap();
        let mut buf = [0u8; 1];
        let closed = tokio::time::timeout(Duration::from_secs(5), doomed.read(&mut buf))
            .await
            .expect("panicked session left the connection open");
        assert!(matches!(closed, Ok(0) | Err(_)));

        // The unwinding session still releases its slot.
        tokio::time::timeout(Duration::from_secs(5), async {
            while counters.snapshot(Counter::Clients) != 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        let _next = TcpStream::connect(addr).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while counters.snapshot(Counter::Clients) != 1 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("listener stopped admitting after a session panicked");

        shutdown.trigger();
        let drain = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        drop(drain);
    }

    #[tokio::test]
    async fn test_bind_rejects_invalid_config() {
        let config = IngestConfig {
            max_clients: 0,
            listen_addr: "127.0.0.1:0".to_string(),
            ..Default::default()
        };
        let service = Arc::new(IngestService::new(Arc::new(
            crate::adapters::InMemoryLogSink::new(),
        )));

        let err = Listener::bind(&config, service).await.err().unwrap();
        assert!(matches!(err, IngestError::Config(_)));
    }

    #[tokio::test]
    async fn test_bind_failure_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = IngestConfig {
            listen_addr: taken.local_addr().unwrap().to_string(),
            ..Default::default()
        };
        let service = Arc::new(IngestService::new(Arc::new(
            crate::adapters::InMemoryLogSink::new(),
        )));

        let err = Listener::bind(&config, service).await.err().unwrap();
        assert!(matches!(err, IngestError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let config = IngestConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            ..Default::default()
        };
        let service = Arc::new(IngestService::new(Arc::new(
            crate::adapters::InMemoryLogSink::new(),
        )));
        let listener = Listener::bind(&config, service).await.unwrap();
        let shutdown = listener.shutdown_handle();

        let task = tokio::spawn(listener.run());
        shutdown.trigger();

        let drain = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(drain.in_flight(), 0);
        assert!(drain.wait().await.is_empty());
    }
}
