// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reference check service speaking plain HTTP/1.1 over TCP.
//
// The service exposes a single endpoint, `POST /_api/check-hashes`, that
// accepts a JSON batch of `{fileName, fileHash}` submissions and answers
// with a JSON object keyed by document name.  One request per connection;
// every response carries `Connection: close`.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use siegel_core::config::DEFAULT_PORT;
use siegel_core::error::{Result, SiegelError};
use siegel_core::types::{CHECK_HASHES_PATH, ServerStatus};

use crate::service::VerificationService;
use crate::wire::CheckRequest;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Upper bound on a request head plus body.
const MAX_REQUEST_BYTES: usize = 4 * 1024 * 1024; // 4 MiB

// ---------------------------------------------------------------------------
// Request head parsing
// ---------------------------------------------------------------------------

/// Result of parsing the head of an HTTP/1.1 request.
struct RequestHead {
    method: String,
    /// Request path with any query string stripped.
    path: String,
    /// Declared body length; zero when the header is absent.
    content_length: usize,
    /// Offset where the body begins.
    body_offset: usize,
}

/// Parse the bare minimum of an HTTP/1.1 request head.
///
/// Returns `None` until the terminating double CRLF has arrived.
fn parse_request_head(data: &[u8]) -> Option<RequestHead> {
    let header_end = find_subsequence(data, b"\r\n\r\n")?;
    let body_offset = header_end + 4;

    let head = String::from_utf8_lossy(&data[..header_end]);
    let request_line = head.lines().next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_owned();
    let target = parts.next()?;
    let path = target.split('?').next().unwrap_or(target).to_owned();

    let content_length = head
        .lines()
        .find(|line| line.to_ascii_lowercase().starts_with("content-length:"))
        .and_then(|line| line.split(':').nth(1))
        .and_then(|val| val.trim().parse::<usize>().ok())
        .unwrap_or(0);

    Some(RequestHead {
        method,
        path,
        content_length,
        body_offset,
    })
}

/// Find the first occurrence of `needle` in `haystack`.
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

// ---------------------------------------------------------------------------
// CheckServer
// ---------------------------------------------------------------------------

/// Embedded check service.
///
/// Binds a TCP listener and answers hash-check requests from verification
/// clients on the network.
pub struct CheckServer {
    /// The TCP port to listen on.  Zero asks the OS for a free port.
    port: u16,
    /// Current lifecycle state of the server.
    status: ServerStatus,
    /// Notification handle used to signal a graceful shutdown.
    shutdown_signal: Arc<Notify>,
    /// Handle to the Tokio task running the accept loop.
    task_handle: Option<JoinHandle<()>>,
    /// Address actually bound, known once the server has started.
    local_addr: Option<SocketAddr>,
}

impl CheckServer {
    /// Create a new server bound to the given port.
    ///
    /// The server is created in `Stopped` state.  Call [`Self::start`] to
    /// begin accepting connections.
    pub fn new(port: Option<u16>) -> Self {
        Self {
            port: port.unwrap_or(DEFAULT_PORT),
            status: ServerStatus::Stopped,
            shutdown_signal: Arc::new(Notify::new()),
            task_handle: None,
            local_addr: None,
        }
    }

    /// Return the port this server is bound to (or will bind to).
    pub fn port(&self) -> u16 {
        self.local_addr.map(|addr| addr.port()).unwrap_or(self.port)
    }

    /// Return the bound address once the server has started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Return the current server status.
    pub fn status(&self) -> ServerStatus {
        self.status
    }

    /// Start the check service.
    ///
    /// Binds a TCP listener on `0.0.0.0:{port}` and spawns a Tokio task that
    /// accepts incoming connections; each connection is handled in its own
    /// spawned task.  The `service` resolves submitted hashes against the
    /// record store.
    ///
    /// # Errors
    ///
    /// Returns an error if the port is already in use or the listener cannot
    /// be created.
    pub async fn start(&mut self, service: Arc<Mutex<VerificationService>>) -> Result<()> {
        if self.status == ServerStatus::Running {
            debug!(port = self.port, "check service already running");
            return Ok(());
        }

        self.status = ServerStatus::Starting;

        let bind_addr: SocketAddr = ([0, 0, 0, 0], self.port).into();
        let listener = match TcpListener::bind(bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                self.status = ServerStatus::Error;
                return Err(SiegelError::Server(format!("bind {bind_addr}: {e}")));
            }
        };
        let local_addr = listener
            .local_addr()
            .map_err(|e| SiegelError::Server(format!("local addr: {e}")))?;
        self.local_addr = Some(local_addr);

        info!(addr = %local_addr, "check service listening");

        let shutdown = Arc::clone(&self.shutdown_signal);
        let port = local_addr.port();

        let handle = tokio::spawn(async move {
            Self::accept_loop(listener, shutdown, port, service).await;
        });

        self.task_handle = Some(handle);
        self.status = ServerStatus::Running;
        Ok(())
    }

    /// Gracefully stop the service.
    ///
    /// Signals the accept loop to exit and awaits its completion.  Existing
    /// connections that are mid-exchange are allowed to finish.
    pub async fn stop(&mut self) -> Result<()> {
        if self.status != ServerStatus::Running {
            return Ok(());
        }

        info!(port = self.port(), "stopping check service");

        self.shutdown_signal.notify_one();

        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| SiegelError::Server(format!("task join: {e}")))?;
        }

        self.status = ServerStatus::Stopped;
        info!(port = self.port(), "check service stopped");
        Ok(())
    }

    /// The main accept loop.
    ///
    /// Runs until the shutdown signal is received.  Each incoming connection
    /// is handed off to [`Self::handle_connection`] in a separate task.
    async fn accept_loop(
        listener: TcpListener,
        shutdown: Arc<Notify>,
        port: u16,
        service: Arc<Mutex<VerificationService>>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    debug!(port, "accept loop received shutdown signal");
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            debug!(peer = %peer_addr, "incoming check connection");
                            let service = Arc::clone(&service);
                            tokio::spawn(async move {
                                if let Err(e) =
                                    Self::handle_connection(stream, peer_addr, service).await
                                {
                                    warn!(peer = %peer_addr, error = %e, "connection handler error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }
            }
        }
    }

    /// Handle a single incoming TCP connection.
    ///
    /// Reads one request (the head, then exactly `Content-Length` body
    /// bytes), dispatches it, writes the response, and closes.  Reading to
    /// end of stream would hang clients that keep the connection open while
    /// waiting for the reply.
    async fn handle_connection(
        mut stream: tokio::net::TcpStream,
        peer_addr: SocketAddr,
        service: Arc<Mutex<VerificationService>>,
    ) -> Result<()> {
        let mut buf: Vec<u8> = Vec::with_capacity(8192);

        // Read until the full request head has arrived.
        let head = loop {
            if let Some(head) = parse_request_head(&buf) {
                break head;
            }
            if buf.len() > MAX_REQUEST_BYTES {
                send_response(&mut stream, "413 Payload Too Large", b"{}").await?;
                return Ok(());
            }
            let mut chunk = [0u8; 8192];
            let n = stream
                .read(&mut chunk)
                .await
                .map_err(|e| SiegelError::Server(format!("read from {peer_addr}: {e}")))?;
            if n == 0 {
                if buf.is_empty() {
                    debug!(peer = %peer_addr, "empty request; closing connection");
                } else {
                    warn!(peer = %peer_addr, "connection closed mid-request");
                }
                return Ok(());
            }
            buf.extend_from_slice(&chunk[..n]);
        };

        debug!(
            peer = %peer_addr,
            method = %head.method,
            path = %head.path,
            content_length = head.content_length,
            "parsed request head"
        );

        if head.method != "POST" {
            send_response(&mut stream, "405 Method Not Allowed", b"{}").await?;
            return Ok(());
        }
        if head.path != CHECK_HASHES_PATH {
            send_response(&mut stream, "404 Not Found", b"{}").await?;
            return Ok(());
        }
        if head.content_length > MAX_REQUEST_BYTES {
            send_response(&mut stream, "413 Payload Too Large", b"{}").await?;
            return Ok(());
        }

        // Read the remainder of the body.
        let body_end = head.body_offset + head.content_length;
        while buf.len() < body_end {
            let mut chunk = [0u8; 8192];
            let n = stream
                .read(&mut chunk)
                .await
                .map_err(|e| SiegelError::Server(format!("read from {peer_addr}: {e}")))?;
            if n == 0 {
                warn!(peer = %peer_addr, "connection closed mid-body");
                return Ok(());
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = &buf[head.body_offset..body_end];

        let (status, response_body) = dispatch_check(body, &service);
        send_response(&mut stream, status, &response_body).await?;

        info!(
            peer = %peer_addr,
            status,
            response_bytes = response_body.len(),
            "check response sent"
        );

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Request dispatch
// ---------------------------------------------------------------------------

/// Resolve a request body into a status line and JSON response body.
///
/// Synchronous: the service lock is taken and released here, never held
/// across the response write.
fn dispatch_check(
    body: &[u8],
    service: &Mutex<VerificationService>,
) -> (&'static str, Vec<u8>) {
    let request: CheckRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "malformed check request");
            return ("400 Bad Request", b"{}".to_vec());
        }
    };
    let submissions = request.into_submissions();

    match service.lock() {
        Ok(service) => match service.check_batch(&submissions) {
            Ok(response) => match serde_json::to_vec(&response) {
                Ok(body) => {
                    debug!(submissions = submissions.len(), "check batch resolved");
                    ("200 OK", body)
                }
                Err(e) => {
                    error!(error = %e, "failed to serialize check response");
                    ("500 Internal Server Error", b"{}".to_vec())
                }
            },
            Err(e) => {
                error!(error = %e, "check batch failed");
                ("500 Internal Server Error", b"{}".to_vec())
            }
        },
        Err(_) => {
            error!("verification service mutex poisoned");
            ("500 Internal Server Error", b"{}".to_vec())
        }
    }
}

// ---------------------------------------------------------------------------
// Response writing
// ---------------------------------------------------------------------------

/// Write a minimal HTTP/1.1 response and flush it.
async fn send_response(
    stream: &mut tokio::net::TcpStream,
    status: &str,
    body: &[u8],
) -> Result<()> {
    let head = format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        body.len()
    );

    stream
        .write_all(head.as_bytes())
        .await
        .map_err(|e| SiegelError::Server(format!("write response head: {e}")))?;

    stream
        .write_all(body)
        .await
        .map_err(|e| SiegelError::Server(format!("write response body: {e}")))?;

    stream
        .flush()
        .await
        .map_err(|e| SiegelError::Server(format!("flush: {e}")))?;

    Ok(())
}
