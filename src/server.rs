//! Single-client change feed server.
//!
//! Everything runs on one task: the listener, the attached client socket and the
//! sampling timer are multiplexed with `tokio::select!`. While no client is
//! attached the server only waits for connections and no sampling happens.
//!
//! While a client is attached every wake-up runs exactly one sampling cycle and
//! writes its frame, whatever caused it: the timer, a rejected second client, a
//! failed accept or input from the attached client. A hang-up ends the session and disarms the
//! timer with it.

use std::io::{self, ErrorKind};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::time::{interval_at, sleep, timeout, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::cycle::SamplingCycle;
use crate::feed_stats::FeedStats;
use crate::process::ProcessSource;
use crate::report::render_frame;

/// Pending connections the kernel queues while a client is attached.
pub const LISTEN_BACKLOG: u32 = 8;

/// Client input kept while waiting for a line terminator.
pub const MAX_PENDING_INPUT: usize = 1024;

/// Client line that requests a full resynchronization.
pub const SYNC_REQUEST: &str = "sync";

/// Pause after a failed accept so a persistent error (e.g. EMFILE) does not spin.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("Failed to listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Opens the listening socket with address reuse enabled.
pub fn bind(bind: &str, port: u16) -> Result<TcpListener, ServerError> {
    let ip: IpAddr = bind
        .parse()
        .map_err(|_| ServerError::InvalidBindAddress(bind.to_string()))?;
    let addr = SocketAddr::new(ip, port);

    let listen = || -> io::Result<TcpListener> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        socket.listen(LISTEN_BACKLOG)
    };

    listen().map_err(|source| ServerError::Bind { addr, source })
}

/// Timing and session behaviour of the server.
#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    pub interval: Duration,
    pub write_timeout: Duration,
    pub resync_on_connect: bool,
}

impl ServerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.interval(),
            write_timeout: config.write_timeout(),
            resync_on_connect: config.resync_on_connect(),
        }
    }
}

/// The attached client.
struct Session {
    stream: TcpStream,
    peer: SocketAddr,
    ticker: Interval,
    started: Instant,
    resync_pending: bool,
    inbox: Vec<u8>,
}

enum Wake {
    Accepted(io::Result<(TcpStream, SocketAddr)>),
    Tick,
    Readable(io::Result<()>),
}

pub struct FeedServer<S> {
    listener: TcpListener,
    cycle: SamplingCycle<S>,
    options: ServerOptions,
    stats: Arc<FeedStats>,
    session: Option<Session>,
}

impl<S: ProcessSource> FeedServer<S> {
    pub fn new(listener: TcpListener, source: S, options: ServerOptions) -> Self {
        Self {
            listener,
            cycle: SamplingCycle::new(source),
            options,
            stats: Arc::new(FeedStats::new()),
            session: None,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn stats(&self) -> Arc<FeedStats> {
        Arc::clone(&self.stats)
    }

    /// Serves clients until the future is dropped.
    pub async fn run(mut self) {
        loop {
            let wake = match self.session.as_mut() {
                None => Wake::Accepted(self.listener.accept().await),
                Some(session) => tokio::select! {
                    accepted = self.listener.accept() => Wake::Accepted(accepted),
                    _ = session.ticker.tick() => Wake::Tick,
                    ready = session.stream.readable() => Wake::Readable(ready),
                },
            };

            match wake {
                Wake::Accepted(Ok((stream, peer))) => {
                    if self.session.is_some() {
                        self.reject(stream, peer);
                        self.run_cycle().await;
                    } else {
                        self.adopt(stream, peer);
                    }
                }
                Wake::Accepted(Err(e)) => self.accept_failed(e).await,
                Wake::Tick => self.run_cycle().await,
                Wake::Readable(Ok(())) => self.read_client().await,
                Wake::Readable(Err(e)) => self.end_session(&format!("socket error: {}", e)),
            }
        }
    }

    fn adopt(&mut self, stream: TcpStream, peer: SocketAddr) {
        let period = self.options.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.stats.record_session_accepted();
        info!(
            "Client {} attached, sampling every {}ms",
            peer,
            period.as_millis()
        );

        self.session = Some(Session {
            stream,
            peer,
            ticker,
            started: Instant::now(),
            resync_pending: self.options.resync_on_connect,
            inbox: Vec::new(),
        });
    }

    fn reject(&self, stream: TcpStream, peer: SocketAddr) {
        self.stats.record_connection_rejected();
        warn!("Rejecting client {}: another client is attached", peer);
        drop(stream);
    }

    async fn accept_failed(&mut self, e: io::Error) {
        warn!("accept failed: {}", e);
        self.run_cycle().await;
        sleep(ACCEPT_BACKOFF).await;
    }

    async fn read_client(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let mut buf = [0u8; MAX_PENDING_INPUT];
        match session.stream.try_read(&mut buf) {
            Ok(0) => self.end_session("client hung up"),
            Ok(n) => {
                session.inbox.extend_from_slice(&buf[..n]);
                if scan_client_input(&mut session.inbox) {
                    debug!("Client {} requested a resync", session.peer);
                    session.resync_pending = true;
                }
                self.run_cycle().await;
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => self.end_session(&format!("read failed: {}", e)),
        }
    }

    /// Runs one cycle and sends its frame to the attached client.
    async fn run_cycle(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let resync = std::mem::take(&mut session.resync_pending);
        let outcome = self.cycle.run(resync);
        self.stats.record_cycle(&outcome);

        let frame = render_frame(&outcome.reports);
        let failure = match timeout(
            self.options.write_timeout,
            session.stream.write_all(frame.as_bytes()),
        )
        .await
        {
            Ok(Ok(())) => {
                self.stats.record_bytes_written(frame.len());
                None
            }
            Ok(Err(e)) => Some(format!("write failed: {}", e)),
            Err(_) => Some(format!(
                "write timed out after {}ms",
                self.options.write_timeout.as_millis()
            )),
        };

        if let Some(reason) = failure {
            self.stats.record_write_failure();
            self.end_session(&reason);
        }
    }

    fn end_session(&mut self, reason: &str) {
        if let Some(session) = self.session.take() {
            info!(
                "Client {} detached after {:.1}s: {}",
                session.peer,
                session.started.elapsed().as_secs_f64(),
                reason
            );
            info!("Feed statistics:\n{}", self.stats.render_table());
        }
    }
}

/// Consumes complete lines from `inbox` and reports whether any of them was a
/// resync request. An unterminated remainder longer than [`MAX_PENDING_INPUT`]
/// is discarded.
pub fn scan_client_input(inbox: &mut Vec<u8>) -> bool {
    let mut requested = false;
    while let Some(pos) = inbox.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = inbox.drain(..=pos).collect();
        if String::from_utf8_lossy(&line)
            .trim()
            .eq_ignore_ascii_case(SYNC_REQUEST)
        {
            requested = true;
        }
    }
    if inbox.len() > MAX_PENDING_INPUT {
        inbox.clear();
    }
    requested
}
