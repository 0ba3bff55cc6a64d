//! Lifecycle of the single channel to the task server.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{ClientError, Result};

/// Host and port of the task server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Host name or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Endpoint {
    /// Build an endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Socket timeouts applied to every channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Upper bound for establishing the connection.
    pub connect: Duration,
    /// Upper bound for a single blocking read.
    pub read: Duration,
    /// Upper bound for a single blocking write.
    pub write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        let ten_seconds = Duration::from_secs(10);
        Self {
            connect: ten_seconds,
            read: ten_seconds,
            write: ten_seconds,
        }
    }
}

/// Factory for channels to an endpoint.
pub trait Connector: Send {
    /// Channel type produced by this connector.
    type Stream: Read + Write + Send;

    /// Dial `endpoint` and apply `timeouts`.
    ///
    /// # Errors
    /// Returns an I/O error when the endpoint cannot be reached.
    fn connect(&self, endpoint: &Endpoint, timeouts: &Timeouts) -> io::Result<Self::Stream>;
}

/// Blocking TCP connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self, endpoint: &Endpoint, timeouts: &Timeouts) -> io::Result<TcpStream> {
        let mut last_error = None;
        for addr in (endpoint.host.as_str(), endpoint.port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeouts.connect) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeouts.read))?;
                    stream.set_write_timeout(Some(timeouts.write))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(err) => last_error = Some(err),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("{endpoint} did not resolve to any address"),
            )
        }))
    }
}

/// Owns the channel to the server and knows how to re-establish it.
pub struct Connection<C: Connector> {
    connector: C,
    timeouts: Timeouts,
    endpoint: Option<Endpoint>,
    stream: Option<C::Stream>,
}

impl<C: Connector> Connection<C> {
    /// Create a closed connection.
    pub const fn new(connector: C, timeouts: Timeouts) -> Self {
        Self {
            connector,
            timeouts,
            endpoint: None,
            stream: None,
        }
    }

    /// Dial `endpoint`, replacing any open channel.
    ///
    /// The endpoint is remembered even when dialing fails so that
    /// [`reconnect`](Self::reconnect) can retry it.
    ///
    /// # Errors
    /// Returns [`ClientError::Connectivity`] when the server cannot be reached;
    /// no usable channel is left behind.
    pub fn open(&mut self, endpoint: Endpoint) -> Result<()> {
        self.close();
        self.endpoint = Some(endpoint);
        self.dial()
    }

    /// Drop the current channel and dial the last known endpoint once.
    ///
    /// # Errors
    /// Returns [`ClientError::NotConfigured`] before the first [`open`](Self::open)
    /// and [`ClientError::Connectivity`] when dialing fails.
    pub fn reconnect(&mut self) -> Result<()> {
        self.close();
        self.dial()
    }

    /// Tear the channel down. Calling it on a closed connection is a no-op.
    pub fn close(&mut self) {
        if self.stream.take().is_some()
            && let Some(endpoint) = &self.endpoint
        {
            info!(%endpoint, "Closed connection");
        }
    }

    /// Whether a channel is currently open.
    pub const fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Last endpoint passed to [`open`](Self::open).
    pub const fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// Configured socket timeouts.
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Borrow the open channel.
    ///
    /// # Errors
    /// Returns [`ClientError::NotConnected`] when no channel is open.
    pub fn stream(&mut self) -> Result<&mut C::Stream> {
        self.stream.as_mut().ok_or(ClientError::NotConnected)
    }

    fn dial(&mut self) -> Result<()> {
        let endpoint = self.endpoint.as_ref().ok_or(ClientError::NotConfigured)?;
        match self.connector.connect(endpoint, &self.timeouts) {
            Ok(stream) => {
                info!(%endpoint, "Connected to task server");
                self.stream = Some(stream);
                Ok(())
            }
            Err(err) => {
                warn!(%endpoint, error = %err, "Failed to connect to task server");
                Err(ClientError::Connectivity(err))
            }
        }
    }
}
