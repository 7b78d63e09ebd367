//! Byte transports underneath a [`Channel`](crate::Channel)
//!
//! [`Transport`] is the seam between framing and the socket: the channel only
//! needs blocking writes and reads bounded by a timeout. [`Connector`] opens a
//! fresh transport, which is how both the command client and the event
//! collector reconnect after a failure.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::error::{ChannelError, Result};
use crate::telnet::TelnetFilter;

/// Smallest read timeout handed to the socket; zero means "block forever" there
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// A connected byte stream
pub trait Transport: Send {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read whatever is available within `timeout`
    ///
    /// `Ok(0)` means the peer closed the stream. A timeout is reported as an
    /// error of kind `TimedOut` or `WouldBlock`.
    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;

    fn shutdown(&mut self) {}
}

/// Opens transports to one endpoint
pub trait Connector: Send {
    fn connect(&self) -> Result<Box<dyn Transport>>;

    /// Endpoint label for logs
    fn describe(&self) -> String;
}

/// Whether an I/O error is a read timeout rather than a failure
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

/// TCP transport with telnet option refusal
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    telnet: TelnetFilter,
    scratch: Vec<u8>,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            telnet: TelnetFilter::new(),
            scratch: vec![0; 4096],
        }
    }
}

impl Transport for TcpTransport {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            self.stream
                .set_read_timeout(Some(remaining.max(MIN_READ_TIMEOUT)))?;

            let limit = buf.len().min(self.scratch.len());
            let n = self.stream.read(&mut self.scratch[..limit])?;
            if n == 0 {
                return Ok(0);
            }

            let (data, replies) = self.telnet.filter(&self.scratch[..n]);
            if !replies.is_empty() {
                self.write_all(&replies)?;
            }
            if !data.is_empty() {
                buf[..data.len()].copy_from_slice(&data);
                return Ok(data.len());
            }

            // Negotiation only, nothing for the caller yet
            if Instant::now() >= deadline {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"));
            }
        }
    }

    fn shutdown(&mut self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            tracing::debug!("Socket shutdown failed: {}", e);
        }
    }
}

/// Connects to a TL1 port over TCP
#[derive(Debug, Clone)]
pub struct TcpConnector {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(host: impl Into<String>, port: u16, connect_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout,
        }
    }
}

impl Connector for TcpConnector {
    fn connect(&self) -> Result<Box<dyn Transport>> {
        let endpoint = self.describe();
        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| ChannelError::Connect(format!("{endpoint}: {e}")))?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::debug!("Failed to set TCP_NODELAY on {}: {}", endpoint, e);
                    }
                    tracing::debug!("Connected to {} via {}", endpoint, addr);
                    return Ok(Box::new(TcpTransport::new(stream)));
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(ChannelError::Connect(match last_error {
            Some(e) => format!("{endpoint}: {e}"),
            None => format!("{endpoint}: no address resolved"),
        }))
    }

    fn describe(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
