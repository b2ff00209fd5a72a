//! Blocking socket transport: one TCP connection per exchange.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::error::{Result, TerminalError};
use super::frame::{HEADER_SIZE, header_length};

/// Read buffer size for each socket read.
const READ_CHUNK: usize = 4096;

/// Safety limit for a response read until the terminal hangs up.
pub const MAX_RESPONSE_SIZE: usize = 1_000_000;

/// Sends one framed command and returns the raw response bytes.
///
/// Implementations must not keep state between calls.
pub trait Transport {
    fn exchange(&self, frame: &[u8]) -> Result<Vec<u8>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn exchange(&self, frame: &[u8]) -> Result<Vec<u8>> {
        (**self).exchange(frame)
    }
}

/// How to tell that the terminal finished its response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStrategy {
    /// Read until the terminal closes the connection.
    ///
    /// A terminal that keeps the socket open blocks the reader until the
    /// read timeout, if any.
    #[default]
    UntilClose,
    /// Read the 2-byte header, then exactly that many bytes.
    LengthPrefixed,
}

/// TCP transport to the terminal.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    addr: String,
    timeout: Option<Duration>,
    strategy: ReadStrategy,
}

impl TcpTransport {
    /// Create a transport for `host:port`. No timeout, read until close.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            addr: format!("{host}:{port}"),
            timeout: None,
            strategy: ReadStrategy::default(),
        }
    }

    /// Apply a connect/read/write timeout. `None` blocks indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn with_read_strategy(mut self, strategy: ReadStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn connect(&self) -> Result<TcpStream> {
        let io_err = |e: std::io::Error| {
            error!("Failed to connect to {}: {e}", self.addr);
            TerminalError::from_io(&self.addr, e)
        };

        let stream = match self.timeout {
            None => TcpStream::connect(&self.addr).map_err(io_err)?,
            Some(timeout) => {
                let addrs: Vec<SocketAddr> = self.addr.to_socket_addrs().map_err(io_err)?.collect();
                let mut last_err = std::io::Error::new(ErrorKind::AddrNotAvailable, "address resolved to nothing");
                let mut connected = None;
                for addr in addrs {
                    match TcpStream::connect_timeout(&addr, timeout) {
                        Ok(stream) => {
                            connected = Some(stream);
                            break;
                        }
                        Err(e) => last_err = e,
                    }
                }
                connected.ok_or_else(|| io_err(last_err))?
            }
        };

        stream.set_read_timeout(self.timeout).map_err(io_err)?;
        stream.set_write_timeout(self.timeout).map_err(io_err)?;
        Ok(stream)
    }

    fn read_until_close(&self, stream: &mut TcpStream) -> Result<Vec<u8>> {
        let mut response = Vec::new();
        let mut buf = [0u8; READ_CHUNK];

        loop {
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) if response.len() + n > MAX_RESPONSE_SIZE => {
                    error!("Response from {} exceeds {MAX_RESPONSE_SIZE} bytes", self.addr);
                    let e = std::io::Error::new(
                        ErrorKind::InvalidData,
                        format!("response exceeds {MAX_RESPONSE_SIZE} bytes"),
                    );
                    return Err(TerminalError::from_io(&self.addr, e));
                }
                Ok(n) => response.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("Read from {} failed: {e}", self.addr);
                    return Err(TerminalError::from_io(&self.addr, e));
                }
            }
        }

        Ok(response)
    }

    fn read_length_prefixed(&self, stream: &mut TcpStream) -> Result<Vec<u8>> {
        let io_err = |e: std::io::Error| {
            error!("Read from {} failed: {e}", self.addr);
            TerminalError::from_io(&self.addr, e)
        };

        let mut response = vec![0u8; HEADER_SIZE];
        stream.read_exact(&mut response).map_err(io_err)?;

        let len = header_length(&response).unwrap_or(0);
        response.resize(HEADER_SIZE + len, 0);
        stream.read_exact(&mut response[HEADER_SIZE..]).map_err(io_err)?;

        Ok(response)
    }
}

impl Transport for TcpTransport {
    fn exchange(&self, frame: &[u8]) -> Result<Vec<u8>> {
        debug!("Connecting to terminal at {} (timeout={:?})", self.addr, self.timeout);
        let mut stream = self.connect()?;

        debug!("TX ({} bytes): {:02X?}", frame.len(), &frame[..frame.len().min(64)]);
        stream.write_all(frame).map_err(|e| {
            error!("Write to {} failed: {e}", self.addr);
            TerminalError::from_io(&self.addr, e)
        })?;
        stream.flush().map_err(|e| TerminalError::from_io(&self.addr, e))?;

        let response = match self.strategy {
            ReadStrategy::UntilClose => self.read_until_close(&mut stream)?,
            ReadStrategy::LengthPrefixed => self.read_length_prefixed(&mut stream)?,
        };
        debug!(
            "RX ({} bytes): {:02X?}",
            response.len(),
            &response[..response.len().min(64)]
        );

        // Stream is dropped, and the socket closed, on every return path.
        Ok(response)
    }
}
