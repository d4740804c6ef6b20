//! Transport error types
//!
//! Every failure is reported through one of these enums, carrying the context
//! (host, port, byte counts) a caller needs for diagnostics. Socket outcomes
//! the receiver has to tell apart get their own variants: a timeout, a
//! graceful remote close and any other I/O failure are three different
//! things to an M-Bus master.

use mbus_frame::FrameError;
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Timeout must not be negative
    #[error("Invalid timeout: {0} (must not be negative)")]
    NegativeTimeout(f64),

    /// Host name must be non-empty
    #[error("Host name is empty")]
    EmptyHost,
}

/// Errors establishing or tearing down a connection
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Transport settings are invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Host name could not be resolved to an address
    #[error("Failed to resolve host {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// TCP connection could not be established
    #[error("Failed to establish connection to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Socket timeout could not be applied
    #[error("Failed to set socket timeout: {0}")]
    SocketOption(#[source] std::io::Error),

    /// Operation requires an open connection
    #[error("Not connected")]
    NotConnected,
}

/// Errors sending a frame
#[derive(Error, Debug)]
pub enum SendError {
    /// Operation requires an open connection
    #[error("Not connected")]
    NotConnected,

    /// Frame could not be packed into the send buffer
    #[error("Failed to pack frame: {0}")]
    Pack(#[from] FrameError),

    /// The socket accepted fewer bytes than the packed frame
    #[error("Short write: wrote {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// I/O error writing to the socket
    #[error("Failed to write frame to socket: {0}")]
    Io(#[source] std::io::Error),
}

/// Errors receiving a frame
#[derive(Error, Debug)]
pub enum RecvError {
    /// Operation requires an open connection
    #[error("Not connected")]
    NotConnected,

    /// Response timeout reached before a complete frame arrived
    #[error("Response timeout reached")]
    Timeout,

    /// Connection closed gracefully by the remote host
    #[error("Connection closed by remote host")]
    Reset,

    /// I/O error reading from the socket
    #[error("Failed to read data from socket: {0}")]
    Io(#[source] std::io::Error),

    /// The next read would exceed the receive buffer or wrap its length
    #[error("Receive buffer exceeded: {len} bytes held, {needed} more requested, capacity {capacity}")]
    BufferExceeded {
        len: usize,
        needed: usize,
        capacity: usize,
    },

    /// Accumulated bytes do not form a valid frame
    #[error("Failed to parse received data: {0}")]
    Invalid(#[from] FrameError),
}
