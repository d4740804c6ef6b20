//! mbus-transport: blocking TCP stream transport for M-Bus frames
//!
//! This crate carries M-Bus frames over a connection-oriented byte stream.
//! It opens a connection to a remote meter or gateway, writes packed frames
//! onto the wire, and reassembles incoming frames from arbitrarily-chunked
//! reads, letting the incremental parser in `mbus-frame` dictate how many
//! more bytes each read should ask for.
//!
//! The model is fully synchronous: every operation blocks the calling thread,
//! bounded by the timeout configured on [`TcpSettings`]. A connection is not
//! internally synchronized; send and receive take `&mut self`, so concurrent
//! use must be serialized by the caller.
//!
//! # Example
//!
//! ```ignore
//! use mbus_frame::Frame;
//! use mbus_transport::{MbusTcpConnection, TcpSettings};
//!
//! let settings = TcpSettings::new("gateway.local", 10001);
//! let mut conn = MbusTcpConnection::connect(settings)?;
//! conn.send_frame(&Frame::req_ud2(5))?;
//! let reply = conn.recv_frame()?;
//! ```

pub mod error;
pub mod observer;
pub mod settings;
pub mod tcp;

mod recv_buffer;

pub use error::{ConfigError, ConnectError, RecvError, SendError};
pub use observer::{Direction, WireObserver};
pub use settings::{TcpSettings, DEFAULT_TIMEOUT};
pub use tcp::{MbusTcpConnection, PACKET_BUFF_SIZE};
