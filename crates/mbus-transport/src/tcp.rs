//! TCP connection to an M-Bus meter or gateway
//!
//! The receive path is the heart of this module. An M-Bus frame announces
//! its own length in its first bytes, so a fixed-size read is wrong for a
//! stream socket: the loop starts by reading a single byte, hands whatever
//! has accumulated to the incremental parser, and lets the parser's
//! "need more" answer size the next read. Every read outcome is classified
//! (timeout, graceful remote close and other socket failures are distinct
//! results) and all buffer arithmetic goes through the capacity-checked
//! receive buffer.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Instant;

use bytes::BytesMut;

use mbus_frame::{parse, Frame, ParseOutcome};

use crate::error::{ConfigError, ConnectError, RecvError, SendError};
use crate::observer::{Direction, WireObserver};
use crate::recv_buffer::RecvBuffer;
use crate::settings::TcpSettings;

/// Capacity of the per-operation send and receive buffers.
///
/// Comfortably above the largest possible frame (261 bytes); the headroom
/// exists so a stream that claims more than a frame can hold trips the
/// capacity guard instead of being trusted.
pub const PACKET_BUFF_SIZE: usize = 2048;

/// A blocking TCP connection carrying M-Bus frames.
///
/// Constructed by [`connect`](Self::connect); the socket lives exactly as
/// long as the connection is in the connected state. After
/// [`disconnect`](Self::disconnect), every operation fails with a
/// `NotConnected` error rather than touching a dead socket.
pub struct MbusTcpConnection {
    stream: Option<TcpStream>,
    settings: TcpSettings,
    observer: Option<Arc<dyn WireObserver>>,
}

impl MbusTcpConnection {
    /// Connect to the host and port in `settings`.
    ///
    /// Resolves the host name, establishes the TCP connection and applies
    /// the configured timeout to both socket directions. A zero timeout
    /// disables the socket timeouts.
    pub fn connect(settings: TcpSettings) -> Result<Self, ConnectError> {
        Self::connect_inner(settings, None)
    }

    /// Like [`connect`](Self::connect), with a wire observer that will see
    /// the raw bytes of every completed send and receive.
    pub fn connect_with_observer(
        settings: TcpSettings,
        observer: Arc<dyn WireObserver>,
    ) -> Result<Self, ConnectError> {
        Self::connect_inner(settings, Some(observer))
    }

    fn connect_inner(
        settings: TcpSettings,
        observer: Option<Arc<dyn WireObserver>>,
    ) -> Result<Self, ConnectError> {
        if settings.host().is_empty() {
            return Err(ConfigError::EmptyHost.into());
        }

        tracing::debug!("Connecting to {}:{}", settings.host(), settings.port());

        let addr = (settings.host(), settings.port())
            .to_socket_addrs()
            .map_err(|source| ConnectError::Resolve {
                host: settings.host().to_string(),
                source,
            })?
            .next()
            .ok_or_else(|| ConnectError::Resolve {
                host: settings.host().to_string(),
                source: std::io::Error::new(ErrorKind::NotFound, "no addresses returned"),
            })?;

        let stream = TcpStream::connect(addr).map_err(|source| ConnectError::Connect {
            host: settings.host().to_string(),
            port: settings.port(),
            source,
        })?;

        let timeout = settings.timeout();
        let timeout = if timeout.is_zero() { None } else { Some(timeout) };
        stream
            .set_read_timeout(timeout)
            .map_err(ConnectError::SocketOption)?;
        stream
            .set_write_timeout(timeout)
            .map_err(ConnectError::SocketOption)?;

        tracing::info!("Connected to {}:{}", settings.host(), settings.port());

        Ok(Self {
            stream: Some(stream),
            settings,
            observer,
        })
    }

    /// The settings this connection was established with
    pub fn settings(&self) -> &TcpSettings {
        &self.settings
    }

    /// Whether the socket is currently open
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Close the socket.
    ///
    /// Fails with `NotConnected` if the connection was already closed.
    pub fn disconnect(&mut self) -> Result<(), ConnectError> {
        let stream = self.stream.take().ok_or(ConnectError::NotConnected)?;
        let _ = stream.shutdown(Shutdown::Both);
        tracing::debug!(
            "Disconnected from {}:{}",
            self.settings.host(),
            self.settings.port()
        );
        Ok(())
    }

    /// Pack `frame` and write it to the socket in a single write call.
    ///
    /// A write that accepts fewer bytes than the packed frame fails with
    /// [`SendError::ShortWrite`]; there is deliberately no partial-write
    /// retry loop. M-Bus frames fit in one TCP segment in practice, and a
    /// request without a matching response is handled by the caller's
    /// retransmission policy, not here.
    pub fn send_frame(&mut self, frame: &Frame) -> Result<(), SendError> {
        let stream = self.stream.as_mut().ok_or(SendError::NotConnected)?;

        let mut buf = BytesMut::with_capacity(PACKET_BUFF_SIZE);
        frame.pack(&mut buf)?;

        write_packed(stream, &buf)?;

        tracing::debug!("Sent frame of {} bytes", buf.len());
        if let Some(observer) = &self.observer {
            observer.on_frame(Direction::Send, &buf);
        }
        Ok(())
    }

    /// Receive one complete frame.
    ///
    /// Blocks until a frame is complete, the configured timeout expires, the
    /// remote host closes the connection, or the accumulated bytes turn out
    /// to be invalid.
    pub fn recv_frame(&mut self) -> Result<Frame, RecvError> {
        let timeout = self.settings.timeout();
        let stream = self.stream.as_mut().ok_or(RecvError::NotConnected)?;

        let deadline = if timeout.is_zero() {
            None
        } else {
            Some(Instant::now() + timeout)
        };
        read_frame(stream, PACKET_BUFF_SIZE, deadline, self.observer.as_deref())
    }
}

/// Write the packed frame in one shot, failing on a short write
fn write_packed<W: Write>(writer: &mut W, packed: &[u8]) -> Result<(), SendError> {
    let written = writer.write(packed).map_err(|source| {
        tracing::warn!("Failed to write frame to socket: {}", source);
        SendError::Io(source)
    })?;
    if written != packed.len() {
        tracing::warn!("Short write: {} of {} bytes", written, packed.len());
        return Err(SendError::ShortWrite {
            written,
            expected: packed.len(),
        });
    }
    Ok(())
}

/// The incremental receive loop.
///
/// Reads into a capacity-checked buffer, asking for exactly as many bytes as
/// the parser says are missing, starting at one: the first byte alone tells
/// the parser which frame format is coming. A read may deliver fewer bytes
/// than requested; that is normal for a stream and simply feeds the parser a
/// shorter prefix.
///
/// Timeout, remote close and socket errors return immediately. Once the loop
/// ends for any other reason the observer sees the accumulated bytes, on a
/// parse failure too, since the raw dump is the caller's diagnostic.
fn read_frame<R: Read>(
    reader: &mut R,
    capacity: usize,
    deadline: Option<Instant>,
    observer: Option<&dyn WireObserver>,
) -> Result<Frame, RecvError> {
    let mut buf = RecvBuffer::new(capacity);
    let mut needed = 1;

    let outcome = loop {
        let slot = buf.slot(needed)?;
        let n = read_retrying(reader, slot, deadline)?;
        if n == 0 {
            tracing::debug!("Connection closed by remote host");
            return Err(RecvError::Reset);
        }
        buf.commit(n)?;

        match parse(buf.as_slice()) {
            Ok(ParseOutcome::Complete(frame)) => break Ok(frame),
            Ok(ParseOutcome::NeedMore(more)) => needed = more,
            Err(e) => break Err(e),
        }
    };

    if let Some(observer) = observer {
        observer.on_frame(Direction::Receive, buf.as_slice());
    }

    outcome.map_err(|e| {
        tracing::warn!("Failed to parse received data: {}", e);
        RecvError::Invalid(e)
    })
}

/// One blocking read, classified.
///
/// A read interrupted by a signal is retried until `deadline` passes, which
/// counts as a timeout. Would-block and timed-out are the socket timeout
/// expiring; a zero-byte read is reported by the caller as a remote close.
fn read_retrying<R: Read>(
    reader: &mut R,
    slot: &mut [u8],
    deadline: Option<Instant>,
) -> Result<usize, RecvError> {
    loop {
        match reader.read(slot) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    tracing::debug!("Response timeout reached");
                    return Err(RecvError::Timeout);
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                tracing::debug!("Response timeout reached");
                return Err(RecvError::Timeout);
            }
            Err(e) => {
                tracing::warn!("Failed to read data from socket: {}", e);
                return Err(RecvError::Io(e));
            }
        }
    }
}
