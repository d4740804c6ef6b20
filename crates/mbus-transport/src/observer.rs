//! Wire traffic observers
//!
//! An observer sees the raw bytes of every frame that crosses the wire,
//! for tracing and diagnostics. Observers are registered when the
//! connection is constructed and are purely observational: nothing they do
//! changes the outcome of a send or receive.

/// Direction of a wire event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Bytes written to the remote host
    Send,
    /// Bytes read from the remote host
    Receive,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Send => write!(f, "send"),
            Direction::Receive => write!(f, "recv"),
        }
    }
}

/// Observer of raw frame bytes crossing the wire.
///
/// On send, invoked after the whole packed frame was written. On receive,
/// invoked with everything accumulated once the read loop finishes, also
/// when the bytes failed to parse, since the raw dump is exactly what a
/// caller wants for diagnosing a misbehaving meter. Socket-level failures
/// (timeout, reset, I/O error) produce no event.
pub trait WireObserver: Send + Sync {
    /// Called with the raw bytes of one completed wire operation
    fn on_frame(&self, direction: Direction, bytes: &[u8]);
}
