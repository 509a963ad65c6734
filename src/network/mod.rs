//! Transport abstraction for the MQTT engine
//!
//! The client is generic over a small family of synchronous byte-stream
//! traits so it can run over raw TCP, a TLS wrapper, or anything else that
//! moves bytes. Implementations own the socket details (addresses, TLS
//! parameters, timeouts); the engine only reads, writes, and closes.

#![allow(missing_docs)]
#![deny(unsafe_code)]

/// Common error type for transport and protocol operations
pub mod error;

/// Re-exports of common traits
pub mod prelude {
    pub use super::{Close, Connect, Read, ReadReady, Write};
}

// Core synchronous traits
pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read data from the connection; `Ok(0)` means the peer closed the stream
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the connection, returning how many bytes were accepted
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

pub trait Close {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Close the connection
    fn close(self) -> Result<(), Self::Error>;
}

/// A readiness probe for connections that can be polled without blocking.
///
/// Required by the non-blocking receive path ([`check_msg`]); a transport
/// that cannot answer the question should not implement it.
///
/// [`check_msg`]: crate::mqtt::Client::check_msg
pub trait ReadReady: Read {
    /// Return whether at least one byte can be read without blocking
    fn read_ready(&mut self) -> Result<bool, Self::Error>;
}

/// A synchronous connection
pub trait Connection: Read + Write + Close {}

/// A synchronous connector (client)
pub trait Connect {
    /// Associated connection type
    type Connection: Connection;
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Open a connection to `remote` (a `host:port` string)
    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error>;
}

/// Buffered bytes can serve as a frame source, mirroring `std::io::Read`
/// for byte slices. The slice is advanced past whatever was read.
impl Read for &[u8] {
    type Error = core::convert::Infallible;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = self.len().min(buf.len());
        let (head, tail) = self.split_at(n);
        buf[..n].copy_from_slice(head);
        *self = tail;
        Ok(n)
    }
}
