//! Common error type for transport and protocol operations

/// Everything that can go wrong between the engine and a broker.
///
/// This enum covers both transport-level failures and MQTT protocol
/// violations. It is designed to be simple and portable for `no_std`
/// environments. None of these are retried internally; recovery policy
/// belongs to the caller. The decoding failures ([`MalformedFrame`],
/// [`TruncatedStream`]) leave the stream unusable; the connection must be
/// torn down and re-established.
///
/// [`MalformedFrame`]: Error::MalformedFrame
/// [`TruncatedStream`]: Error::TruncatedStream
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// An operation was attempted in the wrong session lifecycle state.
    NotOpen,
    /// An error occurred during a write operation.
    WriteError,
    /// An error occurred during a read operation.
    ReadError,
    /// A caller-supplied deadline expired while waiting for an acknowledgement.
    Timeout,
    /// The peer closed the connection (zero-length read).
    ConnectionClosed,
    /// The broker rejected CONNECT; carries the CONNACK return code (1-5).
    ConnectionRefused(u8),
    /// A frame violated the wire format and cannot be decoded.
    MalformedFrame,
    /// A frame declared more bytes than were available to decode.
    TruncatedStream,
    /// A length exceeded a protocol or buffer limit.
    ProtocolLimitExceeded,
    /// QoS 2 was requested or received; exactly-once delivery is not implemented.
    UnsupportedQoS,
    /// The broker answered SUBSCRIBE with the failure code (0x80).
    SubscriptionRejected,
    /// A receive path was exercised with no message callback registered.
    NoCallbackRegistered,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::NotOpen => defmt::write!(f, "NotOpen"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::ReadError => defmt::write!(f, "ReadError"),
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::ConnectionClosed => defmt::write!(f, "ConnectionClosed"),
            Error::ConnectionRefused(code) => defmt::write!(f, "ConnectionRefused({})", code),
            Error::MalformedFrame => defmt::write!(f, "MalformedFrame"),
            Error::TruncatedStream => defmt::write!(f, "TruncatedStream"),
            Error::ProtocolLimitExceeded => defmt::write!(f, "ProtocolLimitExceeded"),
            Error::UnsupportedQoS => defmt::write!(f, "UnsupportedQoS"),
            Error::SubscriptionRejected => defmt::write!(f, "SubscriptionRejected"),
            Error::NoCallbackRegistered => defmt::write!(f, "NoCallbackRegistered"),
        }
    }
}
