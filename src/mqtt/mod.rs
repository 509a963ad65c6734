//! MQTT 3.1.1 protocol engine.
//!
//! A minimal client-side implementation of MQTT 3.1.1 (Message Queuing
//! Telemetry Transport), the lightweight publish-subscribe protocol most
//! constrained telemetry devices speak to their broker. The engine covers
//! the subset such devices need: CONNECT/CONNACK, PUBLISH/PUBACK at QoS 0
//! and 1, SUBSCRIBE/SUBACK, PINGREQ/PINGRESP, and DISCONNECT.
//!
//! # Layout
//!
//! - [`codec`]: the wire-format building blocks - the variable-length
//!   remaining-length field and length-prefixed strings.
//! - [`client`]: the session engine - lifecycle state machine, publish and
//!   subscribe with acknowledgement correlation, and the inbound
//!   dispatcher that feeds the registered callback.
//!
//! # Usage
//!
//! The main entry point is [`Client`], constructed over any transport
//! implementing [`Connection`](crate::network::Connection):
//!
//! ```rust,no_run
//! use homemq::mqtt::{Client, Options, QoS};
//! # use homemq::network::Connection;
//! # struct MockConnection;
//! # impl Connection for MockConnection {}
//! # impl homemq::network::Read for MockConnection {
//! #     type Error = ();
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl homemq::network::Write for MockConnection {
//! #     type Error = ();
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl homemq::network::Close for MockConnection {
//! #     type Error = ();
//! #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//!
//! let connection = MockConnection;
//! let options = Options {
//!     client_id: "device-123",
//!     keep_alive_seconds: 60,
//!     username: None,
//!     password: None,
//!     last_will: None,
//! };
//!
//! let mut client = Client::new(connection, options);
//! // let session_present = client.connect(true)?;
//! // client.publish("home/status", b"online", QoS::AtMostOnce, false, None)?;
//! ```

/// Frame codec: remaining-length and length-prefixed string encodings plus
/// the exact-I/O helpers layered on the transport traits.
pub mod codec;

/// The session engine: lifecycle, publish/subscribe, inbound dispatch.
pub mod client;

pub use client::{
    Client, ClockFn, DEFAULT_PORT, DEFAULT_TLS_PORT, Deadline, LastWill, MAX_INBOUND_FRAME,
    MessageFn, Notification, Options, QoS, State,
};
