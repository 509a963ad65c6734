//! # homemq - MQTT 3.1.1 client engine for constrained devices
//!
//! A lightweight, allocation-free MQTT 3.1.1 client for devices that publish
//! and receive telemetry over a single broker connection. The crate is
//! designed for embedded systems and supports `no_std` environments: all
//! buffers are fixed-size, the engine is synchronous, and the transport is
//! abstracted behind a small trait family so the same client runs over raw
//! TCP, TLS wrappers, or modem sockets.
//!
//! ## Features
//!
//! - **Connection lifecycle**: CONNECT with credentials, keep-alive, and
//!   Last-Will; CONNACK validation with the session-present bit; PINGREQ and
//!   DISCONNECT
//! - **Publish**: QoS 0 fire-and-forget and QoS 1 with PUBACK correlation
//! - **Subscribe**: granted-QoS validation and rejection reporting
//! - **Receive**: blocking and non-blocking single-frame dispatch with
//!   automatic acknowledgement of inbound QoS-1 messages
//! - **Bounded waits**: caller-supplied deadlines on acknowledgement loops
//!
//! QoS 2 is out of scope by design and fails fast rather than degrading.
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! homemq = "0.1.0"
//! ```
//!
//! Bring a transport (anything implementing
//! [`Connection`](network::Connection)) and drive the client:
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
//!     client_id: "greenhouse-01",
//!     keep_alive_seconds: 60,
//!     username: None,
//!     password: None,
//!     last_will: None,
//! };
//!
//! let mut client = Client::new(connection, options);
//! // let session_present = client.connect(true)?;
//! // client.publish("home/greenhouse/temperature", b"23.5", QoS::AtMostOnce, false, None)?;
//! ```
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (ARM Cortex-M, RISC-V, Xtensa, etc.)
//! - Linux-based gateways and bridges (Raspberry Pi, etc.)
//! - Any platform supporting Rust's `core` library
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `defmt`: Enable defmt formatting of error values for embedded debugging

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

/// Transport abstraction: the byte-stream traits the engine is generic
/// over, and the shared error type.
pub mod network;

/// The MQTT 3.1.1 protocol engine: frame codec and session client.
pub mod mqtt;
