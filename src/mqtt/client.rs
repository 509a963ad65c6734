//! MQTT 3.1.1 client for embedded systems.
//!
//! This module provides a lightweight MQTT client designed for `no_std`
//! environments: a single broker connection, QoS 0 and QoS 1 delivery, and a
//! single registered message callback. It implements the subset of MQTT
//! 3.1.1 that constrained telemetry devices actually use, with fixed-size
//! buffers and no allocator.
//!
//! # Features
//!
//! - CONNECT handshake with credentials, keep-alive, and Last-Will
//! - PUBLISH at QoS 0 (fire-and-forget) and QoS 1 (PUBACK-acknowledged)
//! - SUBSCRIBE with granted-QoS validation
//! - Blocking and non-blocking receive with automatic QoS-1 acknowledgement
//! - Caller-supplied deadlines for acknowledgement waits
//! - Connection agnostic (works with any transport)
//!
//! QoS 2 is deliberately not implemented; requesting it fails with
//! [`Error::UnsupportedQoS`] instead of silently degrading.
//!
//! # Examples
//!
//! ## Connecting and publishing
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
//! ## Subscribing and receiving
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
//! # let options = Options {
//! #     client_id: "bridge-01",
//! #     keep_alive_seconds: 60,
//! #     username: None,
//! #     password: None,
//! #     last_will: None,
//! # };
//!
//! fn on_message(topic: &[u8], payload: &[u8]) {
//!     // route (topic, payload) into the application
//! }
//!
//! let mut client = Client::new(MockConnection, options);
//! client.set_callback(on_message);
//! // client.connect(true)?;
//! // client.subscribe("home/+/telemetry", QoS::AtLeastOnce, None)?;
//! // loop {
//! //     client.wait_msg()?;
//! // }
//! ```

use crate::mqtt::codec;
use crate::network::error::Error;
use crate::network::{Close, Connection, Read, ReadReady, Write};
use heapless::Vec;

// MQTT Control Packet types - these are the fixed header packet type values
/// MQTT CONNECT packet type identifier.
const CONNECT: u8 = 0x10;
/// MQTT CONNACK packet type identifier.
const CONNACK: u8 = 0x20;
/// MQTT PUBLISH packet type identifier.
const PUBLISH: u8 = 0x30;
/// MQTT PUBACK packet type identifier.
const PUBACK: u8 = 0x40;
/// MQTT SUBSCRIBE packet type identifier (includes the reserved flag bits).
const SUBSCRIBE: u8 = 0x82;
/// MQTT SUBACK packet type identifier.
const SUBACK: u8 = 0x90;
/// MQTT PINGREQ packet type identifier.
const PINGREQ: u8 = 0xC0;
/// MQTT PINGRESP packet type identifier.
const PINGRESP: u8 = 0xD0;
/// MQTT DISCONNECT packet type identifier.
const DISCONNECT: u8 = 0xE0;

// Protocol constants defined by MQTT 3.1.1 specification
/// MQTT protocol name as defined in the specification.
const PROTOCOL_NAME: &[u8] = b"MQTT";
/// MQTT protocol level for version 3.1.1.
const PROTOCOL_LEVEL: u8 = 4;
/// SUBACK return code marking a rejected subscription.
const SUBACK_FAILURE: u8 = 0x80;

/// Conventional broker port for plain TCP transports.
pub const DEFAULT_PORT: u16 = 1883;
/// Conventional broker port for TLS transports.
pub const DEFAULT_TLS_PORT: u16 = 8883;

/// Capacity of the buffer an inbound PUBLISH frame is read into.
///
/// Frames whose remaining length exceeds this fail with
/// [`Error::ProtocolLimitExceeded`] before any body byte is read; the topic
/// and payload handed to the callback are slices of this buffer.
pub const MAX_INBOUND_FRAME: usize = 1024;

/// The message callback: invoked with `(topic, payload)` for every inbound
/// PUBLISH. Both arguments are raw bytes borrowed from the frame buffer and
/// are only valid for the duration of the call.
pub type MessageFn = fn(topic: &[u8], payload: &[u8]);

/// A monotonic millisecond clock supplied by the platform, used by
/// [`Deadline`] to bound acknowledgement waits.
pub type ClockFn = fn() -> u64;

/// A caller-supplied bound on how long an acknowledgement wait may run.
///
/// Pairs a platform clock with an absolute expiry so the QoS-1
/// publish/subscribe wait loops can fail with [`Error::Timeout`] instead of
/// blocking indefinitely. Passing `None` where a deadline is accepted keeps
/// the wait unbounded.
///
/// # Examples
///
/// ```rust
/// use homemq::mqtt::Deadline;
///
/// fn millis() -> u64 {
///     // read a hardware timer on a real target
///     0
/// }
///
/// let deadline = Deadline::after(millis, 1500);
/// assert!(!deadline.expired());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    clock: ClockFn,
    expires_at: u64,
}

impl Deadline {
    /// Build a deadline expiring `millis` milliseconds from now, as measured
    /// by `clock`.
    pub fn after(clock: ClockFn, millis: u32) -> Self {
        Self {
            expires_at: clock().saturating_add(u64::from(millis)),
            clock,
        }
    }

    /// Whether the deadline has passed.
    pub fn expired(&self) -> bool {
        (self.clock)() >= self.expires_at
    }
}

/// Quality of Service levels for MQTT messages.
///
/// # Examples
///
/// ```rust
/// use homemq::mqtt::QoS;
///
/// assert_eq!(QoS::AtMostOnce as u8, 0);
/// assert_eq!(QoS::AtLeastOnce as u8, 1);
/// assert_eq!(QoS::from_code(1), Some(QoS::AtLeastOnce));
/// assert_eq!(QoS::from_code(3), None);
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum QoS {
    /// **QoS 0**: at most once. Fire-and-forget; a lost frame is a lost
    /// message. The right level for periodic sensor readings where the next
    /// sample supersedes the last.
    AtMostOnce = 0,

    /// **QoS 1**: at least once. The broker acknowledges with PUBACK and
    /// duplicates are possible.
    AtLeastOnce = 1,

    /// **QoS 2**: exactly once. Representable so requests can be rejected
    /// cleanly, but not implemented - operations asking for it fail with
    /// [`Error::UnsupportedQoS`].
    ExactlyOnce = 2,
}

impl QoS {
    /// Map a wire-level QoS code back to a level; `None` for anything above 2.
    pub fn from_code(code: u8) -> Option<QoS> {
        match code {
            0 => Some(QoS::AtMostOnce),
            1 => Some(QoS::AtLeastOnce),
            2 => Some(QoS::ExactlyOnce),
            _ => None,
        }
    }
}

/// Connection lifecycle states.
///
/// A client starts `Disconnected`, is `Connecting` for the duration of the
/// CONNECT/CONNACK handshake, and is `Connected` until disconnected. A
/// failed handshake returns to `Disconnected`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum State {
    /// No session established.
    Disconnected,
    /// CONNECT sent, CONNACK not yet validated.
    Connecting,
    /// Handshake complete; the session is live.
    Connected,
}

/// Outcome of reading one inbound frame.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Notification {
    /// An application message arrived and was handed to the callback.
    Message,
    /// A PINGRESP was consumed and discarded.
    Pong,
    /// Some other control frame arrived; carries the raw fixed-header byte
    /// for acknowledgement correlation. The frame body is left unread - the
    /// internal PUBACK/SUBACK waits consume it, so a receive-only caller
    /// that sees this must treat the stream as unsynchronized.
    Other(u8),
}

/// A Last-Will message, sent to the broker inside CONNECT.
///
/// The broker publishes it on the client's behalf if the session ends
/// uncleanly. It is bound to the session: transmitted once during the
/// handshake and never re-sent. The topic must be non-empty per MQTT 3.1.1;
/// the broker enforces this.
#[derive(Debug, Clone)]
pub struct LastWill<'a> {
    /// Topic the broker publishes the will to.
    pub topic: &'a str,
    /// Will message body.
    pub message: &'a [u8],
    /// QoS the broker uses for the will publication.
    pub qos: QoS,
    /// Whether the broker retains the will message.
    pub retain: bool,
}

/// Configuration for the MQTT session, consumed during [`Client::connect`].
///
/// # Examples
///
/// ```rust
/// use homemq::mqtt::{LastWill, Options, QoS};
///
/// let options = Options {
///     client_id: "soil-probe-3",
///     keep_alive_seconds: 120,
///     username: Some("garden"),
///     password: Some(b"hunter2"),
///     last_will: Some(LastWill {
///         topic: "home/soil-probe-3/status",
///         message: b"offline",
///         qos: QoS::AtMostOnce,
///         retain: true,
///     }),
/// };
/// # let _ = options;
/// ```
#[derive(Debug, Clone)]
pub struct Options<'a> {
    /// The client identifier, unique within the broker. 1-23 bytes is the
    /// portable range; longer identifiers depend on broker support.
    pub client_id: &'a str,

    /// Keep-alive interval in seconds, 0 to disable. The engine encodes it
    /// into CONNECT but does not schedule pings - call [`Client::ping`]
    /// often enough yourself.
    pub keep_alive_seconds: u16,

    /// Optional username. Required whenever a password is set (MQTT 3.1.1
    /// has no password-without-username flag combination).
    pub username: Option<&'a str>,

    /// Optional password; raw bytes per MQTT 3.1.1.
    pub password: Option<&'a [u8]>,

    /// Optional Last-Will message.
    pub last_will: Option<LastWill<'a>>,
}

/// An MQTT 3.1.1 client over any byte-stream transport.
///
/// One `Client` owns one transport connection for its whole lifetime and
/// runs one session over it: connect, publish, subscribe, receive,
/// disconnect. Operations are synchronous and blocking; at most one QoS-1
/// publish or subscribe is ever awaiting its acknowledgement, and callers
/// serialize access themselves.
///
/// # Type Parameters
///
/// * `C` - The transport type implementing [`Connection`]
///
/// # Examples
///
/// ```rust,no_run
/// use homemq::mqtt::{Client, Options, QoS};
/// # use homemq::network::Connection;
/// # struct TcpConnection;
/// # impl Connection for TcpConnection {}
/// # impl homemq::network::Read for TcpConnection {
/// #     type Error = ();
/// #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
/// # }
/// # impl homemq::network::Write for TcpConnection {
/// #     type Error = ();
/// #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
/// #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
/// # }
/// # impl homemq::network::Close for TcpConnection {
/// #     type Error = ();
/// #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
/// # }
///
/// let options = Options {
///     client_id: "weather-station",
///     keep_alive_seconds: 60,
///     username: None,
///     password: None,
///     last_will: None,
/// };
///
/// let mut client = Client::new(TcpConnection, options);
/// // let session_present = client.connect(true)?;
/// // client.publish("home/weather/wind", b"4.2", QoS::AtLeastOnce, false, None)?;
/// // client.disconnect()?;
/// ```
pub struct Client<'a, C: Connection> {
    connection: C,
    options: Options<'a>,
    state: State,
    last_pid: u16,
    callback: Option<MessageFn>,
}

impl<'a, C: Connection> Client<'a, C> {
    /// Wrap an established transport connection. No bytes are exchanged
    /// until [`connect`](Client::connect) runs the handshake.
    pub fn new(connection: C, options: Options<'a>) -> Self {
        Self {
            connection,
            options,
            state: State::Disconnected,
            last_pid: 0,
            callback: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Register the message callback, replacing any previous one.
    ///
    /// The callback is invoked for every inbound PUBLISH - from
    /// [`wait_msg`](Client::wait_msg)/[`check_msg`](Client::check_msg) and
    /// from inside the acknowledgement waits of
    /// [`publish`](Client::publish) and [`subscribe`](Client::subscribe),
    /// which process unrelated inbound frames while waiting.
    pub fn set_callback(&mut self, callback: MessageFn) {
        self.callback = Some(callback);
    }

    /// Run the MQTT connection handshake.
    ///
    /// Sends CONNECT carrying the client identifier, keep-alive, optional
    /// credentials, and optional Last-Will from [`Options`], with the
    /// clean-session flag as passed; then reads the 4-byte CONNACK and
    /// validates it. On success the client is `Connected` and the broker's
    /// session-present bit is returned (`true` means the broker resumed
    /// state from an earlier session; always `false` after a clean-session
    /// connect).
    ///
    /// # Errors
    ///
    /// * [`Error::NotOpen`] - the client is not `Disconnected`
    /// * [`Error::WriteError`] / [`Error::ReadError`] - transport failure
    /// * [`Error::ConnectionClosed`] - the peer closed during the handshake
    /// * [`Error::MalformedFrame`] - the CONNACK header was not
    ///   `[0x20, 0x02, ..]`
    /// * [`Error::ConnectionRefused`] - non-zero CONNACK return code, e.g.
    ///   bad credentials (4) or not authorized (5)
    ///
    /// A failed handshake leaves the client `Disconnected`; the transport
    /// may be in an arbitrary state and should be torn down.
    pub fn connect(&mut self, clean_session: bool) -> Result<bool, Error> {
        if self.state != State::Disconnected {
            return Err(Error::NotOpen);
        }
        self.state = State::Connecting;
        match self.handshake(clean_session) {
            Ok(session_present) => {
                self.state = State::Connected;
                Ok(session_present)
            }
            Err(e) => {
                self.state = State::Disconnected;
                Err(e)
            }
        }
    }

    fn handshake(&mut self, clean_session: bool) -> Result<bool, Error> {
        // --- Variable Header ---
        let mut vh: Vec<u8, 10> = Vec::new();
        vh.extend_from_slice(&(PROTOCOL_NAME.len() as u16).to_be_bytes())
            .unwrap();
        vh.extend_from_slice(PROTOCOL_NAME).unwrap();
        vh.push(PROTOCOL_LEVEL).unwrap();

        let mut connect_flags: u8 = 0;
        if clean_session {
            connect_flags |= 0x02;
        }
        if let Some(will) = &self.options.last_will {
            connect_flags |= 0x04 | ((will.qos as u8) << 3);
            if will.retain {
                connect_flags |= 0x20;
            }
        }
        if self.options.password.is_some() {
            connect_flags |= 0x40;
        }
        if self.options.username.is_some() {
            connect_flags |= 0x80;
        }
        vh.push(connect_flags).unwrap();
        vh.extend_from_slice(&self.options.keep_alive_seconds.to_be_bytes())
            .unwrap();

        // --- Payload (length-prefixed fields, streamed in order) ---
        let mut remaining = vh.len() + 2 + self.options.client_id.len();
        if let Some(will) = &self.options.last_will {
            remaining += 2 + will.topic.len() + 2 + will.message.len();
        }
        if let Some(user) = self.options.username {
            remaining += 2 + user.len();
        }
        if let Some(pass) = self.options.password {
            remaining += 2 + pass.len();
        }

        // --- Fixed Header ---
        let mut fixed_header: Vec<u8, 5> = Vec::new();
        fixed_header.push(CONNECT).unwrap();
        codec::encode_remaining_length(&mut fixed_header, remaining)?;

        codec::write_all(&mut self.connection, &fixed_header)?;
        codec::write_all(&mut self.connection, &vh)?;
        codec::write_str(&mut self.connection, self.options.client_id.as_bytes())?;
        if let Some(will) = &self.options.last_will {
            codec::write_str(&mut self.connection, will.topic.as_bytes())?;
            codec::write_str(&mut self.connection, will.message)?;
        }
        if let Some(user) = self.options.username {
            codec::write_str(&mut self.connection, user.as_bytes())?;
        }
        if let Some(pass) = self.options.password {
            codec::write_str(&mut self.connection, pass)?;
        }
        self.connection.flush().map_err(|_| Error::WriteError)?;

        // CONNACK is exactly four bytes
        let mut connack = [0u8; 4];
        codec::read_exact(&mut self.connection, &mut connack)?;
        if connack[0] != CONNACK || connack[1] != 2 {
            return Err(Error::MalformedFrame);
        }
        if connack[3] != 0 {
            return Err(Error::ConnectionRefused(connack[3]));
        }
        Ok(connack[2] & 0x01 == 1)
    }

    /// Send DISCONNECT and close the transport, consuming the client.
    ///
    /// Consuming `self` makes a second disconnect - or any operation on a
    /// disconnected session - unrepresentable. The returned `Result`
    /// reflects the DISCONNECT frame write; the transport is closed
    /// regardless, and close failures are discarded because the session is
    /// gone either way. On a client that never connected, nothing is
    /// written and the transport is simply closed.
    pub fn disconnect(mut self) -> Result<(), Error> {
        let result = if self.state == State::Connected {
            match codec::write_all(&mut self.connection, &[DISCONNECT, 0]) {
                Ok(()) => self.connection.flush().map_err(|_| Error::WriteError),
                Err(e) => Err(e),
            }
        } else {
            Ok(())
        };
        let _ = self.connection.close();
        result
    }

    /// Send PINGREQ.
    ///
    /// Does not wait for PINGRESP; the dispatcher consumes that
    /// opportunistically ([`Notification::Pong`]) on a later receive call.
    /// The caller owns keep-alive timing.
    pub fn ping(&mut self) -> Result<(), Error> {
        if self.state != State::Connected {
            return Err(Error::NotOpen);
        }
        codec::write_all(&mut self.connection, &[PINGREQ, 0])?;
        self.connection.flush().map_err(|_| Error::WriteError)
    }

    /// Publish a message.
    ///
    /// * QoS 0: writes the frame and returns; no packet identifier, no
    ///   acknowledgement, `deadline` unused.
    /// * QoS 1: allocates the next packet identifier, writes the frame, then
    ///   reads inbound frames until the matching PUBACK arrives. Unrelated
    ///   frames encountered while waiting take their normal path - an
    ///   inbound PUBLISH is dispatched to the callback, a PUBACK with a
    ///   different identifier is skipped.
    ///
    /// # Arguments
    ///
    /// * `topic` - topic name (UTF-8, no wildcards)
    /// * `payload` - message body, raw bytes
    /// * `qos` - delivery level; [`QoS::ExactlyOnce`] is rejected
    /// * `retain` - ask the broker to retain the message for new subscribers
    /// * `deadline` - optional bound on the PUBACK wait
    ///
    /// # Errors
    ///
    /// * [`Error::NotOpen`] - not connected
    /// * [`Error::UnsupportedQoS`] - `qos` was [`QoS::ExactlyOnce`]
    ///   (nothing is written)
    /// * [`Error::Timeout`] - `deadline` expired before the PUBACK matched
    /// * [`Error::MalformedFrame`] - a PUBACK with a bad remaining length
    /// * [`Error::WriteError`] / [`Error::ReadError`] /
    ///   [`Error::ConnectionClosed`] - transport failure
    pub fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
        deadline: Option<Deadline>,
    ) -> Result<(), Error> {
        if self.state != State::Connected {
            return Err(Error::NotOpen);
        }
        if qos == QoS::ExactlyOnce {
            return Err(Error::UnsupportedQoS);
        }

        let pid = match qos {
            QoS::AtLeastOnce => Some(self.next_pid()),
            _ => None,
        };

        // --- Fixed Header ---
        let mut flags = PUBLISH | ((qos as u8) << 1);
        if retain {
            flags |= 0x01;
        }
        let mut remaining = 2 + topic.len() + payload.len();
        if pid.is_some() {
            remaining += 2;
        }
        let mut fixed_header: Vec<u8, 5> = Vec::new();
        fixed_header.push(flags).unwrap();
        codec::encode_remaining_length(&mut fixed_header, remaining)?;

        // --- Variable Header and Payload ---
        codec::write_all(&mut self.connection, &fixed_header)?;
        codec::write_str(&mut self.connection, topic.as_bytes())?;
        if let Some(pid) = pid {
            codec::write_all(&mut self.connection, &pid.to_be_bytes())?;
        }
        codec::write_all(&mut self.connection, payload)?;
        self.connection.flush().map_err(|_| Error::WriteError)?;

        match pid {
            Some(pid) => self.wait_puback(pid, deadline),
            None => Ok(()),
        }
    }

    /// Subscribe to a topic filter and return the granted QoS.
    ///
    /// Requires a callback to be registered first - receiving without a
    /// consumer is meaningless. Writes SUBSCRIBE, then reads inbound frames
    /// until the SUBACK with the matching packet identifier arrives;
    /// unrelated frames take their normal path while waiting, exactly as in
    /// [`publish`](Client::publish).
    ///
    /// # Errors
    ///
    /// * [`Error::NotOpen`] - not connected
    /// * [`Error::NoCallbackRegistered`] - no callback set
    /// * [`Error::UnsupportedQoS`] - [`QoS::ExactlyOnce`] requested; the
    ///   engine could not acknowledge the deliveries it would invite
    /// * [`Error::SubscriptionRejected`] - the broker answered 0x80
    /// * [`Error::Timeout`] - `deadline` expired first
    pub fn subscribe(
        &mut self,
        topic: &str,
        qos: QoS,
        deadline: Option<Deadline>,
    ) -> Result<QoS, Error> {
        if self.state != State::Connected {
            return Err(Error::NotOpen);
        }
        if qos == QoS::ExactlyOnce {
            return Err(Error::UnsupportedQoS);
        }
        if self.callback.is_none() {
            return Err(Error::NoCallbackRegistered);
        }

        let pid = self.next_pid();

        // --- Fixed Header ---
        // packet id + topic with length prefix + requested-QoS byte
        let remaining = 2 + 2 + topic.len() + 1;
        let mut fixed_header: Vec<u8, 5> = Vec::new();
        fixed_header.push(SUBSCRIBE).unwrap();
        codec::encode_remaining_length(&mut fixed_header, remaining)?;

        // --- Variable Header and Payload ---
        codec::write_all(&mut self.connection, &fixed_header)?;
        codec::write_all(&mut self.connection, &pid.to_be_bytes())?;
        codec::write_str(&mut self.connection, topic.as_bytes())?;
        codec::write_all(&mut self.connection, &[qos as u8])?;
        self.connection.flush().map_err(|_| Error::WriteError)?;

        self.wait_suback(pid, deadline)
    }

    /// Block until one inbound frame is read and dispatched.
    ///
    /// An inbound PUBLISH is decoded, handed to the callback, and - at
    /// QoS 1 - acknowledged with PUBACK before this returns
    /// [`Notification::Message`]. See [`Notification::Other`] for the
    /// stream-position caveat on unexpected control frames.
    pub fn wait_msg(&mut self) -> Result<Notification, Error> {
        if self.state != State::Connected {
            return Err(Error::NotOpen);
        }
        self.read_frame()
    }

    /// Allocate the next packet identifier. Identifier 0 is reserved by the
    /// wire format, so allocation wraps 65535 -> 1; no collision tracking is
    /// needed because at most one acknowledged operation is ever
    /// outstanding.
    fn next_pid(&mut self) -> u16 {
        self.last_pid = match self.last_pid.wrapping_add(1) {
            0 => 1,
            n => n,
        };
        self.last_pid
    }

    fn wait_puback(&mut self, pid: u16, deadline: Option<Deadline>) -> Result<(), Error> {
        loop {
            if let Some(d) = deadline {
                if d.expired() {
                    return Err(Error::Timeout);
                }
            }
            match self.read_frame()? {
                Notification::Other(t) if t == PUBACK => {
                    let mut ack = [0u8; 3];
                    codec::read_exact(&mut self.connection, &mut ack)?;
                    if ack[0] != 2 {
                        return Err(Error::MalformedFrame);
                    }
                    if u16::from_be_bytes([ack[1], ack[2]]) == pid {
                        return Ok(());
                    }
                    // Stale identifier: keep waiting for ours.
                }
                _ => {}
            }
        }
    }

    fn wait_suback(&mut self, pid: u16, deadline: Option<Deadline>) -> Result<QoS, Error> {
        loop {
            if let Some(d) = deadline {
                if d.expired() {
                    return Err(Error::Timeout);
                }
            }
            match self.read_frame()? {
                Notification::Other(t) if t == SUBACK => {
                    let mut ack = [0u8; 4];
                    codec::read_exact(&mut self.connection, &mut ack)?;
                    if ack[0] != 3 {
                        return Err(Error::MalformedFrame);
                    }
                    if u16::from_be_bytes([ack[1], ack[2]]) != pid {
                        continue;
                    }
                    return match ack[3] {
                        SUBACK_FAILURE => Err(Error::SubscriptionRejected),
                        code => QoS::from_code(code).ok_or(Error::MalformedFrame),
                    };
                }
                _ => {}
            }
        }
    }

    /// Read exactly one frame, blocking on the first header byte.
    fn read_frame(&mut self) -> Result<Notification, Error> {
        let mut header = [0u8; 1];
        match self.connection.read(&mut header) {
            Ok(0) => return Err(Error::ConnectionClosed),
            Ok(_) => {}
            Err(_) => return Err(Error::ReadError),
        }
        self.dispatch(header[0])
    }

    fn dispatch(&mut self, header: u8) -> Result<Notification, Error> {
        if header == PINGRESP {
            let mut len = [0u8; 1];
            codec::read_exact(&mut self.connection, &mut len)?;
            if len[0] != 0 {
                return Err(Error::MalformedFrame);
            }
            return Ok(Notification::Pong);
        }
        if header & 0xF0 != PUBLISH {
            return Ok(Notification::Other(header));
        }

        // Inbound PUBLISH: read the whole body, then slice it apart.
        let remaining = codec::decode_remaining_length(&mut self.connection)?;
        if remaining > MAX_INBOUND_FRAME {
            return Err(Error::ProtocolLimitExceeded);
        }
        let mut frame: Vec<u8, MAX_INBOUND_FRAME> = Vec::new();
        frame.resize(remaining, 0).unwrap(); // bounded by the capacity check above
        codec::read_exact(&mut self.connection, &mut frame)?;

        let qos_bits = (header & 0x06) >> 1;
        if qos_bits == 2 {
            return Err(Error::UnsupportedQoS);
        }
        if qos_bits == 3 {
            return Err(Error::MalformedFrame);
        }

        let (topic, rest) = codec::decode_str(&frame)?;
        let (pid, payload) = if qos_bits != 0 {
            if rest.len() < 2 {
                return Err(Error::TruncatedStream);
            }
            (u16::from_be_bytes([rest[0], rest[1]]), &rest[2..])
        } else {
            (0, rest)
        };

        let callback = self.callback.ok_or(Error::NoCallbackRegistered)?;
        callback(topic, payload);

        if qos_bits == 1 {
            let ack = [PUBACK, 2, (pid >> 8) as u8, pid as u8];
            codec::write_all(&mut self.connection, &ack)?;
            self.connection.flush().map_err(|_| Error::WriteError)?;
        }
        Ok(Notification::Message)
    }
}

impl<'a, C: Connection + ReadReady> Client<'a, C> {
    /// Poll for one inbound frame without blocking.
    ///
    /// Returns `Ok(None)` immediately when the transport has nothing
    /// buffered; otherwise reads and dispatches exactly one frame like
    /// [`wait_msg`](Client::wait_msg). Requires a transport that can answer
    /// the readiness question, i.e. one implementing [`ReadReady`].
    pub fn check_msg(&mut self) -> Result<Option<Notification>, Error> {
        if self.state != State::Connected {
            return Err(Error::NotOpen);
        }
        if !self.connection.read_ready().map_err(|_| Error::ReadError)? {
            return Ok(None);
        }
        self.read_frame().map(Some)
    }
}
