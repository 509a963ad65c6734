//! MQTT frame codec.
//!
//! The pieces every control packet is built from: the variable-length
//! "remaining length" field of the fixed header, length-prefixed strings,
//! and the exact-read/exact-write helpers the engine layers on top of the
//! transport traits. Encoding assembles into fixed-capacity [`heapless`]
//! buffers or streams straight to the transport; decoding reads from any
//! [`Read`] source (byte slices implement it) or slices a buffered frame.

use crate::network::error::Error;
use crate::network::{Read, Write};
use heapless::Vec;

/// Largest value the remaining-length encoding can represent (4 bytes of
/// 7-bit digits, 0xFF 0xFF 0xFF 0x7F on the wire).
pub const REMAINING_LENGTH_MAX: usize = 268_435_455;

/// Encode the remaining-length field of an MQTT fixed header.
///
/// Little-endian base-128: each byte carries 7 bits of magnitude, and the
/// high bit marks a continuation. Values encode to 1-4 bytes.
///
/// # Errors
///
/// * [`Error::ProtocolLimitExceeded`] - `len` exceeds
///   [`REMAINING_LENGTH_MAX`], or `buf` has no room left. Nothing is
///   emitted in the oversize case.
pub fn encode_remaining_length<const N: usize>(
    buf: &mut Vec<u8, N>,
    mut len: usize,
) -> Result<(), Error> {
    if len > REMAINING_LENGTH_MAX {
        return Err(Error::ProtocolLimitExceeded);
    }
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        buf.push(byte).map_err(|_| Error::ProtocolLimitExceeded)?;
        if len == 0 {
            break;
        }
    }
    Ok(())
}

/// Decode a remaining-length field, reading one byte at a time.
///
/// Shifts 7 bits per byte until a byte with a clear continuation bit
/// terminates the sequence.
///
/// # Errors
///
/// * [`Error::MalformedFrame`] - four bytes were consumed and the
///   continuation bit was still set.
/// * [`Error::ConnectionClosed`] - the source ran out mid-field.
/// * [`Error::ReadError`] - the transport failed.
pub fn decode_remaining_length<R: Read>(source: &mut R) -> Result<usize, Error> {
    let mut value = 0usize;
    let mut shift = 0u32;
    for _ in 0..4 {
        let mut byte = [0u8; 1];
        read_exact(source, &mut byte)?;
        value |= ((byte[0] & 0x7F) as usize) << shift;
        if byte[0] & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
    Err(Error::MalformedFrame)
}

/// Write a length-prefixed string: 2-byte big-endian length, then the raw
/// bytes. Fails with [`Error::ProtocolLimitExceeded`] when `s` does not fit
/// the 16-bit prefix.
pub fn write_str<W: Write>(sink: &mut W, s: &[u8]) -> Result<(), Error> {
    if s.len() > u16::MAX as usize {
        return Err(Error::ProtocolLimitExceeded);
    }
    write_all(sink, &(s.len() as u16).to_be_bytes())?;
    write_all(sink, s)
}

/// Split a length-prefixed string off the front of a buffered frame,
/// returning `(string, rest)`. Fails with [`Error::TruncatedStream`] when
/// fewer bytes are buffered than the prefix declares.
pub fn decode_str(input: &[u8]) -> Result<(&[u8], &[u8]), Error> {
    if input.len() < 2 {
        return Err(Error::TruncatedStream);
    }
    let len = u16::from_be_bytes([input[0], input[1]]) as usize;
    let rest = &input[2..];
    if rest.len() < len {
        return Err(Error::TruncatedStream);
    }
    Ok(rest.split_at(len))
}

/// Fill `buf` completely from the source. A zero-length read means the peer
/// closed the stream and fails with [`Error::ConnectionClosed`].
pub fn read_exact<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<(), Error> {
    let mut total = 0;
    while total < buf.len() {
        match source.read(&mut buf[total..]) {
            Ok(0) => return Err(Error::ConnectionClosed),
            Ok(n) => total += n,
            Err(_) => return Err(Error::ReadError),
        }
    }
    Ok(())
}

/// Write all of `bytes`, looping over partial writes. A write that accepts
/// nothing fails with [`Error::WriteError`].
pub fn write_all<W: Write>(sink: &mut W, mut bytes: &[u8]) -> Result<(), Error> {
    while !bytes.is_empty() {
        match sink.write(bytes) {
            Ok(0) => return Err(Error::WriteError),
            Ok(n) => bytes = &bytes[n..],
            Err(_) => return Err(Error::WriteError),
        }
    }
    Ok(())
}
