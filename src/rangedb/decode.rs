//! Field decoding primitives
//!
//! Stateless readers over a [`ByteSource`]. All multi-byte values are stored
//! little-endian. Strings are a single length byte followed by that many raw
//! bytes with no terminator and no encoding guarantee.

use super::types::AddressFamily;
use crate::error::DecodeError;
use crate::source::ByteSource;

/// Read a little-endian u32 at `offset`
#[inline]
pub fn read_u32<S: ByteSource + ?Sized>(source: &S, offset: u64) -> Result<u32, DecodeError> {
    let mut buf = [0u8; 4];
    source.read_at(offset, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a 128-bit key at `offset`.
///
/// Keys are stored least significant byte first; the returned integer
/// compares in the same order as the addresses it encodes.
#[inline]
pub fn read_u128<S: ByteSource + ?Sized>(source: &S, offset: u64) -> Result<u128, DecodeError> {
    let mut buf = [0u8; 16];
    source.read_at(offset, &mut buf)?;
    Ok(u128::from_le_bytes(buf))
}

/// Read an address key of the given family, widened to 128 bits
#[inline]
pub fn read_key<S: ByteSource + ?Sized>(
    source: &S,
    offset: u64,
    family: AddressFamily,
) -> Result<u128, DecodeError> {
    match family {
        AddressFamily::V4 => read_u32(source, offset).map(u128::from),
        AddressFamily::V6 => read_u128(source, offset),
    }
}

/// Read a little-endian IEEE-754 single at `offset`
#[inline]
pub fn read_f32<S: ByteSource + ?Sized>(source: &S, offset: u64) -> Result<f32, DecodeError> {
    read_u32(source, offset).map(f32::from_bits)
}

/// Read the payload of a length-prefixed string at `offset`.
///
/// Consumes exactly `1 + len` bytes. The payload is copied verbatim.
pub fn read_string_bytes<S: ByteSource + ?Sized>(
    source: &S,
    offset: u64,
) -> Result<Vec<u8>, DecodeError> {
    let mut len = [0u8; 1];
    source.read_at(offset, &mut len)?;
    let start = offset.checked_add(1).ok_or(DecodeError::Truncated {
        offset,
        len: 1 + usize::from(len[0]),
    })?;
    source.read_vec(start, usize::from(len[0]))
}

/// Read a length-prefixed string as text.
///
/// Invalid UTF-8 sequences are replaced with U+FFFD; use
/// [`read_string_bytes`] when the raw payload is needed.
pub fn read_string<S: ByteSource + ?Sized>(source: &S, offset: u64) -> Result<String, DecodeError> {
    let bytes = read_string_bytes(source, offset)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Parse an elevation payload (decimal text, meters)
pub fn parse_elevation(payload: &str) -> Result<f64, DecodeError> {
    let text = payload.trim();
    text.parse::<f64>()
        .map_err(|_| DecodeError::Malformed(format!("elevation is not numeric: {:?}", text)))
}
