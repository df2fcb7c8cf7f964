//! Parser combinators and the `FromNetlink` trait for typed message parsing.
//!
//! Decoding is strict: an attribute whose declared length is shorter than
//! its header, or longer than the bytes left in the message, fails the
//! whole message instead of being skipped.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;

use super::attr::{NLA_HDRLEN, NLA_TYPE_MASK, nla_align};
use super::error::{Error, Result};

/// Result type for winnow parsers.
pub type PResult<T> = core::result::Result<T, ErrMode<ContextError>>;

/// Trait for types that can be parsed from netlink wire format.
pub trait FromNetlink: Sized {
    /// Parse from a mutable byte slice reference.
    /// The slice is advanced past the consumed bytes.
    fn parse(input: &mut &[u8]) -> PResult<Self>;

    /// Parse from a complete message payload.
    ///
    /// The error names the byte offset where decoding stopped, not the
    /// payload itself.
    fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::parse.parse(data).map_err(|e| {
            Error::Parse(format!(
                "invalid record at byte {} of {}",
                e.offset(),
                data.len()
            ))
        })
    }
}

/// Build a non-recoverable parse error.
pub fn cut() -> ErrMode<ContextError> {
    ErrMode::Cut(ContextError::new())
}

/// Parse a u16 in native endian.
pub fn parse_u16_ne(input: &mut &[u8]) -> PResult<u16> {
    let bytes: &[u8] = take(2usize).parse_next(input)?;
    Ok(u16::from_ne_bytes([bytes[0], bytes[1]]))
}

/// Parse a netlink attribute header and return (type without flags, payload).
pub fn parse_attr<'a>(input: &mut &'a [u8]) -> PResult<(u16, &'a [u8])> {
    let len = parse_u16_ne(input)? as usize;
    let attr_type = parse_u16_ne(input)?;

    if len < NLA_HDRLEN {
        return Err(cut());
    }

    let payload_len = len - NLA_HDRLEN;
    if input.len() < payload_len {
        return Err(cut());
    }
    let payload: &[u8] = take(payload_len).parse_next(input)?;

    // The last attribute may omit its padding
    let padding = (nla_align(len) - len).min(input.len());
    let _: &[u8] = take(padding).parse_next(input)?;

    Ok((attr_type & NLA_TYPE_MASK, payload))
}

/// Parse a fixed-size family header that starts every rtnetlink payload.
pub fn parse_header<T>(input: &mut &[u8]) -> PResult<T>
where
    T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable + Copy,
{
    let size = std::mem::size_of::<T>();
    if input.len() < size {
        return Err(cut());
    }
    let bytes: &[u8] = take(size).parse_next(input)?;
    T::read_from_bytes(bytes).map_err(|_| cut())
}

/// Parse a string from a fixed-size buffer (null-terminated).
///
/// Interface names are byte strings to the kernel; invalid UTF-8 is
/// replaced rather than rejected.
pub fn parse_string_from_bytes(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}

/// Parse an IP address based on address family.
pub fn parse_ip_addr(data: &[u8], family: u8) -> Result<IpAddr> {
    match family {
        2 => {
            // AF_INET
            if data.len() < 4 {
                return Err(Error::Truncated {
                    expected: 4,
                    actual: data.len(),
                });
            }
            Ok(IpAddr::V4(Ipv4Addr::new(
                data[0], data[1], data[2], data[3],
            )))
        }
        10 => {
            // AF_INET6
            let arr: [u8; 16] = data
                .get(..16)
                .and_then(|b| b.try_into().ok())
                .ok_or(Error::Truncated {
                    expected: 16,
                    actual: data.len(),
                })?;
            Ok(IpAddr::V6(Ipv6Addr::from(arr)))
        }
        _ => Err(Error::InvalidMessage(format!(
            "unknown address family: {}",
            family
        ))),
    }
}
