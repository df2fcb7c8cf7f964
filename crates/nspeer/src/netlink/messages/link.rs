//! Strongly-typed link message.

use crate::netlink::attr::{AttrIter, get};
use crate::netlink::parse::{
    FromNetlink, PResult, cut, parse_attr, parse_header, parse_string_from_bytes,
};
use crate::netlink::types::link::{IfInfoMsg, IflaAttr, IflaInfo, OperState};

const IFLA_IFNAME: u16 = IflaAttr::Ifname as u16;
const IFLA_LINK: u16 = IflaAttr::Link as u16;
const IFLA_OPERSTATE: u16 = IflaAttr::Operstate as u16;
const IFLA_LINKINFO: u16 = IflaAttr::Linkinfo as u16;
const IFLA_INFO_KIND: u16 = IflaInfo::Kind as u16;

/// Link message with the attributes the enumerator consumes.
#[derive(Debug, Clone, Default)]
pub struct LinkMessage {
    /// Fixed-size header.
    pub header: IfInfoMsg,
    /// Interface name (IFLA_IFNAME).
    pub name: Option<String>,
    /// Peer or lower device index (IFLA_LINK).
    pub link: Option<i32>,
    /// Operational state (IFLA_OPERSTATE).
    pub operstate: Option<OperState>,
    /// Link type kind from IFLA_LINKINFO (e.g. "veth").
    pub kind: Option<String>,
}

impl LinkMessage {
    /// Get the interface index.
    pub fn ifindex(&self) -> i32 {
        self.header.ifi_index
    }

    /// Get the device flags (IFF_*).
    pub fn flags(&self) -> u32 {
        self.header.ifi_flags
    }

    /// Get the interface name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the link type kind.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }
}

impl FromNetlink for LinkMessage {
    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header: IfInfoMsg = parse_header(input)?;

        let mut msg = LinkMessage {
            header,
            ..Default::default()
        };

        while !input.is_empty() {
            let (attr_type, data) = parse_attr(input)?;

            match attr_type {
                IFLA_IFNAME => msg.name = Some(parse_string_from_bytes(data)),
                IFLA_LINK => msg.link = Some(get::i32_ne(data).map_err(|_| cut())?),
                IFLA_OPERSTATE => {
                    msg.operstate = Some(OperState::from(get::u8(data).map_err(|_| cut())?))
                }
                IFLA_LINKINFO => msg.kind = parse_link_kind(data)?,
                _ => {}
            }
        }

        tracing::trace!(
            index = msg.ifindex(),
            name = ?msg.name,
            link = ?msg.link,
            "decoded link"
        );
        Ok(msg)
    }
}

/// Pull IFLA_INFO_KIND out of a nested IFLA_LINKINFO payload.
fn parse_link_kind(data: &[u8]) -> PResult<Option<String>> {
    let mut kind = None;
    for attr in AttrIter::new(data) {
        let (attr_type, payload) = attr.map_err(|_| cut())?;
        if attr_type == IFLA_INFO_KIND {
            kind = Some(parse_string_from_bytes(payload));
        }
    }
    Ok(kind)
}
