//! Strongly-typed address message.

use std::net::IpAddr;

use crate::netlink::attr::get;
use crate::netlink::parse::{
    FromNetlink, PResult, cut, parse_attr, parse_header, parse_ip_addr, parse_string_from_bytes,
};
use crate::netlink::types::addr::{IfAddrMsg, IfaAttr, Scope};

const IFA_ADDRESS: u16 = IfaAttr::Address as u16;
const IFA_LOCAL: u16 = IfaAttr::Local as u16;
const IFA_LABEL: u16 = IfaAttr::Label as u16;
const IFA_FLAGS: u16 = IfaAttr::Flags as u16;

/// Address message with the attributes the enumerator consumes.
#[derive(Debug, Clone, Default)]
pub struct AddressMessage {
    /// Fixed-size header.
    pub header: IfAddrMsg,
    /// Address (IFA_ADDRESS).
    pub address: Option<IpAddr>,
    /// Local address (IFA_LOCAL).
    pub local: Option<IpAddr>,
    /// Interface label (IFA_LABEL).
    pub label: Option<String>,
    /// Extended flags (IFA_FLAGS).
    pub flags: Option<u32>,
}

impl AddressMessage {
    /// Get the address family.
    pub fn family(&self) -> u8 {
        self.header.ifa_family
    }

    /// Get the prefix length.
    pub fn prefix_len(&self) -> u8 {
        self.header.ifa_prefixlen
    }

    /// Get the interface index.
    pub fn ifindex(&self) -> u32 {
        self.header.ifa_index
    }

    /// Get the raw scope value.
    pub fn scope(&self) -> u8 {
        self.header.ifa_scope
    }

    /// Get the primary address (local or address).
    pub fn primary_address(&self) -> Option<&IpAddr> {
        self.local.as_ref().or(self.address.as_ref())
    }

    /// Get the full flag word; IFA_FLAGS supersedes the 8-bit header field.
    pub fn all_flags(&self) -> u32 {
        self.flags.unwrap_or(self.header.ifa_flags as u32)
    }
}

impl FromNetlink for AddressMessage {
    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header: IfAddrMsg = parse_header(input)?;

        let mut msg = AddressMessage {
            header,
            ..Default::default()
        };
        let has_ip = matches!(header.ifa_family, 2 | 10);

        while !input.is_empty() {
            let (attr_type, data) = parse_attr(input)?;

            match attr_type {
                IFA_ADDRESS if has_ip => {
                    msg.address =
                        Some(parse_ip_addr(data, header.ifa_family).map_err(|_| cut())?)
                }
                IFA_LOCAL if has_ip => {
                    msg.local = Some(parse_ip_addr(data, header.ifa_family).map_err(|_| cut())?)
                }
                IFA_LABEL => msg.label = Some(parse_string_from_bytes(data)),
                IFA_FLAGS => msg.flags = Some(get::u32_ne(data).map_err(|_| cut())?),
                _ => {}
            }
        }

        tracing::trace!(
            index = msg.ifindex(),
            address = ?msg.primary_address(),
            scope = %Scope::display(msg.scope()),
            "decoded address"
        );
        Ok(msg)
    }
}
