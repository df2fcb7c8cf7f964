//! Selection criteria for interfaces and addresses.
//!
//! A [`MatchFilter`] is a plain value built with consuming setters and
//! passed into every correlation call. Matching follows the `ip address`
//! listing filter: family, masked scope, masked flags, label glob, exact
//! prefix and interface index. An interface name glob narrows the
//! interfaces considered, like `ip address show dev`.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use globset::{Glob, GlobMatcher};

use crate::error::{Error, Result};
use crate::snapshot::{AddressRecord, Family, InterfaceRecord};

/// An address prefix, `10.0.0.0/24` or a bare address (full length).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix {
    address: IpAddr,
    len: u8,
}

impl Prefix {
    /// Create a prefix, rejecting lengths longer than the address.
    pub fn new(address: IpAddr, len: u8) -> Result<Self> {
        if len > max_len(&address) {
            return Err(Error::InvalidTarget(format!(
                "prefix length {} too long for {}",
                len, address
            )));
        }
        Ok(Self { address, len })
    }

    /// A prefix matching exactly one address.
    pub fn host(address: IpAddr) -> Self {
        Self {
            len: max_len(&address),
            address,
        }
    }

    /// The prefix address.
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// The prefix length in bits.
    pub fn len(&self) -> u8 {
        self.len
    }

    /// Check if `addr` is the same family and agrees on the first `len` bits.
    pub fn contains(&self, addr: &IpAddr) -> bool {
        match (self.address, addr) {
            (IpAddr::V4(p), IpAddr::V4(a)) => {
                let mask = mask_u32(self.len);
                u32::from(p) & mask == u32::from(*a) & mask
            }
            (IpAddr::V6(p), IpAddr::V6(a)) => {
                let mask = mask_u128(self.len);
                u128::from(p) & mask == u128::from(*a) & mask
            }
            _ => false,
        }
    }
}

impl FromStr for Prefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidTarget(format!("invalid prefix '{}'", s));
        match s.split_once('/') {
            Some((addr, len)) => {
                let address: IpAddr = addr.parse().map_err(|_| invalid())?;
                let len: u8 = len.parse().map_err(|_| invalid())?;
                Self::new(address, len)
            }
            None => Ok(Self::host(s.parse().map_err(|_| invalid())?)),
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.len)
    }
}

fn max_len(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn mask_u32(len: u8) -> u32 {
    if len == 0 { 0 } else { u32::MAX << (32 - len as u32) }
}

fn mask_u128(len: u8) -> u128 {
    if len == 0 { 0 } else { u128::MAX << (128 - len as u32) }
}

/// Selection criteria for (interface, address) pairs.
#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    family: Family,
    scope: u8,
    scope_mask: u8,
    flags: u32,
    flag_mask: u32,
    name: Option<GlobMatcher>,
    label: Option<GlobMatcher>,
    prefix: Option<Prefix>,
    ifindex: Option<i32>,
}

impl MatchFilter {
    /// A filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter keyed only on address equality.
    pub fn for_address(address: IpAddr) -> Self {
        Self::new().prefix(Prefix::host(address))
    }

    /// Link-only filter keyed on an interface name glob.
    ///
    /// Addresses play no part: an interface whose addresses carry other
    /// labels (`eth0:1`) still matches `eth0`.
    pub fn for_device(pattern: &str) -> Result<Self> {
        Self::new().family(Family::Packet).name(pattern)
    }

    /// Restrict to one address family.
    pub fn family(mut self, family: Family) -> Self {
        self.family = family;
        self
    }

    /// Require exactly this scope.
    pub fn scope(self, scope: u8) -> Self {
        self.scope_masked(scope, 0xff)
    }

    /// Require `(address.scope ^ scope) & mask == 0`.
    pub fn scope_masked(mut self, scope: u8, mask: u8) -> Self {
        self.scope = scope;
        self.scope_mask = mask;
        self
    }

    /// Require `(address.flags ^ flags) & mask == 0`.
    pub fn flags_masked(mut self, flags: u32, mask: u32) -> Self {
        self.flags = flags;
        self.flag_mask = mask;
        self
    }

    /// Only consider interfaces whose name matches a glob.
    pub fn name(mut self, pattern: &str) -> Result<Self> {
        self.name = Some(Glob::new(pattern)?.compile_matcher());
        Ok(self)
    }

    /// Match the address label (or interface name) against a glob.
    pub fn label(mut self, pattern: &str) -> Result<Self> {
        self.label = Some(Glob::new(pattern)?.compile_matcher());
        Ok(self)
    }

    /// Require the address to fall within a prefix. Also pins the family.
    pub fn prefix(mut self, prefix: Prefix) -> Self {
        self.family = Family::of(&prefix.address());
        self.prefix = Some(prefix);
        self
    }

    /// Only consider the interface with this index.
    pub fn ifindex(mut self, index: i32) -> Self {
        self.ifindex = Some(index);
        self
    }

    /// The family restriction.
    pub fn get_family(&self) -> Family {
        self.family
    }

    /// The interface index restriction.
    pub fn get_ifindex(&self) -> Option<i32> {
        self.ifindex
    }

    /// Check if the filter only asks about links (AF_PACKET).
    pub fn is_link_only(&self) -> bool {
        self.family == Family::Packet
    }

    /// Check if the filter accepts interfaces that own no address.
    pub fn accepts_bare_links(&self) -> bool {
        matches!(self.family, Family::Unspec | Family::Packet)
    }

    /// Check if the interface passes the index and name restrictions.
    pub fn matches_interface(&self, iface: &InterfaceRecord) -> bool {
        self.ifindex.is_none_or(|i| i == iface.index)
            && self.name.as_ref().is_none_or(|glob| glob.is_match(&iface.name))
    }

    /// Check a link on its own, with the label glob applied to its name.
    pub fn matches_link(&self, iface: &InterfaceRecord) -> bool {
        self.matches_interface(iface) && self.label_matches(&iface.name)
    }

    /// Check an address owned by `iface`.
    pub fn matches_address(&self, iface: &InterfaceRecord, addr: &AddressRecord) -> bool {
        if self.family != Family::Unspec && addr.family != self.family {
            return false;
        }
        if (self.scope ^ addr.scope) & self.scope_mask != 0 {
            return false;
        }
        if (self.flags ^ addr.flags) & self.flag_mask != 0 {
            return false;
        }
        if !self.label_matches(addr.label.as_deref().unwrap_or(&iface.name)) {
            return false;
        }
        if let Some(prefix) = &self.prefix {
            match &addr.address {
                Some(a) if prefix.contains(a) => {}
                _ => return false,
            }
        }
        true
    }

    fn label_matches(&self, name: &str) -> bool {
        self.label.as_ref().is_none_or(|glob| glob.is_match(name))
    }
}
