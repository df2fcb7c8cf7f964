//! Point-in-time view of a namespace's interface and address tables.

use std::fmt;
use std::net::IpAddr;

use crate::netlink::messages::{AddressMessage, LinkMessage};
use crate::netlink::types::link::OperState;

/// Address family of an address record or a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Family {
    /// Any family.
    #[default]
    Unspec,
    /// IPv4 (AF_INET).
    Inet,
    /// IPv6 (AF_INET6).
    Inet6,
    /// Link layer only (AF_PACKET).
    Packet,
    /// Any other family number.
    Other(u8),
}

impl Family {
    /// Map a kernel AF_* value.
    pub fn from_raw(value: u8) -> Self {
        match value {
            0 => Self::Unspec,
            2 => Self::Inet,
            10 => Self::Inet6,
            17 => Self::Packet,
            other => Self::Other(other),
        }
    }

    /// The kernel AF_* value.
    pub fn as_raw(self) -> u8 {
        match self {
            Self::Unspec => 0,
            Self::Inet => 2,
            Self::Inet6 => 10,
            Self::Packet => 17,
            Self::Other(v) => v,
        }
    }

    /// Family of an IP address.
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::Inet,
            IpAddr::V6(_) => Self::Inet6,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspec => write!(f, "unspec"),
            Self::Inet => write!(f, "inet"),
            Self::Inet6 => write!(f, "inet6"),
            Self::Packet => write!(f, "link"),
            Self::Other(v) => write!(f, "family {}", v),
        }
    }
}

/// One network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRecord {
    /// Interface index, unique within one snapshot.
    pub index: i32,
    /// Interface name.
    pub name: String,
    /// Index of the paired interface in the peer's namespace (IFLA_LINK).
    pub peer_index: Option<i32>,
    /// Device flags (IFF_*).
    pub flags: u32,
    /// Operational state.
    pub oper_state: OperState,
    /// Link type kind, e.g. "veth".
    pub kind: Option<String>,
}

impl From<LinkMessage> for InterfaceRecord {
    fn from(msg: LinkMessage) -> Self {
        let index = msg.ifindex();
        let flags = msg.flags();
        Self {
            index,
            name: msg.name.unwrap_or_default(),
            peer_index: msg.link,
            flags,
            oper_state: msg.operstate.unwrap_or_default(),
            kind: msg.kind,
        }
    }
}

/// One address assigned to an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    /// Index of the owning interface.
    pub owner_index: i32,
    /// Address family.
    pub family: Family,
    /// Prefix length.
    pub prefix_len: u8,
    /// Scope (RT_SCOPE_*).
    pub scope: u8,
    /// Address flags (IFA_F_*).
    pub flags: u32,
    /// Address label (IFA_LABEL).
    pub label: Option<String>,
    /// IFA_LOCAL, falling back to IFA_ADDRESS.
    pub address: Option<IpAddr>,
}

impl From<AddressMessage> for AddressRecord {
    fn from(msg: AddressMessage) -> Self {
        Self {
            owner_index: msg.ifindex() as i32,
            family: Family::from_raw(msg.family()),
            prefix_len: msg.prefix_len(),
            scope: msg.scope(),
            flags: msg.all_flags(),
            address: msg.primary_address().copied(),
            label: msg.label,
        }
    }
}

/// Immutable interface and address tables of one namespace.
///
/// Order is kernel dump order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    interfaces: Vec<InterfaceRecord>,
    addresses: Vec<AddressRecord>,
}

impl Snapshot {
    /// Build a snapshot from decoded records.
    pub fn new(interfaces: Vec<InterfaceRecord>, addresses: Vec<AddressRecord>) -> Self {
        Self {
            interfaces,
            addresses,
        }
    }

    /// All interfaces in dump order.
    pub fn interfaces(&self) -> &[InterfaceRecord] {
        &self.interfaces
    }

    /// All addresses in dump order, including any whose owner is missing.
    pub fn addresses(&self) -> &[AddressRecord] {
        &self.addresses
    }

    /// Look up an interface by index.
    pub fn interface(&self, index: i32) -> Option<&InterfaceRecord> {
        self.interfaces.iter().find(|i| i.index == index)
    }

    /// Addresses owned by the given interface index.
    pub fn addresses_of(&self, index: i32) -> impl Iterator<Item = &AddressRecord> {
        self.addresses.iter().filter(move |a| a.owner_index == index)
    }

    /// Check if the snapshot holds no interfaces.
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}
