//! Captured and synthesized rtnetlink payloads for decoder tests.
//!
//! Payloads start at the family header (ifinfomsg/ifaddrmsg); the nlmsghdr
//! is added by [`message`] where a test needs full framing.

use super::attr::{NLA_F_NESTED, nla_align};
use super::message::{NLMSG_HDRLEN, NlMsgHdr};

/// Link message for the loopback interface.
pub fn link_loopback() -> Vec<u8> {
    vec![
        // ifinfomsg: family=0, type=772 (ARPHRD_LOOPBACK), index=1,
        // flags=0x49 (UP|LOOPBACK|RUNNING), change=0
        0x00, 0x00, // family, pad
        0x04, 0x03, // type = 772 (ARPHRD_LOOPBACK)
        0x01, 0x00, 0x00, 0x00, // index = 1
        0x49, 0x00, 0x00, 0x00, // flags = IFF_UP | IFF_LOOPBACK | IFF_RUNNING
        0x00, 0x00, 0x00, 0x00, // change = 0
        // IFLA_IFNAME = "lo"
        0x07, 0x00, // len = 7
        0x03, 0x00, // type = IFLA_IFNAME (3)
        b'l', b'o', 0x00, 0x00, // "lo\0" + padding
        // IFLA_OPERSTATE = 0 (UNKNOWN)
        0x05, 0x00, // len = 5
        0x10, 0x00, // type = IFLA_OPERSTATE (16)
        0x00, 0x00, 0x00, 0x00, // operstate = 0 + padding
    ]
}

/// Address message for IPv4 loopback address 127.0.0.1/8.
pub fn addr_loopback_v4() -> Vec<u8> {
    vec![
        // ifaddrmsg: family=AF_INET, prefixlen=8, flags=0x80 (IFA_F_PERMANENT),
        // scope=RT_SCOPE_HOST, index=1
        0x02, // family = AF_INET
        0x08, // prefixlen = 8
        0x80, // flags = IFA_F_PERMANENT
        0xfe, // scope = RT_SCOPE_HOST (254)
        0x01, 0x00, 0x00, 0x00, // index = 1
        // IFA_ADDRESS = 127.0.0.1
        0x08, 0x00, // len = 8
        0x01, 0x00, // type = IFA_ADDRESS (1)
        0x7f, 0x00, 0x00, 0x01, // 127.0.0.1
        // IFA_LOCAL = 127.0.0.1
        0x08, 0x00, // len = 8
        0x02, 0x00, // type = IFA_LOCAL (2)
        0x7f, 0x00, 0x00, 0x01, // 127.0.0.1
        // IFA_LABEL = "lo"
        0x07, 0x00, // len = 7
        0x03, 0x00, // type = IFA_LABEL (3)
        b'l', b'o', 0x00, 0x00, // "lo\0" + padding
    ]
}

/// Address message for IPv6 loopback address ::1/128.
pub fn addr_loopback_v6() -> Vec<u8> {
    vec![
        // ifaddrmsg: family=AF_INET6, prefixlen=128, flags=0x80 (IFA_F_PERMANENT),
        // scope=RT_SCOPE_HOST, index=1
        0x0a, // family = AF_INET6
        0x80, // prefixlen = 128
        0x80, // flags = IFA_F_PERMANENT
        0xfe, // scope = RT_SCOPE_HOST (254)
        0x01, 0x00, 0x00, 0x00, // index = 1
        // IFA_ADDRESS = ::1
        0x14, 0x00, // len = 20
        0x01, 0x00, // type = IFA_ADDRESS (1)
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // ::1 (first 8 bytes)
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, // ::1 (last 8 bytes)
        // IFA_FLAGS = IFA_F_PERMANENT | IFA_F_NODAD
        0x08, 0x00, // len = 8
        0x08, 0x00, // type = IFA_FLAGS (8)
        0x82, 0x00, 0x00, 0x00, // flags = 0x82
    ]
}

/// Link message for one end of a veth pair.
///
/// Attribute order: IFLA_IFNAME, IFLA_OPERSTATE (UP), IFLA_LINKINFO
/// {IFLA_INFO_KIND "veth"}, IFLA_LINK.
pub fn link_veth(index: i32, name: &str, peer: i32) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&[0x00, 0x00, 0x01, 0x00]); // family, pad, type = ARPHRD_ETHER
    buf.extend_from_slice(&index.to_ne_bytes());
    buf.extend_from_slice(&0x11043u32.to_ne_bytes()); // UP|BROADCAST|RUNNING|MULTICAST|LOWER_UP
    buf.extend_from_slice(&0u32.to_ne_bytes());

    let mut ifname = name.as_bytes().to_vec();
    ifname.push(0);
    push_attr(&mut buf, 3, &ifname);
    push_attr(&mut buf, 16, &[6]);

    let mut info = Vec::new();
    push_attr(&mut info, 1, b"veth\0");
    push_attr(&mut buf, 18 | NLA_F_NESTED, &info);

    push_attr(&mut buf, 5, &peer.to_ne_bytes());
    buf
}

/// Link message for an interface without a peer link (e.g. a bridge).
pub fn link_plain(index: i32, name: &str, kind: Option<&str>) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&[0x00, 0x00, 0x01, 0x00]);
    buf.extend_from_slice(&index.to_ne_bytes());
    buf.extend_from_slice(&0x1003u32.to_ne_bytes()); // UP|BROADCAST|MULTICAST
    buf.extend_from_slice(&0u32.to_ne_bytes());

    let mut ifname = name.as_bytes().to_vec();
    ifname.push(0);
    push_attr(&mut buf, 3, &ifname);
    push_attr(&mut buf, 16, &[2]);
    if let Some(kind) = kind {
        let mut value = kind.as_bytes().to_vec();
        value.push(0);
        let mut info = Vec::new();
        push_attr(&mut info, 1, &value);
        push_attr(&mut buf, 18 | NLA_F_NESTED, &info);
    }
    buf
}

/// Link message whose IFLA_IFNAME carries raw bytes, valid UTF-8 or not.
pub fn link_named(index: i32, name: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&[0x00, 0x00, 0x01, 0x00]);
    buf.extend_from_slice(&index.to_ne_bytes());
    buf.extend_from_slice(&0x1003u32.to_ne_bytes());
    buf.extend_from_slice(&0u32.to_ne_bytes());

    let mut ifname = name.to_vec();
    ifname.push(0);
    push_attr(&mut buf, 3, &ifname);
    buf
}

/// Address message for an IPv4 address with IFA_LOCAL and IFA_ADDRESS set.
pub fn addr_v4(index: u32, octets: [u8; 4], prefix_len: u8, label: Option<&str>) -> Vec<u8> {
    let mut buf = vec![0x02, prefix_len, 0x80, 0x00]; // AF_INET, PERMANENT, scope global
    buf.extend_from_slice(&index.to_ne_bytes());
    push_attr(&mut buf, 1, &octets);
    push_attr(&mut buf, 2, &octets);
    if let Some(label) = label {
        let mut value = label.as_bytes().to_vec();
        value.push(0);
        push_attr(&mut buf, 3, &value);
    }
    buf
}

/// Wrap a payload in an nlmsghdr of the given type, flags and sequence.
pub fn message(msg_type: u16, flags: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
    let mut hdr = NlMsgHdr::new(msg_type, flags);
    hdr.nlmsg_len = (NLMSG_HDRLEN + payload.len()) as u32;
    hdr.nlmsg_seq = seq;
    let mut buf = hdr.as_bytes().to_vec();
    buf.extend_from_slice(payload);
    buf.resize(nla_align(buf.len()), 0);
    buf
}

fn push_attr(buf: &mut Vec<u8>, kind: u16, payload: &[u8]) {
    let len = (4 + payload.len()) as u16;
    buf.extend_from_slice(&len.to_ne_bytes());
    buf.extend_from_slice(&kind.to_ne_bytes());
    buf.extend_from_slice(payload);
    buf.resize(nla_align(buf.len()), 0);
}
