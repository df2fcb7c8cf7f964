//! nspeer show command implementation.
//!
//! Lists host interfaces and their addresses, `ip address` style, for
//! everything that passes a [`MatchFilter`].

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Args;
use nspeer::correlate::{Selection, select};
use nspeer::netlink::Connection;
use nspeer::netlink::types::addr::{Scope, ifa_flags};
use nspeer::netlink::types::link::iff;
use nspeer::{AddressRecord, Family, MatchFilter, Prefix, enumerate};

#[derive(Args)]
pub struct ShowCmd {
    /// IPv4 addresses only.
    #[arg(short = '4', conflicts_with_all = ["ipv6", "link"])]
    ipv4: bool,

    /// IPv6 addresses only.
    #[arg(short = '6', conflicts_with = "link")]
    ipv6: bool,

    /// Links only, without addresses.
    #[arg(long)]
    link: bool,

    /// Interface name glob.
    #[arg(long)]
    dev: Option<String>,

    /// Address label glob (interface name for unlabelled addresses).
    #[arg(long)]
    label: Option<String>,

    /// Address scope, by name (global, site, link, host) or number.
    #[arg(long)]
    scope: Option<String>,

    /// Addresses within this prefix (e.g., 10.0.0.0/8).
    #[arg(long)]
    to: Option<String>,

    /// Interface index.
    #[arg(long)]
    index: Option<i32>,

    /// Permanent addresses only.
    #[arg(long, conflicts_with = "dynamic")]
    permanent: bool,

    /// Dynamic (non-permanent) addresses only.
    #[arg(long)]
    dynamic: bool,

    /// Primary addresses only.
    #[arg(long, conflicts_with = "secondary")]
    primary: bool,

    /// Secondary addresses only.
    #[arg(long)]
    secondary: bool,
}

impl ShowCmd {
    fn filter(&self) -> anyhow::Result<MatchFilter> {
        let mut filter = MatchFilter::new();

        if let Some(to) = &self.to {
            filter = filter.prefix(to.parse::<Prefix>()?);
        }
        let family = match (self.ipv4, self.ipv6, self.link) {
            (true, _, _) => Some(Family::Inet),
            (_, true, _) => Some(Family::Inet6),
            (_, _, true) => Some(Family::Packet),
            _ => None,
        };
        if let Some(family) = family {
            filter = filter.family(family);
        }

        if let Some(dev) = &self.dev {
            filter = filter.name(dev)?;
        }
        if let Some(label) = &self.label {
            filter = filter.label(label)?;
        }
        if let Some(scope) = &self.scope {
            filter = filter.scope(parse_scope(scope)?);
        }
        if let Some(index) = self.index {
            filter = filter.ifindex(index);
        }

        let (mut flags, mut mask) = (0, 0);
        if self.permanent || self.dynamic {
            mask |= ifa_flags::PERMANENT;
            if self.permanent {
                flags |= ifa_flags::PERMANENT;
            }
        }
        if self.primary || self.secondary {
            mask |= ifa_flags::SECONDARY;
            if self.secondary {
                flags |= ifa_flags::SECONDARY;
            }
        }
        Ok(filter.flags_masked(flags, mask))
    }

    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let filter = self.filter()?;
        let conn = Connection::new()?;
        let snapshot = enumerate(&conn, &filter).await?;

        let mut stdout = io::stdout().lock();
        for selection in select(&snapshot, &filter) {
            print_selection(&mut stdout, &selection)?;
        }
        Ok(ExitCode::SUCCESS)
    }
}

fn parse_scope(s: &str) -> anyhow::Result<u8> {
    if let Some(scope) = Scope::from_name(s) {
        return Ok(scope as u8);
    }
    s.parse()
        .map_err(|_| anyhow::anyhow!("invalid scope '{}'", s))
}

fn print_selection<W: Write>(w: &mut W, selection: &Selection<'_>) -> io::Result<()> {
    let iface = selection.interface;

    write!(w, "{}: {}", iface.index, iface.name)?;
    if let Some(peer) = iface.peer_index {
        write!(w, "@if{}", peer)?;
    }
    write!(
        w,
        ": <{}> state {}",
        iff::names(iface.flags),
        iface.oper_state.name()
    )?;
    if let Some(kind) = &iface.kind {
        write!(w, " kind {}", kind)?;
    }
    writeln!(w)?;

    for addr in &selection.addresses {
        print_addr(w, addr)?;
    }
    Ok(())
}

fn print_addr<W: Write>(w: &mut W, addr: &AddressRecord) -> io::Result<()> {
    let shown = addr
        .address
        .map(|a| a.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    write!(w, "    {} {}/{}", addr.family, shown, addr.prefix_len)?;
    write!(w, " scope {}", Scope::display(addr.scope))?;

    if addr.flags & ifa_flags::SECONDARY != 0 {
        write!(w, " secondary")?;
    }
    if addr.flags & ifa_flags::PERMANENT == 0 {
        write!(w, " dynamic")?;
    }
    if addr.flags & ifa_flags::DEPRECATED != 0 {
        write!(w, " deprecated")?;
    }
    if addr.flags & ifa_flags::TENTATIVE != 0 {
        write!(w, " tentative")?;
    }
    if let Some(label) = &addr.label {
        write!(w, " {}", label)?;
    }
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use nspeer::InterfaceRecord;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        show: ShowCmd,
    }

    fn parse(args: &[&str]) -> ShowCmd {
        let mut argv = vec!["show"];
        argv.extend_from_slice(args);
        Wrapper::parse_from(argv).show
    }

    #[test]
    fn test_parse_scope() {
        assert_eq!(parse_scope("link").unwrap(), Scope::Link as u8);
        assert_eq!(parse_scope("200").unwrap(), 200);
        assert!(parse_scope("galaxy").is_err());
    }

    #[test]
    fn test_filter_from_flags() {
        let filter = parse(&["-6", "--index", "3"]).filter().unwrap();
        assert_eq!(filter.get_family(), Family::Inet6);
        assert_eq!(filter.get_ifindex(), Some(3));

        let filter = parse(&["--link"]).filter().unwrap();
        assert!(filter.is_link_only());

        let filter = parse(&["--to", "10.0.0.0/8"]).filter().unwrap();
        assert_eq!(filter.get_family(), Family::Inet);
    }

    #[test]
    fn test_filter_rejects_bad_input() {
        assert!(parse(&["--to", "10.0.0.0/40"]).filter().is_err());
        assert!(parse(&["--dev", "eth[0"]).filter().is_err());
        assert!(parse(&["--label", "eth[0"]).filter().is_err());
        assert!(parse(&["--scope", "galaxy"]).filter().is_err());
    }

    #[test]
    fn test_dev_selects_by_interface_name() {
        let iface = |index, name: &str| InterfaceRecord {
            index,
            name: name.to_string(),
            peer_index: None,
            flags: 0,
            oper_state: Default::default(),
            kind: None,
        };
        let alias = AddressRecord {
            owner_index: 2,
            family: Family::Inet,
            prefix_len: 24,
            scope: 0,
            flags: ifa_flags::PERMANENT,
            label: Some("eth0:1".to_string()),
            address: Some("10.0.0.5".parse().unwrap()),
        };

        let filter = parse(&["--dev", "eth0"]).filter().unwrap();
        assert!(filter.matches_interface(&iface(2, "eth0")));
        assert!(!filter.matches_interface(&iface(3, "eth1")));
        assert!(filter.matches_address(&iface(2, "eth0"), &alias));

        let filter = parse(&["--label", "eth0"]).filter().unwrap();
        assert!(!filter.matches_address(&iface(2, "eth0"), &alias));
    }

    #[test]
    fn test_print_addr() {
        let addr = AddressRecord {
            owner_index: 2,
            family: Family::Inet,
            prefix_len: 24,
            scope: 0,
            flags: ifa_flags::PERMANENT,
            label: Some("eth0".to_string()),
            address: Some("10.0.0.5".parse().unwrap()),
        };
        let mut out = Vec::new();
        print_addr(&mut out, &addr).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "    inet 10.0.0.5/24 scope global eth0\n"
        );
    }
}
