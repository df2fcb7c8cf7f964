//! Async rtnetlink client for Linux.
//!
//! Covers what interface correlation needs: dumping links and addresses,
//! fetching a single link by index, and decoding the replies strictly.
//!
//! # Example
//!
//! ```ignore
//! use nspeer::netlink::Connection;
//!
//! let conn = Connection::new()?;
//! for link in conn.get_links().await? {
//!     println!("{}: {:?} peer={:?}", link.ifindex(), link.name(), link.link);
//! }
//! ```

pub mod attr;
mod builder;
pub mod connection;
mod error;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod message;
pub mod messages;
pub mod namespace;
pub mod parse;
pub mod socket;
pub mod types;

pub use builder::MessageBuilder;
pub use connection::Connection;
pub use error::{Error, Result};
pub use socket::NetlinkSocket;
