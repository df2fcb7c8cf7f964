//! Fixed-size rtnetlink family headers and attribute tables.

pub mod addr;
pub mod link;
