//! nspeer command implementations.

pub mod resolve;
pub mod show;
pub mod worker;
