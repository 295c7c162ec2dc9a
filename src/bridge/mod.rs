//! Accessibility bridge
//!
//! The toolkit's accessibility API is reached through a separate bridge
//! process. This module holds the wire codec, the message types, and the
//! client that exposes the bridge as a [`Driver`](crate::a11y::Driver).

pub mod client;
pub mod codec;
pub mod protocol;

pub use client::BridgeClient;
