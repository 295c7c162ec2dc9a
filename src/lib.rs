//! a11y-steps - behaviour-driven UI tests over the accessibility tree
//!
//! This library provides the step engine (phrase matching, scenario context,
//! polling), the image viewer step library, and the plumbing to run feature
//! files against an application through an accessibility bridge.

pub mod a11y;
pub mod bridge;
pub mod commands;
pub mod common;
pub mod side_channel;
pub mod steps;
pub mod testing;

// Re-export commonly used types for tests
pub use a11y::{Driver, Handle, Query};
pub use common::{Error, Result};
pub use steps::{Context, Registry};
