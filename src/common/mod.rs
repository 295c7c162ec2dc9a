//! Common utilities shared by the engine, the CLI and the mock bridge

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};
