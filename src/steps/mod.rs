//! Step engine
//!
//! Phrases are matched against registered templates, their placeholders are
//! coerced into typed arguments, and the bound function runs against a
//! scenario [`Context`]. Composite steps feed blocks of sub-phrases back
//! through the same registry.

pub mod block;
pub mod common;
pub mod context;
pub mod poll;
pub mod registry;
pub mod translate;
pub mod viewer;

pub use context::Context;
pub use poll::{poll_until, RetryBudget};
pub use registry::{ArgValue, Args, Registry, StepDef, StepKind};
pub use translate::Catalog;
