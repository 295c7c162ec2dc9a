//! Feature runner
//!
//! Reads Gherkin feature files and runs their scenarios through the step
//! registry, reporting a pass, fail or skip for every step.

pub mod feature;
mod runner;

pub use feature::{parse_feature, Feature, Scenario};
pub use runner::{
    run_feature, run_parsed, RunOptions, ScenarioResult, StepOutcome, StepStatus, TestResult,
};
