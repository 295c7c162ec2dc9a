//! Scenario runner
//!
//! Runs the scenarios of a feature file one after the other against a
//! driver, printing a line per step.

use std::path::Path;

use colored::Colorize;

use crate::a11y::{Driver, Handle};
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::side_channel::SideChannel;
use crate::steps::block::Phrase;
use crate::steps::{Catalog, Context, Registry};

use super::feature::{parse_feature, Feature, Scenario};

/// Everything a run shares across scenarios
pub struct RunOptions<'a> {
    pub config: &'a Config,
    pub registry: &'a Registry,
    pub catalog: &'a Catalog,
    pub settings: &'a dyn SideChannel,
    /// Only run scenarios carrying one of these tags (all when empty)
    pub tags: Vec<String>,
    /// Show the template each phrase resolved to
    pub verbose: bool,
}

/// Outcome of a single step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Passed,
    Failed(String),
    /// Not run because an earlier step failed
    Skipped,
}

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub text: String,
    pub line: usize,
    pub status: StepStatus,
}

/// Result of one scenario
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub name: String,
    pub steps: Vec<StepOutcome>,
    /// Failure outside any step, e.g. the application did not launch
    pub error: Option<String>,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.error.is_none()
            && self
                .steps
                .iter()
                .all(|step| step.status == StepStatus::Passed)
    }

    /// Message of the first failure, if any
    pub fn failure(&self) -> Option<&str> {
        self.error.as_deref().or_else(|| {
            self.steps.iter().find_map(|step| match &step.status {
                StepStatus::Failed(message) => Some(message.as_str()),
                _ => None,
            })
        })
    }
}

/// Result of a feature run
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub scenarios: Vec<ScenarioResult>,
    /// Scenarios left out by the tag filter
    pub filtered: usize,
}

impl TestResult {
    pub fn scenarios_passed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed()).count()
    }
}

/// Run a feature file
pub fn run_feature(
    path: &Path,
    driver: &mut dyn Driver,
    options: &RunOptions<'_>,
) -> Result<TestResult> {
    let content = Error::read_file(path)?;
    let feature = parse_feature(&content).map_err(|e| match e {
        Error::FeatureParse { line, message } => Error::FeatureParse {
            line,
            message: format!("{}: {}", path.display(), message),
        },
        other => other,
    })?;

    run_parsed(&feature, driver, options)
}

/// Run an already parsed feature
pub fn run_parsed(
    feature: &Feature,
    driver: &mut dyn Driver,
    options: &RunOptions<'_>,
) -> Result<TestResult> {
    println!(
        "\n{} {}",
        "Feature:".blue().bold(),
        feature.name.white().bold()
    );

    let selected: Vec<&Scenario> = feature
        .scenarios
        .iter()
        .filter(|scenario| {
            options.tags.is_empty() || options.tags.iter().any(|tag| scenario.has_tag(tag))
        })
        .collect();
    let filtered = feature.scenarios.len() - selected.len();

    let mut scenarios = Vec::with_capacity(selected.len());
    for scenario in selected {
        scenarios.push(run_scenario(feature, scenario, driver, options));
    }

    let passed = scenarios.iter().all(ScenarioResult::passed);
    let result = TestResult {
        name: feature.name.clone(),
        passed,
        scenarios,
        filtered,
    };

    let summary = format!(
        "{} of {} scenarios passed",
        result.scenarios_passed(),
        result.scenarios.len()
    );
    if result.passed {
        println!("\n{} {}", "✓".green().bold(), summary.green().bold());
    } else {
        println!("\n{} {}", "✗".red().bold(), summary.red().bold());
    }
    if filtered > 0 {
        println!("  {}", format!("{filtered} filtered out by tags").dimmed());
    }

    Ok(result)
}

fn run_scenario(
    feature: &Feature,
    scenario: &Scenario,
    driver: &mut dyn Driver,
    options: &RunOptions<'_>,
) -> ScenarioResult {
    let app = &options.config.application;
    let phrases: Vec<&Phrase> = feature
        .background
        .iter()
        .chain(scenario.steps.iter())
        .collect();

    println!("\n  {} {}", "Scenario:".cyan(), scenario.name.white());
    tracing::info!(scenario = %scenario.name, line = scenario.line, "starting scenario");

    let mut result = ScenarioResult {
        name: scenario.name.clone(),
        steps: Vec::with_capacity(phrases.len()),
        error: None,
    };

    if app.launch_per_scenario {
        if let Err(e) = driver.launch(&app.name) {
            println!("    {} Launch {}: {}", "✗".red(), app.name, e);
            result.error = Some(format!("Failed to launch {}: {}", app.name, e));
            result
                .steps
                .extend(phrases.iter().map(|phrase| skipped(phrase)));
            return result;
        }
    }

    {
        let mut ctx = Context::new(
            options.registry,
            driver,
            options.catalog,
            Handle::application(&app.name),
        )
        .with_settings(options.settings)
        .with_timing(options.config.timing.clone())
        .with_max_depth(options.config.steps.max_depth);

        let mut failed = false;
        for phrase in &phrases {
            if failed {
                println!("    {} {}", "-".dimmed(), phrase.text.dimmed());
                result.steps.push(skipped(phrase));
                continue;
            }

            if options.verbose {
                if let Ok(resolved) = options.registry.resolve(&phrase.text) {
                    println!(
                        "    {}",
                        format!("[{}] {}", resolved.step.kind(), resolved.step.template())
                            .dimmed()
                    );
                }
            }

            let status = match options.registry.run_phrase(&mut ctx, &phrase.text) {
                Ok(()) => {
                    println!("    {} {}", "✓".green(), phrase.text);
                    StepStatus::Passed
                }
                Err(e) => {
                    println!("    {} {}", "✗".red(), phrase.text);
                    println!("      {}", e.to_string().red());
                    tracing::debug!(line = phrase.line, error = %e, "step failed");
                    failed = true;
                    StepStatus::Failed(e.to_string())
                }
            };
            result.steps.push(StepOutcome {
                text: phrase.text.clone(),
                line: phrase.line,
                status,
            });
        }
    }

    if app.launch_per_scenario {
        if let Err(e) = driver.terminate(&app.name) {
            tracing::warn!(app = %app.name, error = %e, "failed to terminate application");
        }
    }

    tracing::info!(
        scenario = %scenario.name,
        passed = result.passed(),
        "finished scenario"
    );
    result
}

fn skipped(phrase: &Phrase) -> StepOutcome {
    StepOutcome {
        text: phrase.text.clone(),
        line: phrase.line,
        status: StepStatus::Skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a11y::memory::{Action, Effect, TreeNode};
    use crate::a11y::{MemoryDriver, Query};
    use crate::common::config::Timing;
    use crate::side_channel::Unavailable;

    fn driver() -> MemoryDriver {
        let app = TreeNode::new("application", "eog").with_child(
            TreeNode::new("frame", "Eye of GNOME")
                .with_child(
                    TreeNode::new("push button", "Fullscreen").on_click(Effect::move_to(
                        Query::role("drawing area"),
                        0,
                        0,
                    )),
                )
                .with_child(TreeNode::new("drawing area", "").with_position(0, 46)),
        );
        MemoryDriver::new(TreeNode::new("desktop", "").with_child(app))
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.timing = Timing::instant();
        config
    }

    const FULLSCREEN: &str = r#"
Feature: Fullscreen
  Background:
    * Select "Eye of GNOME" window

  @fullscreen
  Scenario: Toggle fullscreen
    * Click Fullscreen button on headerbar
    Then application is displayed fullscreen

  Scenario: Broken
    Then application is displayed fullscreen
    * Click Fullscreen button on headerbar
"#;

    #[test]
    fn test_failure_skips_remaining_steps() {
        let registry = Registry::with_defaults().unwrap();
        let config = config();
        let catalog = Catalog::identity();
        let options = RunOptions {
            config: &config,
            registry: &registry,
            catalog: &catalog,
            settings: &Unavailable,
            tags: Vec::new(),
            verbose: false,
        };
        let feature = parse_feature(FULLSCREEN).unwrap();
        let mut driver = driver();

        let result = run_parsed(&feature, &mut driver, &options).unwrap();
        assert!(!result.passed);
        assert_eq!(result.scenarios_passed(), 1);

        let broken = &result.scenarios[1];
        assert_eq!(broken.steps[0].status, StepStatus::Passed);
        assert!(matches!(broken.steps[1].status, StepStatus::Failed(_)));
        assert_eq!(broken.steps[2].status, StepStatus::Skipped);
        assert!(broken
            .failure()
            .unwrap()
            .contains("Application is not displayed fullscreen"));

        // Each scenario starts from a fresh application
        let launches = driver
            .journal()
            .iter()
            .filter(|a| matches!(a, Action::Launch(_)))
            .count();
        let terminations = driver
            .journal()
            .iter()
            .filter(|a| matches!(a, Action::Terminate(_)))
            .count();
        assert_eq!((launches, terminations), (2, 2));
    }

    #[test]
    fn test_tag_filter() {
        let registry = Registry::with_defaults().unwrap();
        let config = config();
        let catalog = Catalog::identity();
        let options = RunOptions {
            config: &config,
            registry: &registry,
            catalog: &catalog,
            settings: &Unavailable,
            tags: vec!["@fullscreen".to_string()],
            verbose: true,
        };
        let feature = parse_feature(FULLSCREEN).unwrap();
        let mut driver = driver();

        let result = run_parsed(&feature, &mut driver, &options).unwrap();
        assert!(result.passed);
        assert_eq!(result.scenarios.len(), 1);
        assert_eq!(result.filtered, 1);
    }

    #[test]
    fn test_unknown_phrase_fails_step() {
        let registry = Registry::with_defaults().unwrap();
        let mut config = config();
        config.application.launch_per_scenario = false;
        let catalog = Catalog::identity();
        let options = RunOptions {
            config: &config,
            registry: &registry,
            catalog: &catalog,
            settings: &Unavailable,
            tags: Vec::new(),
            verbose: false,
        };
        let feature =
            parse_feature("Feature: x\n  Scenario: y\n    * Do a barrel roll\n").unwrap();
        let mut driver = driver();

        let result = run_parsed(&feature, &mut driver, &options).unwrap();
        assert!(!result.passed);
        assert!(result.scenarios[0]
            .failure()
            .unwrap()
            .contains("Do a barrel roll"));
        assert!(driver.journal().is_empty());
    }
}
