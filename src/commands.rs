//! CLI command definitions and dispatch

use clap::{Args as ClapArgs, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::bridge::BridgeClient;
use crate::common::config::Config;
use crate::common::{logging, Error, Result};
use crate::side_channel::GSettings;
use crate::steps::{Catalog, Registry};
use crate::testing::{run_feature, RunOptions};

/// Overrides applied on top of the config file
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct Overrides {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Accessibility bridge executable
    #[arg(long, global = true)]
    pub bridge: Option<PathBuf>,

    /// Translation catalog (YAML)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run feature files against the application
    Run {
        /// Feature files to run
        #[arg(required = true)]
        features: Vec<PathBuf>,

        /// Only run scenarios with this tag (repeatable)
        #[arg(long = "tags", short = 't')]
        tags: Vec<String>,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,

        /// Also write logs to the run log file
        #[arg(long)]
        log_file: bool,
    },

    /// List the known step phrases
    Steps,

    /// Show which step a phrase resolves to
    Resolve {
        /// Phrase, e.g. 'image size is 800x600'
        phrase: String,
    },
}

/// Load the config and apply command-line overrides
pub fn load_config(overrides: &Overrides) -> Result<Config> {
    let mut config = match &overrides.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(bridge) = &overrides.bridge {
        config.bridge.path = bridge.clone();
    }
    if let Some(catalog) = &overrides.catalog {
        config.locale.catalog = Some(catalog.clone());
    }
    Ok(config)
}

/// Run a command; returns whether everything passed
pub fn dispatch(command: Commands, overrides: &Overrides) -> Result<bool> {
    match command {
        Commands::Run {
            features,
            tags,
            verbose,
            log_file,
        } => {
            if log_file {
                if let Some(path) = logging::init_with_file(verbose) {
                    eprintln!("Logging to {}", path.display());
                }
            } else {
                logging::init_cli(verbose);
            }
            run(&features, tags, verbose, overrides)
        }
        Commands::Steps => {
            logging::init_cli(false);
            list_steps()
        }
        Commands::Resolve { phrase } => {
            logging::init_cli(false);
            resolve(&phrase)
        }
    }
}

fn run(
    features: &[PathBuf],
    tags: Vec<String>,
    verbose: bool,
    overrides: &Overrides,
) -> Result<bool> {
    let config = load_config(overrides)?;
    let registry = Registry::with_defaults()?;
    let catalog = match &config.locale.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::identity(),
    };
    let settings = GSettings::new(&config.side_channel.gsettings);

    let bridge_path = config.bridge.resolve_path();
    tracing::info!(bridge = %bridge_path.display(), "starting accessibility bridge");
    let mut driver = BridgeClient::spawn(&bridge_path, &config.bridge.args)?;

    let options = RunOptions {
        config: &config,
        registry: &registry,
        catalog: &catalog,
        settings: &settings,
        tags,
        verbose,
    };

    let mut all_passed = true;
    for path in features {
        match run_feature(path, &mut driver, &options) {
            Ok(result) => all_passed &= result.passed,
            Err(e @ (Error::FeatureParse { .. } | Error::FileRead { .. })) => {
                println!("{} {}", "✗".red(), e);
                all_passed = false;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(all_passed)
}

fn list_steps() -> Result<bool> {
    let registry = Registry::with_defaults()?;
    for step in registry.steps() {
        let kind = format!("{:<10}", step.kind().to_string());
        println!("{} {}", kind.dimmed(), step.template());
    }
    Ok(true)
}

fn resolve(phrase: &str) -> Result<bool> {
    let registry = Registry::with_defaults()?;
    match registry.resolve(phrase) {
        Ok(resolved) => {
            println!(
                "{} {}",
                "✓".green(),
                resolved.step.template().white().bold()
            );
            for (name, value) in resolved.args.iter() {
                println!("  {} = {}", name.cyan(), value);
            }
            Ok(true)
        }
        Err(
            e @ (Error::NoMatchingStep(_)
            | Error::AmbiguousStep { .. }
            | Error::TypeMismatch { .. }
            | Error::InvalidEnumValue { .. }),
        ) => {
            println!("{} {}", "✗".red(), e);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
