//! a11y-steps - behaviour-driven UI tests over the accessibility tree
//!
//! Runs Gherkin feature files against a desktop application, matching each
//! phrase to a step that drives the application through an accessibility
//! bridge process.

use a11y_steps::commands::{self, Commands, Overrides};
use clap::Parser;

#[derive(Parser)]
#[command(name = "a11y-steps", about = "Accessibility-driven UI test steps")]
#[command(version, long_about = None)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    match commands::dispatch(cli.command, &cli.overrides) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
