//! Feature file loading
//!
//! Files are parsed by the `gherkin` crate, then flattened into the shape
//! the runner needs: a background, and scenarios with outlines expanded one
//! per example row.
//!
//! ```text
//! @about
//! Feature: About dialog
//!
//!   Background:
//!     * Select "Eye of GNOME" window
//!
//!   Scenario Outline: Open a file
//!     * Open "<file>" via menu
//!     Then image size is <size>
//!
//!     Examples:
//!       | file           | size    |
//!       | ~/gnome.png    | 300x300 |
//! ```

use gherkin::GherkinEnv;

use crate::common::{Error, Result};
use crate::steps::block::{Keyword, Phrase};

/// A parsed feature file
#[derive(Debug, Clone, Default)]
pub struct Feature {
    pub name: String,
    /// Tags on the feature, inherited by every scenario
    pub tags: Vec<String>,
    /// Steps run before each scenario
    pub background: Vec<Phrase>,
    /// Scenarios in file order, outlines expanded one per example row
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub name: String,
    /// Tags without the leading `@`
    pub tags: Vec<String>,
    /// Line of the `Scenario:` header
    pub line: usize,
    pub steps: Vec<Phrase>,
}

impl Scenario {
    /// Whether the scenario carries a tag, given with or without `@`
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim_start_matches('@');
        self.tags.iter().any(|t| t == tag)
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> Error {
    Error::FeatureParse {
        line,
        message: message.into(),
    }
}

/// Turn a gherkin error into `FeatureParse`, keeping the `line:col` the
/// grammar reports somewhere in its source chain
fn syntax_error(err: &(dyn std::error::Error + 'static)) -> Error {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    let line = regex::Regex::new(r"(\d+):\d+")
        .ok()
        .and_then(|re| re.captures(&message))
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(1);
    parse_error(line, message)
}

fn keyword(step: &gherkin::Step) -> Keyword {
    match step.keyword.trim() {
        "Given" => Keyword::Given,
        "When" => Keyword::When,
        "Then" => Keyword::Then,
        "And" => Keyword::And,
        "But" => Keyword::But,
        _ => Keyword::Bullet,
    }
}

fn phrases(steps: &[gherkin::Step]) -> Vec<Phrase> {
    steps
        .iter()
        .map(|step| Phrase {
            keyword: keyword(step),
            text: step.value.trim().to_string(),
            line: step.position.line,
        })
        .collect()
}

fn strip_tags(tags: &[String]) -> impl Iterator<Item = String> + '_ {
    tags.iter().map(|tag| tag.trim_start_matches('@').to_string())
}

/// Parse a feature file
pub fn parse_feature(text: &str) -> Result<Feature> {
    let parsed =
        gherkin::Feature::parse(text, GherkinEnv::default()).map_err(|e| syntax_error(&e))?;

    let mut feature = Feature {
        name: parsed.name.trim().to_string(),
        tags: strip_tags(&parsed.tags).collect(),
        background: parsed
            .background
            .as_ref()
            .map(|background| phrases(&background.steps))
            .unwrap_or_default(),
        scenarios: Vec::new(),
    };

    for scenario in &parsed.scenarios {
        expand(&mut feature.scenarios, scenario, &feature.tags, &[])?;
    }

    // Rules carry their own tags and background on top of the feature's
    for rule in &parsed.rules {
        let mut tags = feature.tags.clone();
        tags.extend(strip_tags(&rule.tags));
        let background = rule
            .background
            .as_ref()
            .map(|background| phrases(&background.steps))
            .unwrap_or_default();
        for scenario in &rule.scenarios {
            expand(&mut feature.scenarios, scenario, &tags, &background)?;
        }
    }

    Ok(feature)
}

/// Push a scenario, or one scenario per example row for an outline
fn expand(
    out: &mut Vec<Scenario>,
    scenario: &gherkin::Scenario,
    inherited: &[String],
    prelude: &[Phrase],
) -> Result<()> {
    let line = scenario.position.line;
    let name = scenario.name.trim();
    let mut tags = inherited.to_vec();
    tags.extend(strip_tags(&scenario.tags));

    let mut steps = prelude.to_vec();
    steps.extend(phrases(&scenario.steps));

    let outline = scenario.keyword.contains("Outline") || scenario.keyword.contains("Template");
    if scenario.examples.is_empty() {
        if outline {
            return Err(parse_error(
                line,
                format!("Scenario Outline '{name}' has no examples"),
            ));
        }
        out.push(Scenario {
            name: name.to_string(),
            tags,
            line,
            steps,
        });
        return Ok(());
    }

    let before = out.len();
    for examples in &scenario.examples {
        let Some(table) = Option::<&gherkin::Table>::from(&examples.table) else {
            continue;
        };
        let Some((header, rows)) = table.rows.split_first() else {
            continue;
        };

        let mut example_tags = tags.clone();
        example_tags.extend(strip_tags(&examples.tags));

        for (i, row) in rows.iter().enumerate() {
            if row.len() != header.len() {
                return Err(parse_error(
                    table.position.line + i + 1,
                    format!("Expected {} cells, got {}", header.len(), row.len()),
                ));
            }

            let substitute = |text: &str| {
                header
                    .iter()
                    .zip(row)
                    .fold(text.to_string(), |acc, (column, value)| {
                        acc.replace(&format!("<{column}>"), value)
                    })
            };
            let values: Vec<String> = header
                .iter()
                .zip(row)
                .map(|(column, value)| format!("{column}={value}"))
                .collect();

            out.push(Scenario {
                name: format!("{} ({})", substitute(name), values.join(", ")),
                tags: example_tags.clone(),
                line,
                steps: steps
                    .iter()
                    .map(|phrase| Phrase {
                        text: substitute(&phrase.text),
                        ..phrase.clone()
                    })
                    .collect(),
            });
        }
    }

    if out.len() == before {
        return Err(parse_error(
            line,
            format!("Scenario Outline '{name}' has no example rows"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABOUT: &str = r#"# Comments and blank lines are ignored
@about
Feature: About dialog
  Checks the credits page.

  Background:
    * Select "Eye of GNOME" window

  @smoke
  Scenario: Open About dialog
    * Open About dialog
    Then Website link to wiki is displayed
    And GPL 2.0 link is displayed

  Scenario: Close it again
    * Open and close About dialog
"#;

    #[test]
    fn test_feature_with_background_and_tags() {
        let feature = parse_feature(ABOUT).unwrap();
        assert_eq!(feature.name, "About dialog");
        assert_eq!(feature.tags, vec!["about"]);
        assert_eq!(feature.background.len(), 1);
        assert_eq!(feature.background[0].text, "Select \"Eye of GNOME\" window");
        assert_eq!(feature.background[0].line, 7);

        assert_eq!(feature.scenarios.len(), 2);
        let first = &feature.scenarios[0];
        assert_eq!(first.name, "Open About dialog");
        assert!(first.has_tag("@smoke"));
        assert!(first.has_tag("about"));
        assert_eq!(first.steps.len(), 3);
        assert_eq!(first.steps[0].keyword, Keyword::Bullet);
        assert_eq!(first.steps[1].keyword, Keyword::Then);
        assert_eq!(first.steps[2].keyword, Keyword::And);
        assert_eq!(first.steps[2].text, "GPL 2.0 link is displayed");
        assert_eq!(first.steps[2].line, 13);

        let second = &feature.scenarios[1];
        assert!(!second.has_tag("smoke"));
        assert!(second.has_tag("about"));
    }

    #[test]
    fn test_outline_expands_examples() {
        let feature = parse_feature(
            r#"Feature: Open files
  Scenario Outline: Open an image
    * Open "<file>" via menu
    Then image size is <size>

    Examples:
      | file                   | size    |
      | ~/Pictures/gnome.png   | 300x300 |
      | ~/Pictures/photo.jpg   | 800x600 |
"#,
        )
        .unwrap();

        assert_eq!(feature.scenarios.len(), 2);
        assert_eq!(
            feature.scenarios[1].steps[0].text,
            "Open \"~/Pictures/photo.jpg\" via menu"
        );
        assert_eq!(feature.scenarios[1].steps[1].text, "image size is 800x600");
        assert_eq!(
            feature.scenarios[0].name,
            "Open an image (file=~/Pictures/gnome.png, size=300x300)"
        );
    }

    #[test]
    fn test_rule_scenarios_inherit_tags() {
        let feature = parse_feature(
            r#"@viewer
Feature: Sidebar

  Rule: Sidebar toggles
    @sidebar
    Scenario: Hidden by default
      Then sidepanel is hidden
"#,
        )
        .unwrap();

        assert_eq!(feature.scenarios.len(), 1);
        assert!(feature.scenarios[0].has_tag("viewer"));
        assert!(feature.scenarios[0].has_tag("sidebar"));
        assert_eq!(feature.scenarios[0].steps[0].text, "sidepanel is hidden");
    }

    fn parse_error_line(text: &str) -> usize {
        match parse_feature(text) {
            Err(Error::FeatureParse { line, .. }) => line,
            other => panic!("Expected FeatureParse, got {other:?}"),
        }
    }

    #[test]
    fn test_outline_errors_carry_line() {
        assert_eq!(
            parse_error_line("Feature: x\n\n  Scenario Outline: y\n    * Open \"<f>\" via menu\n"),
            3
        );
    }

    #[test]
    fn test_syntax_errors_are_feature_parse() {
        assert!(matches!(
            parse_feature("Scenario: no feature"),
            Err(Error::FeatureParse { .. })
        ));
    }

    #[test]
    fn test_syntax_error_line_from_location() {
        let err = parse_error(2, "inner");
        assert!(matches!(err, Error::FeatureParse { line: 2, .. }));

        #[derive(Debug)]
        struct Located;
        impl std::fmt::Display for Located {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "error at 4:7: expected Scenario")
            }
        }
        impl std::error::Error for Located {}

        match syntax_error(&Located) {
            Error::FeatureParse { line, message } => {
                assert_eq!(line, 4);
                assert!(message.contains("expected Scenario"));
            }
            other => panic!("Expected FeatureParse, got {other:?}"),
        }
    }
}
