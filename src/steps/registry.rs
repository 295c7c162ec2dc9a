//! Step registry and phrase matcher
//!
//! A step is registered with a template such as
//! `image size is {width:d}x{height:d}`. Placeholders are `{name}` (any
//! text), `{name:d}` (integer) and `{name:w}` (one word, optionally limited
//! to a fixed set). Literal text must match exactly.

use regex::Regex;
use std::fmt;

use crate::common::{Error, Result};

use super::block::parse_block;
use super::context::Context;

/// Step implementation
pub type StepFn = fn(&mut Context<'_>, &Args) -> Result<()>;

/// Whether a step changes the UI or checks it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Action,
    Assertion,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Action => f.write_str("action"),
            StepKind::Assertion => f.write_str("assertion"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaceholderType {
    Str,
    Int,
    Word,
}

#[derive(Debug, Clone)]
struct Placeholder {
    name: String,
    ty: PlaceholderType,
}

/// Coerced placeholder value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    Word(String),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Str(s) => write!(f, "\"{s}\""),
            ArgValue::Int(n) => write!(f, "{n}"),
            ArgValue::Word(w) => f.write_str(w),
        }
    }
}

/// Arguments extracted from a phrase, in template order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    values: Vec<(String, ArgValue)>,
}

impl Args {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// String placeholder value
    pub fn str(&self, name: &str) -> Result<&str> {
        match self.get(name) {
            Some(ArgValue::Str(s)) => Ok(s),
            other => Err(mismatch(name, "a string", other)),
        }
    }

    /// Integer placeholder value
    pub fn int(&self, name: &str) -> Result<i64> {
        match self.get(name) {
            Some(ArgValue::Int(n)) => Ok(*n),
            other => Err(mismatch(name, "an integer", other)),
        }
    }

    /// Word placeholder value
    pub fn word(&self, name: &str) -> Result<&str> {
        self.opt_word(name)
            .ok_or_else(|| mismatch(name, "a word", self.get(name)))
    }

    /// Word placeholder value, absent when the matched template has no such placeholder
    pub fn opt_word(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(ArgValue::Word(w)) => Some(w),
            _ => None,
        }
    }
}

fn mismatch(name: &str, expected: &str, got: Option<&ArgValue>) -> Error {
    let got = got.map_or_else(|| "<missing>".to_string(), ToString::to_string);
    Error::type_mismatch(name, expected, &got)
}

/// A phrase template bound to its implementation
#[derive(Debug, Clone)]
pub struct StepDef {
    template: String,
    kind: StepKind,
    run: StepFn,
    choices: Vec<(String, Vec<String>)>,
}

impl StepDef {
    pub fn new(kind: StepKind, template: &str, run: StepFn) -> Self {
        Self {
            template: template.to_string(),
            kind,
            run,
            choices: Vec::new(),
        }
    }

    pub fn action(template: &str, run: StepFn) -> Self {
        Self::new(StepKind::Action, template, run)
    }

    pub fn assertion(template: &str, run: StepFn) -> Self {
        Self::new(StepKind::Assertion, template, run)
    }

    /// Limit a `w` placeholder to a fixed set of words
    pub fn choices(mut self, placeholder: &str, words: &[&str]) -> Self {
        self.choices.push((
            placeholder.to_string(),
            words.iter().map(|w| w.to_string()).collect(),
        ));
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    fn allowed(&self, placeholder: &str) -> Option<&[String]> {
        self.choices
            .iter()
            .find(|(name, _)| name == placeholder)
            .map(|(_, words)| words.as_slice())
    }

    /// Run the implementation
    pub fn invoke(&self, ctx: &mut Context<'_>, args: &Args) -> Result<()> {
        (self.run)(ctx, args)
    }
}

struct Entry {
    def: StepDef,
    regex: Regex,
    placeholders: Vec<Placeholder>,
}

impl Entry {
    fn compile(def: StepDef) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidPattern {
            pattern: def.template.clone(),
            reason,
        };

        let mut pattern = String::from("^");
        let mut placeholders: Vec<Placeholder> = Vec::new();
        let mut rest = def.template.as_str();

        while let Some(open) = rest.find('{') {
            let (literal, after) = rest.split_at(open);
            if literal.contains('}') {
                return Err(invalid("unmatched '}'".to_string()));
            }
            pattern.push_str(&regex::escape(literal));

            let close = after
                .find('}')
                .ok_or_else(|| invalid("unclosed placeholder".to_string()))?;
            let body = &after[1..close];

            let (name, ty) = match body.split_once(':') {
                None => (body, PlaceholderType::Str),
                Some((name, "d")) => (name, PlaceholderType::Int),
                Some((name, "w")) => (name, PlaceholderType::Word),
                Some((_, other)) => {
                    return Err(invalid(format!("unknown placeholder type '{other}'")))
                }
            };

            if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(invalid(format!("bad placeholder name '{name}'")));
            }
            if placeholders.iter().any(|p| p.name == name) {
                return Err(invalid(format!("placeholder '{name}' used twice")));
            }

            pattern.push_str(match ty {
                PlaceholderType::Word => r"(\S+)",
                PlaceholderType::Str | PlaceholderType::Int => "(.+?)",
            });
            placeholders.push(Placeholder {
                name: name.to_string(),
                ty,
            });
            rest = &after[close + 1..];
        }

        if rest.contains('}') {
            return Err(invalid("unmatched '}'".to_string()));
        }
        pattern.push_str(&regex::escape(rest));
        pattern.push('$');

        for (name, _) in &def.choices {
            let is_word = placeholders
                .iter()
                .any(|p| &p.name == name && p.ty == PlaceholderType::Word);
            if !is_word {
                return Err(invalid(format!(
                    "choices given for '{name}', which is not a word placeholder"
                )));
            }
        }

        let regex = Regex::new(&pattern).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            def,
            regex,
            placeholders,
        })
    }

    fn coerce(&self, captures: &regex::Captures<'_>) -> Result<Args> {
        let mut values = Vec::with_capacity(self.placeholders.len());

        for (i, placeholder) in self.placeholders.iter().enumerate() {
            let raw = captures.get(i + 1).map_or("", |m| m.as_str());
            let name = placeholder.name.as_str();

            let value = match placeholder.ty {
                PlaceholderType::Str => ArgValue::Str(raw.to_string()),
                PlaceholderType::Int => ArgValue::Int(
                    raw.parse::<i64>()
                        .map_err(|_| Error::type_mismatch(name, "an integer", raw))?,
                ),
                PlaceholderType::Word => {
                    if let Some(allowed) = self.def.allowed(name) {
                        if !allowed.iter().any(|w| w == raw) {
                            return Err(Error::invalid_enum(name, raw, allowed));
                        }
                    }
                    ArgValue::Word(raw.to_string())
                }
            };

            values.push((name.to_string(), value));
        }

        Ok(Args { values })
    }
}

/// A phrase matched to exactly one step
#[derive(Debug)]
pub struct Resolved<'r> {
    pub step: &'r StepDef,
    pub args: Args,
}

/// All known steps
#[derive(Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the image viewer and common desktop steps
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();
        super::viewer::register(&mut registry)?;
        super::common::register(&mut registry)?;
        Ok(registry)
    }

    /// Add a step
    pub fn register(&mut self, def: StepDef) -> Result<()> {
        let duplicate = self
            .entries
            .iter()
            .any(|e| e.def.template == def.template && e.def.kind == def.kind);
        if duplicate {
            return Err(Error::DuplicateStep(def.template));
        }

        self.entries.push(Entry::compile(def)?);
        Ok(())
    }

    /// Registered steps in registration order
    pub fn steps(&self) -> impl Iterator<Item = &StepDef> {
        self.entries.iter().map(|e| &e.def)
    }

    /// Find the single step matching a phrase and coerce its arguments
    pub fn resolve(&self, line: &str) -> Result<Resolved<'_>> {
        let line = line.trim();

        let mut matches = self
            .entries
            .iter()
            .filter_map(|entry| entry.regex.captures(line).map(|caps| (entry, caps)));

        let (entry, captures) = matches
            .next()
            .ok_or_else(|| Error::NoMatchingStep(line.to_string()))?;

        let others: Vec<&str> = matches.map(|(e, _)| e.def.template()).collect();
        if !others.is_empty() {
            let candidates = std::iter::once(entry.def.template())
                .chain(others)
                .map(|t| format!("'{t}'"))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Error::AmbiguousStep {
                phrase: line.to_string(),
                candidates,
            });
        }

        let args = entry.coerce(&captures)?;
        tracing::debug!(phrase = line, template = entry.def.template(), "resolved step");

        Ok(Resolved {
            step: &entry.def,
            args,
        })
    }

    /// Resolve and run one phrase
    pub fn run_phrase(&self, ctx: &mut Context<'_>, line: &str) -> Result<()> {
        let resolved = self.resolve(line)?;
        resolved.step.invoke(ctx, &resolved.args)
    }

    /// Run every phrase of a block in order, stopping at the first failure
    pub fn run_block(&self, ctx: &mut Context<'_>, text: &str) -> Result<()> {
        for phrase in parse_block(text)? {
            self.run_phrase(ctx, &phrase.text)?;
        }
        Ok(())
    }
}
