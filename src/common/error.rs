//! Error types for the step engine
//!
//! Messages end up verbatim in the scenario report, so they name the phrase,
//! node or value involved and, for assertions, both the expected and the
//! actual value.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the step engine
#[derive(Error, Debug)]
pub enum Error {
    // === Registry / Matching Errors ===
    #[error("No step matches '{0}'. Use 'a11y-steps steps' to list known phrases")]
    NoMatchingStep(String),

    #[error("Step '{phrase}' is ambiguous, it matches: {candidates}")]
    AmbiguousStep { phrase: String, candidates: String },

    #[error("Step pattern '{0}' is already registered")]
    DuplicateStep(String),

    #[error("Invalid step pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Placeholder '{placeholder}' expects {expected}, got '{value}'")]
    TypeMismatch {
        placeholder: String,
        expected: String,
        value: String,
    },

    #[error("Placeholder '{placeholder}' got '{value}', allowed values: {allowed}")]
    InvalidEnumValue {
        placeholder: String,
        value: String,
        allowed: String,
    },

    #[error("Line {line} of step block is not a step: '{text}'")]
    MalformedBlock { line: usize, text: String },

    #[error("Nested steps exceeded the maximum depth of {0}")]
    RecursionLimit(usize),

    #[error("No '{0}' has been opened in this scenario")]
    HandleNotSet(String),

    // === Accessibility Errors ===
    #[error("Accessibility node not found: {0}")]
    NodeNotFound(String),

    #[error("Accessibility bridge failed to start: {0}")]
    BridgeStartFailed(String),

    #[error("Accessibility bridge exited unexpectedly")]
    BridgeCrashed,

    #[error("Bridge protocol error: {0}")]
    BridgeProtocol(String),

    #[error("Bridge request '{command}' failed: {message}")]
    BridgeRequestFailed { command: String, message: String },

    // === Parse Errors ===
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Feature file line {line}: {message}")]
    FeatureParse { line: usize, message: String },

    // === Test Errors ===
    #[error("{message} (expected {expected}, got {actual})")]
    AssertionFailed {
        message: String,
        expected: String,
        actual: String,
    },

    // === External Query Errors ===
    #[error("Settings query failed: {0}")]
    SideChannel(String),

    // === Configuration Errors ===
    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create an assertion failure carrying both sides of the comparison
    pub fn assertion(
        message: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::AssertionFailed {
            message: message.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a type mismatch error for a placeholder
    pub fn type_mismatch(placeholder: &str, expected: &str, value: &str) -> Self {
        Self::TypeMismatch {
            placeholder: placeholder.to_string(),
            expected: expected.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an invalid enum value error listing the accepted words
    pub fn invalid_enum<S: AsRef<str>>(placeholder: &str, value: &str, allowed: &[S]) -> Self {
        Self::InvalidEnumValue {
            placeholder: placeholder.to_string(),
            value: value.to_string(),
            allowed: allowed.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", "),
        }
    }

    /// Create a bridge request failed error
    pub fn bridge_request_failed(command: &str, message: &str) -> Self {
        Self::BridgeRequestFailed {
            command: command.to_string(),
            message: message.to_string(),
        }
    }

    /// Read a file, mapping failures to `FileRead` with the path attached
    pub fn read_file(path: &std::path::Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| Self::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }
}

/// Wire-serializable error for bridge responses
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BridgeError {
    pub code: String,
    pub message: String,
}

impl From<&Error> for BridgeError {
    fn from(e: &Error) -> Self {
        let code = match e {
            Error::NodeNotFound(_) => "NODE_NOT_FOUND",
            Error::ParseError(_) => "PARSE_ERROR",
            Error::BridgeProtocol(_) => "PROTOCOL_ERROR",
            _ => "INTERNAL_ERROR",
        }
        .to_string();

        let message = match e {
            // The client rebuilds NodeNotFound from the bare query text
            Error::NodeNotFound(query) => query.clone(),
            other => other.to_string(),
        };

        Self { code, message }
    }
}

impl BridgeError {
    /// Map a wire error back to our error types where possible
    pub fn into_error(self, command: &str) -> Error {
        match self.code.as_str() {
            "NODE_NOT_FOUND" => Error::NodeNotFound(self.message),
            "PROTOCOL_ERROR" => Error::BridgeProtocol(self.message),
            _ => Error::bridge_request_failed(command, &self.message),
        }
    }
}
