//! Bridge protocol message types
//!
//! Requests and responses exchanged with the accessibility bridge process.

use serde::{Deserialize, Serialize};

use crate::a11y::{Handle, MouseButton};
use crate::common::error::BridgeError;

/// Request to the bridge
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for matching responses
    pub id: u64,
    /// The command to execute
    pub command: Command,
}

/// Response from the bridge
#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    /// Request ID this response corresponds to
    pub id: u64,
    /// Whether the command succeeded
    pub success: bool,
    /// Result data on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error information on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<BridgeError>,
}

impl Response {
    /// Create a success response
    pub fn success(id: u64, result: serde_json::Value) -> Self {
        Self {
            id,
            success: true,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: u64, error: BridgeError) -> Self {
        Self {
            id,
            success: false,
            result: None,
            error: Some(error),
        }
    }

    /// Create a success response with no data
    pub fn ok(id: u64) -> Self {
        Self {
            id,
            success: true,
            result: Some(serde_json::json!({})),
            error: None,
        }
    }
}

/// Commands understood by the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Read a node's attributes; replies with a `NodeInfo`
    Inspect { path: Handle },

    Click {
        path: Handle,
        #[serde(default)]
        button: MouseButton,
    },

    Point { path: Handle },

    GrabFocus { path: Handle },

    KeyCombo { combo: String },

    TypeText { text: String },

    Launch { app: String },

    Terminate { app: String },
}

impl Command {
    /// Wire name of the command, used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Command::Inspect { .. } => "inspect",
            Command::Click { .. } => "click",
            Command::Point { .. } => "point",
            Command::GrabFocus { .. } => "grab_focus",
            Command::KeyCombo { .. } => "key_combo",
            Command::TypeText { .. } => "type_text",
            Command::Launch { .. } => "launch",
            Command::Terminate { .. } => "terminate",
        }
    }
}
