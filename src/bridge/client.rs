//! Client for the accessibility bridge process
//!
//! The bridge is a child process speaking the framed JSON protocol on its
//! stdio. One request is in flight at a time: every call writes a request
//! and blocks until the matching response arrives.

use std::io::{BufRead, BufReader, BufWriter};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command as Process, Stdio};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::a11y::{Driver, Handle, MouseButton, NodeInfo};
use crate::common::{Error, Result};

use super::codec;
use super::protocol::{Command, Request, Response};

/// Driver backed by a bridge subprocess
pub struct BridgeClient {
    /// Bridge subprocess
    bridge: Child,
    /// Buffered reader for bridge stdout
    reader: BufReader<ChildStdout>,
    /// Buffered writer for bridge stdin
    writer: BufWriter<ChildStdin>,
    /// Next request id
    next_id: u64,
}

impl BridgeClient {
    /// Spawn the bridge and connect to its stdio
    pub fn spawn(bridge_path: &Path, args: &[String]) -> Result<Self> {
        let mut cmd = Process::new(bridge_path);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        let mut bridge = cmd.spawn().map_err(|e| {
            Error::BridgeStartFailed(format!(
                "Failed to start {}: {}",
                bridge_path.display(),
                e
            ))
        })?;

        let stdin = bridge
            .stdin
            .take()
            .ok_or_else(|| Error::BridgeStartFailed("Failed to get bridge stdin".to_string()))?;
        let stdout = bridge
            .stdout
            .take()
            .ok_or_else(|| Error::BridgeStartFailed("Failed to get bridge stdout".to_string()))?;

        tracing::debug!(bridge = %bridge_path.display(), pid = bridge.id(), "bridge started");

        Ok(Self {
            bridge,
            reader: BufReader::new(stdout),
            writer: BufWriter::new(stdin),
            next_id: 1,
        })
    }

    /// Send a command and wait for its response
    pub fn request<T: DeserializeOwned>(&mut self, command: Command) -> Result<T> {
        let id = self.next_id;
        self.next_id += 1;
        let name = command.name();

        let json = serde_json::to_string(&Request { id, command })?;
        tracing::debug!("bridge >>> {}", json);
        codec::write_message(&mut self.writer, &json)?;

        read_response(&mut self.reader, id, name)
    }

    /// Send a command whose result carries no data
    fn call(&mut self, command: Command) -> Result<()> {
        self.request::<Value>(command).map(|_| ())
    }
}

/// Read responses until the one answering `id` arrives
///
/// Id 0 is what the bridge uses when it could not decode a request at all,
/// so no later response will answer ours.
fn read_response<R: BufRead, T: DeserializeOwned>(
    reader: &mut R,
    id: u64,
    name: &str,
) -> Result<T> {
    loop {
        let reply = codec::read_message(reader)?;
        tracing::debug!("bridge <<< {}", reply);

        let response: Response = serde_json::from_str(&reply)
            .map_err(|e| Error::BridgeProtocol(format!("Invalid JSON: {}", e)))?;

        if response.id == 0 && !response.success {
            let message = response
                .error
                .map_or_else(|| "Unknown error".to_string(), |error| error.message);
            return Err(Error::BridgeProtocol(format!(
                "Bridge rejected {} request: {}",
                name, message
            )));
        }

        if response.id != id {
            tracing::warn!(expected = id, got = response.id, "dropping stale bridge response");
            continue;
        }

        if !response.success {
            return Err(match response.error {
                Some(error) => error.into_error(name),
                None => Error::bridge_request_failed(name, "Unknown error"),
            });
        }

        let result = response.result.unwrap_or(Value::Null);
        return serde_json::from_value(result).map_err(|e| {
            Error::BridgeProtocol(format!("Failed to parse {} response: {}", name, e))
        });
    }
}

impl Driver for BridgeClient {
    fn inspect(&mut self, node: &Handle) -> Result<NodeInfo> {
        self.request(Command::Inspect { path: node.clone() })
    }

    fn click(&mut self, node: &Handle, button: MouseButton) -> Result<()> {
        self.call(Command::Click {
            path: node.clone(),
            button,
        })
    }

    fn point(&mut self, node: &Handle) -> Result<()> {
        self.call(Command::Point { path: node.clone() })
    }

    fn grab_focus(&mut self, node: &Handle) -> Result<()> {
        self.call(Command::GrabFocus { path: node.clone() })
    }

    fn key_combo(&mut self, combo: &str) -> Result<()> {
        self.call(Command::KeyCombo {
            combo: combo.to_string(),
        })
    }

    fn type_text(&mut self, text: &str) -> Result<()> {
        self.call(Command::TypeText {
            text: text.to_string(),
        })
    }

    fn launch(&mut self, app: &str) -> Result<()> {
        self.call(Command::Launch {
            app: app.to_string(),
        })
    }

    fn terminate(&mut self, app: &str) -> Result<()> {
        self.call(Command::Terminate {
            app: app.to_string(),
        })
    }
}

impl Drop for BridgeClient {
    fn drop(&mut self) {
        // Best-effort: the bridge exits on EOF, kill it if it lingers
        let _ = self.bridge.kill();
        let _ = self.bridge.wait();
    }
}
