//! System settings side channel
//!
//! Some state a scenario checks (the desktop wallpaper) lives outside the
//! application. It is read synchronously from an external query tool.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::common::{Error, Result};

/// Read-only access to system settings
pub trait SideChannel {
    /// Raw value of `key` in `schema`, as printed by the query tool
    fn get(&self, schema: &str, key: &str) -> Result<String>;
}

/// `gsettings get <schema> <key>`
#[derive(Debug, Clone)]
pub struct GSettings {
    program: PathBuf,
}

impl GSettings {
    /// Use the given executable, searching PATH for bare names
    pub fn new(program: &str) -> Self {
        let program = which::which(program).unwrap_or_else(|_| PathBuf::from(program));
        Self { program }
    }
}

impl Default for GSettings {
    fn default() -> Self {
        Self::new("gsettings")
    }
}

impl SideChannel for GSettings {
    fn get(&self, schema: &str, key: &str) -> Result<String> {
        tracing::debug!(program = %self.program.display(), schema, key, "querying setting");

        let output = Command::new(&self.program)
            .args(["get", schema, key])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                Error::SideChannel(format!(
                    "Failed to run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(Error::SideChannel(format!(
                "{} get {} {} exited with {:?}: {}",
                self.program.display(),
                schema,
                key,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}

/// Fixed values, for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    values: HashMap<(String, String), String>,
}

impl StaticSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set a value
    pub fn with(mut self, schema: &str, key: &str, value: &str) -> Self {
        self.values
            .insert((schema.to_string(), key.to_string()), value.to_string());
        self
    }
}

impl SideChannel for StaticSettings {
    fn get(&self, schema: &str, key: &str) -> Result<String> {
        self.values
            .get(&(schema.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| Error::SideChannel(format!("No such key '{key}' in schema '{schema}'")))
    }
}

/// No settings backend configured
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl SideChannel for Unavailable {
    fn get(&self, schema: &str, key: &str) -> Result<String> {
        Err(Error::SideChannel(format!(
            "No settings backend configured to read {schema} {key}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_settings() {
        let settings = StaticSettings::new().with(
            "org.gnome.desktop.background",
            "picture-uri",
            "'file:///home/user/Pictures/gnome.png'",
        );
        assert_eq!(
            settings
                .get("org.gnome.desktop.background", "picture-uri")
                .unwrap(),
            "'file:///home/user/Pictures/gnome.png'"
        );
        assert!(matches!(
            settings.get("org.gnome.desktop.background", "picture-options"),
            Err(Error::SideChannel(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_gsettings_runs_external_program() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-gsettings");
        std::fs::write(&script, "#!/bin/sh\necho \"'file:///tmp/$2/$3.png'\"\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let gsettings = GSettings::new(script.to_str().unwrap());
        assert_eq!(
            gsettings.get("schema", "key").unwrap(),
            "'file:///tmp/schema/key.png'"
        );
    }

    #[test]
    fn test_missing_program_is_side_channel_error() {
        let gsettings = GSettings::new("/nonexistent/gsettings-for-tests");
        assert!(matches!(
            gsettings.get("a", "b"),
            Err(Error::SideChannel(_))
        ));
    }
}
