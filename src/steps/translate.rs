//! Translation catalog
//!
//! Scenarios are written against the source-locale UI strings. The catalog
//! maps them to what the running locale actually renders; strings without an
//! entry are rendered untranslated, as gettext does.

use std::collections::HashMap;
use std::path::Path;

use crate::common::{Error, Result};

/// Source string to localized string lookup
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    /// Catalog that renders every string untranslated
    pub fn identity() -> Self {
        Self::default()
    }

    /// Build a catalog from pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a YAML mapping of `source: localized`
    pub fn from_yaml(text: &str) -> Result<Self> {
        let entries: HashMap<String, String> = serde_yaml::from_str(text)?;
        Ok(Self { entries })
    }

    /// Load a YAML catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let text = Error::read_file(path)?;
        let catalog = Self::from_yaml(&text)?;
        tracing::debug!(
            path = %path.display(),
            entries = catalog.len(),
            "loaded translation catalog"
        );
        Ok(catalog)
    }

    /// Localized form of a source string
    pub fn translate(&self, source: &str) -> String {
        self.entries
            .get(source)
            .cloned()
            .unwrap_or_else(|| source.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_fallback() {
        let catalog = Catalog::identity();
        assert_eq!(catalog.translate("About Eye of GNOME"), "About Eye of GNOME");
    }

    #[test]
    fn test_yaml_catalog() {
        let catalog = Catalog::from_yaml(
            "\"About Eye of GNOME\": \"À propos d’Eye of GNOME\"\nWebsite: \"Site web\"\n",
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.translate("Website"), "Site web");
        assert_eq!(catalog.translate("Credits"), "Credits");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("de.yaml");
        std::fs::write(&path, "Fullscreen: Vollbild\n").unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.translate("Fullscreen"), "Vollbild");

        let missing = Catalog::load(&dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(Error::FileRead { .. })));
    }
}
