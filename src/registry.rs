//! Repository registry: which clones to prune and what their main branch is.
//!
//! The registry is a flat JSON object (or YAML mapping) of
//! `"<repo-directory-name>": "<main-branch>"` pairs. Order in the file is
//! the processing order, so entries are kept in a `Vec` rather than a map.

use anyhow::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Registry filename looked up in the working directory when none is given.
pub const DEFAULT_REGISTRY_FILE: &str = "dir.json";

/// One registry line: a repository directory name and its main branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub name: String,
    pub main_branch: String,
}

/// Ordered mapping of repository name to main branch name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update an entry. A repeated name keeps its first position
    /// and takes the newer branch.
    pub fn insert(&mut self, name: impl Into<String>, main_branch: impl Into<String>) {
        let name = name.into();
        let main_branch = main_branch.into();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) => existing.main_branch = main_branch,
            None => self.entries.push(RegistryEntry { name, main_branch }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.main_branch.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }
}

impl<N: Into<String>, B: Into<String>> FromIterator<(N, B)> for Registry {
    fn from_iter<I: IntoIterator<Item = (N, B)>>(iter: I) -> Self {
        let mut registry = Registry::new();
        for (name, branch) in iter {
            registry.insert(name, branch);
        }
        registry
    }
}

struct RegistryVisitor;

impl<'de> Visitor<'de> for RegistryVisitor {
    type Value = Registry;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of repository name to main branch name")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Registry, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut registry = Registry::new();
        while let Some((name, branch)) = map.next_entry::<String, String>()? {
            registry.insert(name, branch);
        }
        Ok(registry)
    }
}

impl<'de> Deserialize<'de> for Registry {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RegistryVisitor)
    }
}

/// On-disk syntax of a registry file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryFormat {
    Json,
    Yaml,
}

impl RegistryFormat {
    /// `.yaml`/`.yml` files are YAML, everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                RegistryFormat::Yaml
            }
            _ => RegistryFormat::Json,
        }
    }
}

/// Parse registry text in the given format.
pub fn parse_registry(content: &str, format: RegistryFormat) -> Result<Registry> {
    match format {
        RegistryFormat::Json => {
            serde_json::from_str(content).context("Failed to parse registry as JSON")
        }
        RegistryFormat::Yaml => {
            serde_yaml_ng::from_str(content).context("Failed to parse registry as YAML")
        }
    }
}

/// Read and parse a registry file.
pub fn load_registry(path: &Path) -> Result<Registry> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read registry file {}", path.display()))?;
    parse_registry(&content, RegistryFormat::from_path(path))
        .with_context(|| format!("Invalid registry file {}", path.display()))
}

/// Load a registry, turning any configuration error into an empty registry.
///
/// The error is logged once and handed back so the run summary can report it.
pub fn load_registry_or_empty(path: &Path) -> (Registry, Option<String>) {
    match load_registry(path) {
        Ok(registry) => {
            log::debug!(
                "Loaded {} registry entries from {}",
                registry.len(),
                path.display()
            );
            (registry, None)
        }
        Err(e) => {
            let message = format!("{e:#}");
            log::error!("{message}");
            (Registry::new(), Some(message))
        }
    }
}
