//! Language profile registry
//!
//! Fixed mapping from a language identifier to the image and command needed
//! to run source code written in that language. Profiles are loaded once
//! from the embedded `files/languages.toml` and never change afterwards;
//! adding a language means adding a table entry, never runtime registration.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

/// Placeholder in a run command template replaced with the submitted source.
const CODE_SLOT: &str = "{code}";

/// Static profile for one supported language.
#[derive(Debug, Clone)]
pub struct LanguageProfile {
    /// Canonical language identifier (e.g., "javascript")
    pub id: String,
    /// Human-readable name for API responses
    pub display_name: String,
    /// Container image the code runs in
    pub image: String,
    /// Argv template; one element is the `{code}` slot
    run_command: Vec<String>,
    /// Timeout applied when the caller does not supply one
    pub default_timeout_ms: u64,
    pub memory_limit_bytes: i64,
    pub cpu_shares: i64,
}

impl LanguageProfile {
    /// Build the argument vector for one submission. Pure: the source text
    /// replaces the `{code}` slot of the template, nothing else changes.
    pub fn build_command(&self, code: &str) -> Vec<String> {
        self.run_command
            .iter()
            .map(|part| {
                if part.as_str() == CODE_SLOT {
                    code.to_string()
                } else {
                    part.clone()
                }
            })
            .collect()
    }
}

/// Raw TOML entry for a language
#[derive(Debug, Deserialize)]
struct RawLanguageProfile {
    display_name: String,
    image: String,
    run_command: String,
    default_timeout_ms: u64,
    memory_limit_mb: i64,
    cpu_shares: i64,
    #[serde(default)]
    aliases: Vec<String>,
}

/// Immutable registry of supported languages. Built once at startup and
/// shared read-only; lookups are case-insensitive over canonical names
/// and aliases.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    profiles: BTreeMap<String, Arc<LanguageProfile>>,
    aliases: HashMap<String, String>,
}

impl LanguageRegistry {
    /// Load the registry from the profile table embedded in the binary.
    pub fn from_embedded() -> anyhow::Result<Self> {
        let content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/languages.toml"));
        Self::from_toml(content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let raw: BTreeMap<String, RawLanguageProfile> =
            toml::from_str(content).context("Failed to parse language profile table")?;

        let mut profiles = BTreeMap::new();
        let mut aliases = HashMap::new();

        for (name, raw) in raw {
            let id = name.to_lowercase();
            let run_command: Vec<String> =
                raw.run_command.split_whitespace().map(String::from).collect();
            if !run_command.iter().any(|part| part.as_str() == CODE_SLOT) {
                anyhow::bail!("Run command for {} has no {} slot", id, CODE_SLOT);
            }

            for alias in &raw.aliases {
                aliases.insert(alias.to_lowercase(), id.clone());
            }

            let profile = LanguageProfile {
                id: id.clone(),
                display_name: raw.display_name,
                image: raw.image,
                run_command,
                default_timeout_ms: raw.default_timeout_ms,
                memory_limit_bytes: raw.memory_limit_mb * 1024 * 1024,
                cpu_shares: raw.cpu_shares,
            };
            profiles.insert(id, Arc::new(profile));
        }

        if profiles.is_empty() {
            anyhow::bail!("Language profile table is empty");
        }

        Ok(Self { profiles, aliases })
    }

    /// Resolve a language identifier or alias to its profile.
    pub fn resolve(&self, language: &str) -> Option<Arc<LanguageProfile>> {
        let key = language.to_lowercase();
        if let Some(profile) = self.profiles.get(&key) {
            return Some(profile.clone());
        }
        let canonical = self.aliases.get(&key)?;
        self.profiles.get(canonical).cloned()
    }

    /// Canonical language identifiers in lexicographic order. The order is
    /// stable across calls within a process lifetime.
    pub fn supported_languages(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }
}
