//! Rule lists for multi-target patching.
//!
//! A rule names a dependency string to replace and the (shorter or
//! equal) name to put in its place. The built-in set redirects the C++
//! runtime dependencies to `libdl.so`, which Android binaries already
//! link against.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Library every built-in rule redirects to.
pub const DEFAULT_REPLACEMENT: &str = "libdl.so";

/// Dependency names replaced by the built-in rule set, in scan order.
pub const DEFAULT_TARGETS: &[&str] = &["libc++_shared.so", "libstdc++.so"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rule {
    pub pattern: String,
    pub replacement: String,
}

/// An ordered list of rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleSet {
    #[serde(rename = "rule", default)]
    pub rules: Vec<Rule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            rules: DEFAULT_TARGETS
                .iter()
                .map(|t| Rule {
                    pattern: t.to_string(),
                    replacement: DEFAULT_REPLACEMENT.to_string(),
                })
                .collect(),
        }
    }
}

impl RuleSet {
    /// Load a rule set from a TOML file with `[[rule]]` tables.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let set: RuleSet = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        set.validate()?;
        Ok(set)
    }

    /// Check every rule can be applied without changing the file length.
    pub fn validate(&self) -> Result<()> {
        if self.rules.is_empty() {
            return Err(Error::InvalidRule("rule set is empty".into()));
        }
        for (i, rule) in self.rules.iter().enumerate() {
            if rule.pattern.is_empty() {
                return Err(Error::InvalidRule(format!("rule {}: empty pattern", i)));
            }
            if rule.replacement.len() > rule.pattern.len() {
                return Err(Error::InvalidRule(format!(
                    "rule {}: replacement '{}' is longer than pattern '{}'",
                    i, rule.replacement, rule.pattern
                )));
            }
        }
        Ok(())
    }

    /// Distinct replacement names, in first-seen order.
    pub fn replacements(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for rule in &self.rules {
            if !out.contains(&rule.replacement.as_str()) {
                out.push(&rule.replacement);
            }
        }
        out
    }
}
