//! Settings model
//!
//! Named settings nodes as they arrive in the configuration payload. Nodes
//! carry per-category flag lists plus references to other nodes they inherit
//! from. Resolution lives in [`crate::core::resolver`].

use serde::Deserialize;
use std::collections::BTreeMap;

/// Name of the node every resolution starts from
pub const ROOT_SETTINGS: &str = "common";

/// Flag categories of a settings node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Values passed through untranslated
    Common,
    /// C compiler flags
    C,
    /// C++ compiler flags
    Cpp,
    /// Flags for the primary language compiler
    PrimaryLanguage,
    /// Linker flags
    Linker,
}

impl Category {
    /// Categories that translate into compiler flags, in emission order
    pub const FLAGGED: [Self; 4] = [Self::PrimaryLanguage, Self::C, Self::Cpp, Self::Linker];
}

/// Reference from one settings node to another
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Inheritance {
    /// Name of the inherited node
    pub name: String,

    /// Platform or configuration tags gating the inheritance
    #[serde(default)]
    pub filter: Option<Vec<String>>,
}

impl Inheritance {
    /// Unconditional inheritance
    pub fn always(name: &str) -> Self {
        Self {
            name: name.to_string(),
            filter: None,
        }
    }

    /// Inheritance applied only when one of `tags` is active
    pub fn filtered(name: &str, tags: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            filter: Some(tags.iter().map(ToString::to_string).collect()),
        }
    }

    /// Whether the reference applies for the given platform and configuration
    ///
    /// An absent or empty filter always applies.
    pub fn applies_to(&self, platform: &str, configuration: &str) -> bool {
        match &self.filter {
            None => true,
            Some(tags) if tags.is_empty() => true,
            Some(tags) => tags.iter().any(|tag| tag == platform || tag == configuration),
        }
    }
}

/// A named bundle of per-category flags
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SettingsNode {
    /// Values passed through to tools untranslated
    #[serde(default)]
    pub common: Vec<String>,

    /// C compiler flags
    #[serde(default)]
    pub c: Vec<String>,

    /// C++ compiler flags
    #[serde(default)]
    pub cpp: Vec<String>,

    /// Primary language flags; configure programs may emit them under the
    /// compiler's own name
    #[serde(default, rename = "primaryLanguage", alias = "swift")]
    pub primary_language: Vec<String>,

    /// Linker flags
    #[serde(default)]
    pub linker: Vec<String>,

    /// Raw key/value settings exported to tools as environment variables
    #[serde(default)]
    pub values: BTreeMap<String, serde_json::Value>,

    /// Other nodes whose values follow this node's own
    #[serde(default)]
    pub inherits: Vec<Inheritance>,
}

impl SettingsNode {
    /// Values of one category
    pub fn values_for(&self, category: Category) -> &[String] {
        match category {
            Category::Common => &self.common,
            Category::C => &self.c,
            Category::Cpp => &self.cpp,
            Category::PrimaryLanguage => &self.primary_language,
            Category::Linker => &self.linker,
        }
    }

    /// Add an inheritance reference
    #[must_use]
    pub fn inheriting(mut self, inheritance: Inheritance) -> Self {
        self.inherits.push(inheritance);
        self
    }
}

/// Settings nodes keyed by name
pub type SettingsTable = BTreeMap<String, SettingsNode>;

/// String form of a raw setting value, as exported to child processes
///
/// Strings are used verbatim and arrays are comma-joined; anything else
/// uses its JSON text.
pub fn raw_value_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(raw_value_string)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
