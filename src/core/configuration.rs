//! Build configuration
//!
//! The settings table and action table emitted by the configure program.
//! Decoded once per run and read-only afterwards.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

use crate::core::settings::{SettingsTable, ROOT_SETTINGS};
use crate::error::BuilderError;

/// What a phase does, classified once when the configuration is decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseKind {
    /// Build one product with the resolved flags
    Build,
    /// Run the test suite with the resolved flags
    Test,
    /// Run one product with the resolved flags
    Run,
    /// Execute another action from the action table
    Action,
    /// Link build identity into a product
    Metadata,
    /// Write build identity next to a product
    Metafile,
    /// Build a helper tool and run it with the phase arguments
    Tool(String),
}

impl PhaseKind {
    /// Classify a phase command string
    pub fn classify(command: &str) -> Self {
        match command {
            "build" => Self::Build,
            "test" => Self::Test,
            "run" => Self::Run,
            "action" | "scheme" => Self::Action,
            "metadata" => Self::Metadata,
            "metafile" => Self::Metafile,
            tool => Self::Tool(tool.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct PhaseRecord {
    #[serde(default)]
    name: String,
    #[serde(alias = "command")]
    tool: String,
    #[serde(default)]
    arguments: Vec<String>,
}

/// One step of an action
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "PhaseRecord")]
pub struct Phase {
    /// Display name, used for the stage label
    pub name: String,
    /// Command string as written in the configuration
    pub command: String,
    /// Dispatch target derived from `command`
    pub kind: PhaseKind,
    /// Arguments for the command
    pub arguments: Vec<String>,
}

impl From<PhaseRecord> for Phase {
    fn from(record: PhaseRecord) -> Self {
        Self::new(&record.name, &record.tool, record.arguments)
    }
}

impl Phase {
    /// Create a phase, classifying its command
    pub fn new(name: &str, command: &str, arguments: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            command: command.to_string(),
            kind: PhaseKind::classify(command),
            arguments,
        }
    }

    /// First argument, which names the product for most phase kinds
    pub fn target(&self) -> Option<&str> {
        self.arguments.first().map(String::as_str)
    }
}

/// Ordered phases executed front to back
pub type Action = Vec<Phase>;

/// Actions keyed by name
pub type ActionTable = BTreeMap<String, Action>;

/// Everything the configure program tells the builder
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BuildConfiguration {
    /// Settings nodes
    #[serde(default)]
    pub settings: SettingsTable,

    /// Action table
    #[serde(default, rename = "schemes")]
    pub actions: ActionTable,
}

impl BuildConfiguration {
    /// Decode the configure program's JSON output
    pub fn parse(json: &str) -> Result<Self, BuilderError> {
        let configuration: Self = serde_json::from_str(json)?;
        configuration.validate()?;
        Ok(configuration)
    }

    /// Look up an action by name
    pub fn action(&self, name: &str) -> Result<&Action, BuilderError> {
        self.actions
            .get(name)
            .ok_or_else(|| BuilderError::MissingAction {
                name: name.to_string(),
            })
    }

    /// Check the structural invariants of the settings table
    ///
    /// `common` must exist, every inheritance target must exist, and no node
    /// may inherit from itself. Filters are ignored: a reference that is
    /// inactive on this platform is still checked.
    pub fn validate(&self) -> Result<(), BuilderError> {
        if !self.settings.contains_key(ROOT_SETTINGS) {
            return Err(BuilderError::MissingSettingsNode {
                name: ROOT_SETTINGS.to_string(),
            });
        }

        let mut finished = HashSet::new();
        for name in self.settings.keys() {
            let mut active = Vec::new();
            self.check_node(name, &mut active, &mut finished)?;
        }
        Ok(())
    }

    fn check_node<'a>(
        &'a self,
        name: &'a str,
        active: &mut Vec<&'a str>,
        finished: &mut HashSet<&'a str>,
    ) -> Result<(), BuilderError> {
        if active.contains(&name) {
            return Err(BuilderError::CyclicInheritance {
                name: name.to_string(),
            });
        }
        if finished.contains(name) {
            return Ok(());
        }

        let node = self
            .settings
            .get(name)
            .ok_or_else(|| BuilderError::MissingSettingsNode {
                name: name.to_string(),
            })?;

        active.push(name);
        for inheritance in &node.inherits {
            self.check_node(&inheritance.name, active, finished)?;
        }
        active.pop();
        finished.insert(name);
        Ok(())
    }
}
