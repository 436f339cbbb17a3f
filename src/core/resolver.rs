//! Settings resolution
//!
//! Flattens the settings table into one ordered list per category for a given
//! platform and build configuration, and translates the result into compiler
//! flags.

use std::collections::{BTreeMap, HashSet};

use crate::core::settings::{Category, SettingsNode, SettingsTable, ROOT_SETTINGS};
use crate::error::BuilderError;

/// Concatenate two optional lists, treating an absent list as empty
pub fn merged_lists(a: Option<&[String]>, b: Option<&[String]>) -> Vec<String> {
    let a = a.unwrap_or_default();
    let b = b.unwrap_or_default();
    let mut merged = Vec::with_capacity(a.len() + b.len());
    merged.extend_from_slice(a);
    merged.extend_from_slice(b);
    merged
}

/// Per-category flag prefixes for a downstream compiler driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagDialect {
    /// Prefix for primary language flags
    pub primary_language: String,
    /// Prefix for C flags
    pub c: String,
    /// Prefix for C++ flags
    pub cpp: String,
    /// Prefix for linker flags
    pub linker: String,
}

impl FlagDialect {
    /// Prefix token for a category; `common` has none
    pub fn prefix(&self, category: Category) -> Option<&str> {
        match category {
            Category::Common => None,
            Category::C => Some(&self.c),
            Category::Cpp => Some(&self.cpp),
            Category::PrimaryLanguage => Some(&self.primary_language),
            Category::Linker => Some(&self.linker),
        }
    }
}

impl Default for FlagDialect {
    fn default() -> Self {
        use crate::config::defaults;
        Self {
            primary_language: defaults::PRIMARY_LANGUAGE_PREFIX.to_string(),
            c: defaults::C_PREFIX.to_string(),
            cpp: defaults::CPP_PREFIX.to_string(),
            linker: defaults::LINKER_PREFIX.to_string(),
        }
    }
}

/// Flattened settings with inheritance applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSettings {
    /// Untranslated values, for direct use as tool arguments
    pub common: Vec<String>,
    /// C compiler flags
    pub c: Vec<String>,
    /// C++ compiler flags
    pub cpp: Vec<String>,
    /// Primary language flags
    pub primary_language: Vec<String>,
    /// Linker flags
    pub linker: Vec<String>,
    /// Raw key/value settings; later nodes override earlier ones
    pub values: BTreeMap<String, serde_json::Value>,
}

impl ResolvedSettings {
    /// A node's own values, without following its inheritance references
    pub fn from_node(node: &SettingsNode) -> Self {
        Self {
            common: node.common.clone(),
            c: node.c.clone(),
            cpp: node.cpp.clone(),
            primary_language: node.primary_language.clone(),
            linker: node.linker.clone(),
            values: node.values.clone(),
        }
    }

    /// Append `other` after `self`, category by category
    #[must_use]
    pub fn merged(a: &Self, b: &Self) -> Self {
        let mut values = a.values.clone();
        values.extend(b.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self {
            common: merged_lists(Some(a.common.as_slice()), Some(b.common.as_slice())),
            c: merged_lists(Some(a.c.as_slice()), Some(b.c.as_slice())),
            cpp: merged_lists(Some(a.cpp.as_slice()), Some(b.cpp.as_slice())),
            primary_language: merged_lists(
                Some(a.primary_language.as_slice()),
                Some(b.primary_language.as_slice()),
            ),
            linker: merged_lists(Some(a.linker.as_slice()), Some(b.linker.as_slice())),
            values,
        }
    }

    fn append(&mut self, other: Self) {
        *self = Self::merged(self, &other);
    }

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

    /// Translate into compiler driver flags
    ///
    /// Emits `prefix, -value` for every value of the primary language, C,
    /// C++ and linker categories, in that order. `common` values never appear.
    pub fn flag_list(&self, dialect: &FlagDialect) -> Vec<String> {
        let mut flags = Vec::new();
        for category in Category::FLAGGED {
            let Some(prefix) = dialect.prefix(category) else {
                continue;
            };
            for value in self.values_for(category) {
                flags.push(prefix.to_string());
                flags.push(format!("-{value}"));
            }
        }
        flags
    }
}

/// Resolve the settings table for a run
///
/// Starts from the `common` node. When `action` also names a settings node,
/// that node's resolution is layered on top of `common`.
pub fn resolve(
    table: &SettingsTable,
    action: &str,
    configuration: &str,
    platform: &str,
) -> Result<ResolvedSettings, BuilderError> {
    let resolver = Resolver {
        table,
        configuration,
        platform,
    };

    let mut resolved = resolver.resolve_node(ROOT_SETTINGS)?;
    if action != ROOT_SETTINGS && table.contains_key(action) {
        tracing::debug!("Layering '{action}' settings over {ROOT_SETTINGS}");
        resolved.append(resolver.resolve_node(action)?);
    }
    Ok(resolved)
}

struct Resolver<'a> {
    table: &'a SettingsTable,
    configuration: &'a str,
    platform: &'a str,
}

impl Resolver<'_> {
    fn resolve_node(&self, name: &str) -> Result<ResolvedSettings, BuilderError> {
        let mut active = HashSet::new();
        self.visit(name, &mut active)
    }

    fn visit(
        &self,
        name: &str,
        active: &mut HashSet<String>,
    ) -> Result<ResolvedSettings, BuilderError> {
        let node = self
            .table
            .get(name)
            .ok_or_else(|| BuilderError::MissingSettingsNode {
                name: name.to_string(),
            })?;

        if !active.insert(name.to_string()) {
            return Err(BuilderError::CyclicInheritance {
                name: name.to_string(),
            });
        }

        let mut resolved = ResolvedSettings::from_node(node);
        for inheritance in &node.inherits {
            if inheritance.applies_to(self.platform, self.configuration) {
                resolved.append(self.visit(&inheritance.name, active)?);
            } else {
                tracing::debug!(
                    "Skipping '{}' for {}/{}",
                    inheritance.name,
                    self.platform,
                    self.configuration
                );
            }
        }

        active.remove(name);
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::Inheritance;
    use crate::test_utils::generators;
    use proptest::prelude::*;

    fn node(primary: &[&str]) -> SettingsNode {
        SettingsNode {
            primary_language: primary.iter().map(ToString::to_string).collect(),
            ..SettingsNode::default()
        }
    }

    fn table(nodes: Vec<(&str, SettingsNode)>) -> SettingsTable {
        nodes
            .into_iter()
            .map(|(name, node)| (name.to_string(), node))
            .collect()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    // ============================================
    // Unit Tests
    // ============================================

    #[test]
    fn test_merging_setting_lists() {
        let a = strings(&["blah"]);
        let b = strings(&["waffle"]);
        assert!(merged_lists(None, None).is_empty());
        assert_eq!(merged_lists(Some(a.as_slice()), None), a);
        assert_eq!(merged_lists(None, Some(b.as_slice())), b);
        assert_eq!(
            merged_lists(Some(a.as_slice()), Some(b.as_slice())),
            strings(&["blah", "waffle"])
        );
    }

    #[test]
    fn test_merging_settings() {
        let empty = ResolvedSettings::default();
        let with_common = ResolvedSettings {
            common: strings(&["test"]),
            ..ResolvedSettings::default()
        };

        assert!(ResolvedSettings::merged(&empty, &empty).common.is_empty());
        assert_eq!(ResolvedSettings::merged(&empty, &with_common).common, ["test"]);
        assert_eq!(ResolvedSettings::merged(&with_common, &empty).common, ["test"]);
        assert_eq!(
            ResolvedSettings::merged(&with_common, &with_common).common,
            ["test", "test"]
        );
    }

    #[test]
    fn test_flag_list_order_and_format() {
        let settings = ResolvedSettings {
            common: strings(&["testCommon"]),
            c: strings(&["c1"]),
            cpp: strings(&["cpp1"]),
            primary_language: strings(&["p1"]),
            linker: strings(&["l1"]),
            values: BTreeMap::new(),
        };
        let dialect = FlagDialect::default();

        assert_eq!(
            settings.flag_list(&dialect),
            vec![
                dialect.primary_language.clone(),
                "-p1".to_string(),
                dialect.c.clone(),
                "-c1".to_string(),
                dialect.cpp.clone(),
                "-cpp1".to_string(),
                dialect.linker.clone(),
                "-l1".to_string(),
            ]
        );
        assert!(!settings.flag_list(&dialect).iter().any(|f| f.contains("testCommon")));
    }

    #[test]
    fn test_flag_list_uses_injected_prefixes() {
        let settings = ResolvedSettings {
            primary_language: strings(&["O"]),
            linker: strings(&["s"]),
            ..ResolvedSettings::default()
        };
        let dialect = FlagDialect {
            primary_language: "-Crustc".into(),
            c: "-Ccc".into(),
            cpp: "-Ccxx".into(),
            linker: "-Clink".into(),
        };
        assert_eq!(settings.flag_list(&dialect), ["-Crustc", "-O", "-Clink", "-s"]);
    }

    #[test]
    fn test_platform_overrides() {
        let settings = table(vec![
            (
                "common",
                node(&["testSwift"]).inheriting(Inheritance::filtered("extraMacSettings", &["macOS"])),
            ),
            ("extraMacSettings", node(&["extraMacOnly"])),
        ]);

        let mac = resolve(&settings, "scheme1", "debug", "macOS").unwrap();
        assert_eq!(mac.primary_language, ["testSwift", "extraMacOnly"]);

        let linux = resolve(&settings, "scheme1", "debug", "linux").unwrap();
        assert_eq!(linux.primary_language, ["testSwift"]);
    }

    #[test]
    fn test_configuration_overrides() {
        let settings = table(vec![
            (
                "common",
                node(&["testSwift"])
                    .inheriting(Inheritance::filtered("extraReleaseSettings", &["release"])),
            ),
            ("extraReleaseSettings", node(&["extraReleaseOnly"])),
        ]);

        let debug = resolve(&settings, "scheme1", "debug", "macOS").unwrap();
        assert_eq!(debug.primary_language, ["testSwift"]);

        let release = resolve(&settings, "scheme1", "release", "macOS").unwrap();
        assert_eq!(release.primary_language, ["testSwift", "extraReleaseOnly"]);
    }

    #[test]
    fn test_inheritance_chain() {
        let settings = table(vec![
            (
                "common",
                node(&["testSwift"]).inheriting(Inheritance::always("inherited1")),
            ),
            (
                "inherited1",
                node(&["extraInherited1"]).inheriting(Inheritance::always("inherited2")),
            ),
            ("inherited2", node(&["extraInherited2"])),
        ]);

        let resolved = resolve(&settings, "scheme1", "debug", "macOS").unwrap();
        assert_eq!(
            resolved.primary_language,
            ["testSwift", "extraInherited1", "extraInherited2"]
        );
    }

    #[test]
    fn test_siblings_resolve_in_declaration_order() {
        let settings = table(vec![
            (
                "common",
                node(&["root"])
                    .inheriting(Inheritance::always("a"))
                    .inheriting(Inheritance::always("b")),
            ),
            ("a", node(&["a"]).inheriting(Inheritance::always("shared"))),
            ("b", node(&["b"]).inheriting(Inheritance::always("shared"))),
            ("shared", node(&["shared"])),
        ]);

        let resolved = resolve(&settings, "build", "debug", "linux").unwrap();
        assert_eq!(resolved.primary_language, ["root", "a", "shared", "b", "shared"]);
    }

    #[test]
    fn test_action_node_layers_over_common() {
        let settings = table(vec![
            ("common", node(&["base"])),
            ("test", node(&["enable-testing"])),
        ]);

        let test = resolve(&settings, "test", "debug", "linux").unwrap();
        assert_eq!(test.primary_language, ["base", "enable-testing"]);

        let build = resolve(&settings, "build", "debug", "linux").unwrap();
        assert_eq!(build.primary_language, ["base"]);
    }

    #[test]
    fn test_later_values_override_earlier() {
        let mut common = node(&[]).inheriting(Inheritance::always("extra"));
        common.values.insert("target".into(), serde_json::json!("x86_64"));
        let mut extra = node(&[]);
        extra.values.insert("target".into(), serde_json::json!("arm64"));
        extra.values.insert("sdk".into(), serde_json::json!("14.0"));
        let settings = table(vec![("common", common), ("extra", extra)]);

        let resolved = resolve(&settings, "build", "debug", "linux").unwrap();
        assert_eq!(resolved.values["target"], "arm64");
        assert_eq!(resolved.values["sdk"], "14.0");
    }

    #[test]
    fn test_missing_inherited_node() {
        let settings = table(vec![(
            "common",
            node(&["x"]).inheriting(Inheritance::always("nowhere")),
        )]);

        let result = resolve(&settings, "build", "debug", "linux");
        assert!(matches!(
            result,
            Err(BuilderError::MissingSettingsNode { ref name }) if name == "nowhere"
        ));
    }

    #[test]
    fn test_filtered_out_missing_node_is_not_visited() {
        let settings = table(vec![(
            "common",
            node(&["x"]).inheriting(Inheritance::filtered("nowhere", &["windows"])),
        )]);

        assert!(resolve(&settings, "build", "debug", "linux").is_ok());
    }

    #[test]
    fn test_missing_common_node() {
        let settings = table(vec![("other", node(&["x"]))]);
        assert!(matches!(
            resolve(&settings, "build", "debug", "linux"),
            Err(BuilderError::MissingSettingsNode { ref name }) if name == "common"
        ));
    }

    #[test]
    fn test_cyclic_inheritance_detection() {
        let settings = table(vec![
            ("common", node(&[]).inheriting(Inheritance::always("a"))),
            ("a", node(&[]).inheriting(Inheritance::always("b"))),
            ("b", node(&[]).inheriting(Inheritance::always("a"))),
        ]);

        assert!(matches!(
            resolve(&settings, "build", "debug", "linux"),
            Err(BuilderError::CyclicInheritance { ref name }) if name == "a"
        ));
    }

    #[test]
    fn test_self_inheritance_is_cyclic() {
        let settings = table(vec![(
            "common",
            node(&[]).inheriting(Inheritance::always("common")),
        )]);

        assert!(matches!(
            resolve(&settings, "build", "debug", "linux"),
            Err(BuilderError::CyclicInheritance { .. })
        ));
    }

    // ============================================
    // Property-Based Tests
    // ============================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A linear inheritance chain flattens to the concatenation of each
        /// node's own values, in chain order.
        #[test]
        fn prop_chain_flattens_in_order(
            chain in prop::collection::vec(generators::flag_values(), 1..6),
        ) {
            let mut settings = SettingsTable::new();
            for (index, values) in chain.iter().enumerate() {
                let name = if index == 0 { "common".to_string() } else { format!("node{index}") };
                let mut entry = SettingsNode {
                    primary_language: values.clone(),
                    ..SettingsNode::default()
                };
                if index + 1 < chain.len() {
                    entry.inherits.push(Inheritance::always(&format!("node{}", index + 1)));
                }
                settings.insert(name, entry);
            }

            let resolved = resolve(&settings, "build", "debug", "linux").unwrap();
            let expected: Vec<String> = chain.concat();
            prop_assert_eq!(resolved.primary_language, expected);
        }

        /// Filters match platform and configuration tags through the same rule.
        #[test]
        fn prop_filter_matches_either_tag(
            platform in generators::tag(),
            configuration in generators::tag(),
            filter in prop::collection::vec(generators::tag(), 1..4),
        ) {
            let filter_refs: Vec<&str> = filter.iter().map(String::as_str).collect();
            let settings = table(vec![
                ("common", node(&[]).inheriting(Inheritance::filtered("extra", &filter_refs))),
                ("extra", node(&["extra"])),
            ]);

            let resolved = resolve(&settings, "build", &configuration, &platform).unwrap();
            let expected = filter.contains(&platform) || filter.contains(&configuration);
            prop_assert_eq!(resolved.primary_language.len() == 1, expected);
        }

        /// Translation emits exactly two tokens per flagged value and never
        /// mentions `common` values.
        #[test]
        fn prop_flag_list_pairs(
            common in generators::flag_values(),
            primary in generators::flag_values(),
            linker in generators::flag_values(),
        ) {
            let settings = ResolvedSettings {
                common: common.clone(),
                primary_language: primary.clone(),
                linker: linker.clone(),
                ..ResolvedSettings::default()
            };
            let flags = settings.flag_list(&FlagDialect::default());
            prop_assert_eq!(flags.len(), 2 * (primary.len() + linker.len()));
            for pair in flags.chunks(2) {
                prop_assert!(pair[1].starts_with('-'));
            }
        }
    }
}
