//! Annotation rewrite rules and the table that holds them.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::RewriteError;

/// What happens to the modifiers of a method whose annotation was rewritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierPolicy {
    #[default]
    None,
    /// Drop `public`: JUnit 5 lifecycle methods may be package-private.
    ForcePackagePrivate,
}

impl fmt::Display for ModifierPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModifierPolicy::None => "none",
            ModifierPolicy::ForcePackagePrivate => "force_package_private",
        })
    }
}

/// Replace annotation `source` with `target`, importing `target_import`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteRule {
    source: String,
    target: String,
    target_import: String,
    modifier_policy: ModifierPolicy,
}

impl RewriteRule {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        modifier_policy: ModifierPolicy,
    ) -> Self {
        let target = target.into();
        Self {
            source: source.into(),
            target_import: target.clone(),
            target,
            modifier_policy,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn target_import(&self) -> &str {
        &self.target_import
    }

    pub fn modifier_policy(&self) -> ModifierPolicy {
        self.modifier_policy
    }
}

impl fmt::Display for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{} -> @{}", self.source, self.target)
    }
}

/// The JUnit 4 to JUnit 5 annotation mapping.
pub fn junit5_rules() -> Vec<RewriteRule> {
    use ModifierPolicy::ForcePackagePrivate;
    vec![
        RewriteRule::new("org.junit.Before", "org.junit.jupiter.api.BeforeEach", ForcePackagePrivate),
        RewriteRule::new("org.junit.After", "org.junit.jupiter.api.AfterEach", ForcePackagePrivate),
        RewriteRule::new("org.junit.BeforeClass", "org.junit.jupiter.api.BeforeAll", ForcePackagePrivate),
        RewriteRule::new("org.junit.AfterClass", "org.junit.jupiter.api.AfterAll", ForcePackagePrivate),
        RewriteRule::new("org.junit.Ignore", "org.junit.jupiter.api.Disabled", ModifierPolicy::None),
    ]
}

/// Ordered rules keyed by source annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<RewriteRule>,
    by_source: HashMap<String, usize>,
}

impl RuleTable {
    /// Validate and index `rules`.
    ///
    /// Names must be qualified Java names, sources must be unique, and no
    /// target may be the source of another rule.
    pub fn new(rules: Vec<RewriteRule>) -> Result<Self, RewriteError> {
        let mut by_source: HashMap<String, usize> = HashMap::with_capacity(rules.len());
        for (idx, rule) in rules.iter().enumerate() {
            for name in [&rule.source, &rule.target, &rule.target_import] {
                if !is_qualified_name(name) {
                    return Err(RewriteError::InvalidRule {
                        rule: rule.to_string(),
                        reason: format!("`{name}` is not a qualified Java name"),
                    });
                }
            }
            if rule.source == rule.target {
                return Err(RewriteError::InvalidRule {
                    rule: rule.to_string(),
                    reason: "source and target are the same annotation".to_string(),
                });
            }
            if let Some(&previous) = by_source.get(&rule.source) {
                return Err(RewriteError::RuleConflict {
                    annotation: rule.source.clone(),
                    first: rules[previous].target.clone(),
                    second: rule.target.clone(),
                    location: None,
                });
            }
            by_source.insert(rule.source.clone(), idx);
        }

        if let Some(chained) = rules.iter().find(|r| by_source.contains_key(&r.target)) {
            return Err(RewriteError::InvalidRule {
                rule: chained.to_string(),
                reason: format!("target `{}` is rewritten by another rule", chained.target),
            });
        }

        Ok(Self { rules, by_source })
    }

    /// The default JUnit 4 to JUnit 5 table.
    pub fn junit5() -> Self {
        let rules = junit5_rules();
        let by_source = rules
            .iter()
            .enumerate()
            .map(|(idx, rule)| (rule.source.clone(), idx))
            .collect();
        Self { rules, by_source }
    }

    pub fn get(&self, source: &str) -> Option<&RewriteRule> {
        self.by_source.get(source).map(|&idx| &self.rules[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RewriteRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::junit5()
    }
}

pub(crate) fn is_qualified_name(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^[\p{L}_$][\p{L}\p{N}_$]*(\.[\p{L}_$][\p{L}\p{N}_$]*)+$").expect("valid regex")
    });
    re.is_match(name)
}
