use crate::error::{Result, TextfixError};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

// ---------------------------------------------------------------------------
// ReplacementRule
// ---------------------------------------------------------------------------

/// A single literal substitution: every occurrence of `old` becomes `new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementRule {
    old: String,
    new: String,
}

impl ReplacementRule {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Result<Self> {
        let rule = Self {
            old: old.into(),
            new: new.into(),
        };
        rule.check()?;
        Ok(rule)
    }

    pub fn pattern(&self) -> &str {
        &self.old
    }

    pub fn replacement(&self) -> &str {
        &self.new
    }

    /// Rules deserialized from YAML bypass `new`, so loaders call this.
    pub(crate) fn check(&self) -> Result<()> {
        if self.old.is_empty() {
            return Err(TextfixError::InvalidRule(format!(
                "pattern must be non-empty (replacement '{}')",
                self.new
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ReplacementSet
// ---------------------------------------------------------------------------

/// Which files a set of rules applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleScope {
    /// Every selected file.
    AllFiles,
    /// One file, relative to the target directory.
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementSet {
    pub scope: RuleScope,
    pub rules: Vec<ReplacementRule>,
}

impl ReplacementSet {
    pub fn shared(rules: Vec<ReplacementRule>) -> Self {
        Self {
            scope: RuleScope::AllFiles,
            rules,
        }
    }

    pub fn for_file(path: impl Into<PathBuf>, rules: Vec<ReplacementRule>) -> Self {
        Self {
            scope: RuleScope::File(path.into()),
            rules,
        }
    }

    fn applies_to(&self, relative: &Path) -> bool {
        match &self.scope {
            RuleScope::AllFiles => true,
            RuleScope::File(p) => p == relative,
        }
    }
}

// ---------------------------------------------------------------------------
// RuleBook
// ---------------------------------------------------------------------------

/// Ordered collection of replacement sets. Immutable once built and always
/// passed explicitly into a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleBook {
    sets: Vec<ReplacementSet>,
}

impl RuleBook {
    pub fn new(sets: Vec<ReplacementSet>) -> Self {
        Self { sets }
    }

    pub fn sets(&self) -> &[ReplacementSet] {
        &self.sets
    }

    pub fn is_empty(&self) -> bool {
        self.sets.iter().all(|s| s.rules.is_empty())
    }

    /// Every rule, across all sets, in declared order.
    pub fn all_rules(&self) -> impl Iterator<Item = &ReplacementRule> {
        self.sets.iter().flat_map(|s| s.rules.iter())
    }

    /// The rules that apply to `relative`, concatenated in declared order.
    pub fn rules_for(&self, relative: &Path) -> Vec<&ReplacementRule> {
        self.sets
            .iter()
            .filter(|s| s.applies_to(relative))
            .flat_map(|s| s.rules.iter())
            .collect()
    }

    /// Lint the rule book. Returns human-readable warnings; never fails.
    ///
    /// Ordering checks compare every pair of rules that can reach the same
    /// file, so a per-file rule is checked against the shared table too.
    pub fn validate(&self) -> Vec<RuleWarning> {
        let mut warnings = Vec::new();

        for set in &self.sets {
            if let RuleScope::File(path) = &set.scope {
                if escapes_target(path) {
                    warnings.push(RuleWarning {
                        message: format!(
                            "file scope '{}' points outside the target directory",
                            path.display()
                        ),
                    });
                }
            }
        }

        let ordered: Vec<(&RuleScope, &ReplacementRule)> = self
            .sets
            .iter()
            .flat_map(|s| s.rules.iter().map(move |r| (&s.scope, r)))
            .collect();

        for (i, (scope_a, earlier)) in ordered.iter().enumerate() {
            for (scope_b, later) in &ordered[i + 1..] {
                if !scopes_overlap(scope_a, scope_b) {
                    continue;
                }
                if earlier.old == later.old {
                    warnings.push(RuleWarning {
                        message: format!(
                            "pattern '{}' is declared more than once; only the first rule can match",
                            earlier.old
                        ),
                    });
                } else if later.old.contains(&earlier.old) {
                    warnings.push(RuleWarning {
                        message: format!(
                            "pattern '{}' runs before '{}' and rewrites part of it; declare the longer pattern first",
                            earlier.old, later.old
                        ),
                    });
                }
            }
        }

        warnings
    }
}

fn scopes_overlap(a: &RuleScope, b: &RuleScope) -> bool {
    match (a, b) {
        (RuleScope::File(x), RuleScope::File(y)) => x == y,
        _ => true,
    }
}

/// True when a path meant to be relative to the target directory is absolute
/// or climbs out of it.
pub fn escapes_target(path: &Path) -> bool {
    path.is_absolute() || path.components().any(|c| matches!(c, Component::ParentDir))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleWarning {
    pub message: String,
}

// ---------------------------------------------------------------------------
// In-memory application
// ---------------------------------------------------------------------------

/// A rule that matched, with how many occurrences it replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRule {
    pub old: String,
    pub new: String,
    pub occurrences: usize,
}

/// Apply `rules` to `content` in order. A later rule sees the output of the
/// earlier ones. Returns the rewritten text and the rules that matched.
pub fn apply_rules<'a, I>(content: &str, rules: I) -> (String, Vec<AppliedRule>)
where
    I: IntoIterator<Item = &'a ReplacementRule>,
{
    let mut current = content.to_string();
    let mut applied = Vec::new();

    for rule in rules {
        let occurrences = current.matches(rule.old.as_str()).count();
        if occurrences == 0 {
            continue;
        }
        current = current.replace(rule.old.as_str(), &rule.new);
        applied.push(AppliedRule {
            old: rule.old.clone(),
            new: rule.new.clone(),
            occurrences,
        });
    }

    (current, applied)
}
