//! Built-in jobs for the plugin's markdown tree.

use crate::error::{Result, TextfixError};
use crate::job::Job;
use crate::rules::{ReplacementRule, ReplacementSet, RuleBook};
use crate::select::FileFilter;
use std::path::PathBuf;

pub const AGENT_DESCRIPTIONS: &str = "agent-descriptions";
pub const COMMAND_PATHS: &str = "command-paths";

/// `(name, summary)` for every preset, in listing order.
pub const PRESETS: &[(&str, &str)] = &[
    (
        AGENT_DESCRIPTIONS,
        "Replace 'Auto-invoked' phrasing in agents/bmad-*.md descriptions",
    ),
    (
        COMMAND_PATHS,
        "Rewrite /bmad/<command> references under commands/ to namespaced form",
    ),
];

const AGENT_RULES: &[(&str, &str, &str)] = &[
    (
        "bmad-pm.md",
        "Auto-invoked when working with product planning or PRD workflows.",
        "Use this agent for product planning and PRD workflows.",
    ),
    (
        "bmad-analyst.md",
        "Auto-invoked for analysis and research workflows.",
        "Use this agent for analysis and research workflows.",
    ),
    (
        "bmad-architect.md",
        "Auto-invoked for architecture and solutioning workflows.",
        "Use this agent for architecture and solutioning workflows.",
    ),
    (
        "bmad-sm.md",
        "Auto-invoked for sprint management and story creation workflows.",
        "Use this agent for sprint management and story creation workflows.",
    ),
    (
        "bmad-tea.md",
        "Auto-invoked for testing workflows.",
        "Use this agent for testing workflows.",
    ),
];

// Longer keys come before any key that is their prefix.
const COMMAND_RULES: &[(&str, &str)] = &[
    // meta
    ("/bmad/workflow-init", "/bmad:meta:workflow-init"),
    // cis
    ("/bmad/design-thinking", "/bmad:cis:design-thinking"),
    ("/bmad/innovation-strategy", "/bmad:cis:innovation-strategy"),
    ("/bmad/problem-solving", "/bmad:cis:problem-solving"),
    ("/bmad/storytelling", "/bmad:cis:storytelling"),
    // phase 1
    ("/bmad/brainstorm-project", "/bmad:phase-1:brainstorm-project"),
    ("/bmad/document-project", "/bmad:phase-1:document-project"),
    ("/bmad/domain-research", "/bmad:phase-1:domain-research"),
    ("/bmad/product-brief", "/bmad:phase-1:product-brief"),
    ("/bmad/research", "/bmad:phase-1:research"),
    // phase 2
    ("/bmad/create-epics-and-stories", "/bmad:phase-2:create-epics-and-stories"),
    ("/bmad/prd-validation-checklist", "/bmad:phase-2:prd-validation-checklist"),
    ("/bmad/prd", "/bmad:phase-2:prd"),
    ("/bmad/tech-spec", "/bmad:phase-2:tech-spec"),
    // phase 3
    ("/bmad/architecture", "/bmad:phase-3:architecture"),
    // phase 4
    ("/bmad/code-review", "/bmad:phase-4:code-review"),
    ("/bmad/create-story", "/bmad:phase-4:create-story"),
    ("/bmad/dev-story", "/bmad:phase-4:dev-story"),
    ("/bmad/epic-tech-context", "/bmad:phase-4:epic-tech-context"),
    ("/bmad/retrospective", "/bmad:phase-4:retrospective"),
    ("/bmad/security-test", "/bmad:phase-4:security-test"),
    ("/bmad/sprint-planning", "/bmad:phase-4:sprint-planning"),
    ("/bmad/story-context", "/bmad:phase-4:story-context"),
    ("/bmad/story-done", "/bmad:phase-4:story-done"),
    ("/bmad/story-ready", "/bmad:phase-4:story-ready"),
    // workflow status has no group
    ("/bmad/workflow-status", "/bmad:workflow-status"),
];

pub fn agent_descriptions() -> Result<Job> {
    let mut files = Vec::with_capacity(AGENT_RULES.len());
    let mut sets = Vec::with_capacity(AGENT_RULES.len());
    for (file, old, new) in AGENT_RULES {
        files.push(PathBuf::from(file));
        sets.push(ReplacementSet::for_file(
            *file,
            vec![ReplacementRule::new(*old, *new)?],
        ));
    }
    Ok(Job {
        name: AGENT_DESCRIPTIONS.to_string(),
        target: PathBuf::from("agents"),
        backup_prefix: ".agent-backups".to_string(),
        filter: FileFilter::Explicit(files),
        rules: RuleBook::new(sets),
    })
}

pub fn command_paths() -> Result<Job> {
    let rules = COMMAND_RULES
        .iter()
        .map(|(old, new)| ReplacementRule::new(*old, *new))
        .collect::<Result<Vec<_>>>()?;
    Ok(Job {
        name: COMMAND_PATHS.to_string(),
        target: PathBuf::from("commands"),
        backup_prefix: ".command-path-backups".to_string(),
        filter: FileFilter::Extension("md".to_string()),
        rules: RuleBook::new(vec![ReplacementSet::shared(rules)]),
    })
}

pub fn preset(name: &str) -> Result<Job> {
    match name {
        AGENT_DESCRIPTIONS => agent_descriptions(),
        COMMAND_PATHS => command_paths(),
        other => Err(TextfixError::UnknownPreset(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::apply_rules;
    use std::path::Path;

    #[test]
    fn every_listed_preset_resolves() {
        for (name, _) in PRESETS {
            let job = preset(name).unwrap();
            assert_eq!(job.name, *name);
        }
        assert!(matches!(
            preset("nope").unwrap_err(),
            TextfixError::UnknownPreset(_)
        ));
    }

    #[test]
    fn presets_validate_clean() {
        for (name, _) in PRESETS {
            let warnings = preset(name).unwrap().validate();
            assert!(warnings.is_empty(), "{name}: {warnings:?}");
        }
    }

    #[test]
    fn longer_command_key_not_corrupted() {
        let job = command_paths().unwrap();
        let rules = job.rules.rules_for(Path::new("x.md"));
        let (out, _) = apply_rules(
            "Run /bmad/prd, then /bmad/prd-validation-checklist.",
            rules,
        );
        assert_eq!(
            out,
            "Run /bmad:phase-2:prd, then /bmad:phase-2:prd-validation-checklist."
        );
    }

    #[test]
    fn command_paths_are_idempotent() {
        let job = command_paths().unwrap();
        let text: String = COMMAND_RULES
            .iter()
            .map(|(old, _)| format!("see {old}\n"))
            .collect();
        let (once, _) = apply_rules(&text, job.rules.all_rules());
        let (twice, applied) = apply_rules(&once, job.rules.all_rules());
        assert_eq!(once, twice);
        assert!(applied.is_empty());
        assert!(!once.contains("/bmad/"));
    }

    #[test]
    fn agent_rules_only_touch_their_own_file() {
        let job = agent_descriptions().unwrap();
        let pm = job.rules.rules_for(Path::new("bmad-pm.md"));
        assert_eq!(pm.len(), 1);
        let (out, applied) = apply_rules("Auto-invoked for testing workflows.", pm);
        assert!(applied.is_empty());
        assert_eq!(out, "Auto-invoked for testing workflows.");
    }
}
