//! Lints for rule files that compile but cannot behave as written.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{Chain, Rule, RuleFile, MATCH_ALL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Normal rule with neither `Actions` nor `ActionContains`; it never matches.
    NoActionConstraint,
    /// Normal rule with neither `Result` nor `ResultInverse`; it never decides.
    NoResult,
    /// `ResultInverse` on a rule whose only constraint is the action match.
    UnreachableInverse,
    /// `Actions` entry containing `*` that is not the lone wildcard.
    EmbeddedWildcard,
    /// Admin rule that lists no groups, users, or netgroups.
    NoIdentities,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::NoActionConstraint => "rule has no action constraint and never matches",
            DiagnosticKind::NoResult => "rule has no Result or ResultInverse and never decides",
            DiagnosticKind::UnreachableInverse => {
                "ResultInverse can never apply without a subject constraint"
            }
            DiagnosticKind::EmbeddedWildcard => {
                "'*' only matches everything when it is the whole entry"
            }
            DiagnosticKind::NoIdentities => "admin rule names no identities",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub chain: Chain,
    pub rule: String,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    fn new(path: &Path, chain: Chain, rule: &Rule, kind: DiagnosticKind) -> Self {
        Self {
            path: path.to_path_buf(),
            chain,
            rule: rule.id.clone(),
            kind,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} '{}': {}",
            self.path.display(),
            self.chain,
            self.rule,
            self.kind
        )
    }
}

/// Report rules in `file` that can never contribute what they appear to.
#[must_use]
pub fn lint(file: &RuleFile) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let path = file.path();

    for rule in file.normal() {
        let mut push = |kind| out.push(Diagnostic::new(path, Chain::Normal, rule, kind));
        if !rule.has_action_constraint() {
            push(DiagnosticKind::NoActionConstraint);
        }
        if rule.result.is_none() && rule.result_inverse.is_none() {
            push(DiagnosticKind::NoResult);
        }
        if rule.result_inverse.is_some() && !rule.has_subject_constraint() {
            push(DiagnosticKind::UnreachableInverse);
        }
        let embedded = rule
            .actions
            .iter()
            .flatten()
            .any(|a| a != MATCH_ALL && a.contains('*'));
        if embedded {
            push(DiagnosticKind::EmbeddedWildcard);
        }
    }

    for rule in file.admin() {
        if !rule.has_identity_lists() {
            out.push(Diagnostic::new(path, Chain::Admin, rule, DiagnosticKind::NoIdentities));
        }
    }

    out
}
