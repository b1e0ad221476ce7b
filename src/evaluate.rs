use std::time::Instant;

use crate::types::{Decision, EvaluationReport};
use crate::{Constraint, RequestContext, Rule, RuleFile, Verdict, MATCH_ALL, WHEEL_ALIAS};

/// Result of testing a single rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RuleOutcome {
    /// The action id did not match; the rule contributes nothing.
    NoMatch,
    /// The action and every declared constraint matched.
    Matched(Option<Verdict>),
    /// The action matched but `constraint` did not.
    Failed {
        constraint: Constraint,
        inverse: Option<Verdict>,
    },
}

impl RuleOutcome {
    pub(crate) fn verdict(self) -> Verdict {
        match self {
            RuleOutcome::Matched(Some(v)) | RuleOutcome::Failed { inverse: Some(v), .. } => v,
            _ => Verdict::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    Pass,
    Fail,
    NotApplicable,
}

impl From<Option<bool>> for Check {
    fn from(declared: Option<bool>) -> Self {
        match declared {
            None => Check::NotApplicable,
            Some(true) => Check::Pass,
            Some(false) => Check::Fail,
        }
    }
}

/// Expand the wheel alias in a list entry.
pub(crate) fn resolve_alias<'a>(entry: &'a str, wheel_group: &'a str) -> &'a str {
    if entry == WHEEL_ALIAS {
        wheel_group
    } else {
        entry
    }
}

fn action_matches(rule: &Rule, action_id: &str) -> bool {
    let exact = rule
        .actions
        .iter()
        .flatten()
        .any(|a| a == action_id || a == MATCH_ALL);
    exact
        || rule
            .action_contains
            .iter()
            .flatten()
            .any(|s| action_id.contains(s.as_str()))
}

fn subject_checks(
    rule: &Rule,
    ctx: &RequestContext,
    wheel_group: &str,
) -> [(Constraint, Check); 4] {
    [
        (
            Constraint::SubjectActive,
            rule.subject_active.map(|want| want == ctx.is_active()).into(),
        ),
        (
            Constraint::SubjectLocal,
            rule.subject_local.map(|want| want == ctx.is_local()).into(),
        ),
        (
            Constraint::UnixGroups,
            rule.unix_groups
                .as_ref()
                .map(|groups| {
                    groups
                        .iter()
                        .any(|g| ctx.in_group(resolve_alias(g, wheel_group)))
                })
                .into(),
        ),
        (
            Constraint::UserNames,
            rule.user_names
                .as_ref()
                .map(|names| names.iter().any(|n| n == ctx.username()))
                .into(),
        ),
    ]
}

pub(crate) fn test_rule(
    rule: &Rule,
    action_id: &str,
    ctx: &RequestContext,
    wheel_group: &str,
) -> RuleOutcome {
    if !action_matches(rule, action_id) {
        return RuleOutcome::NoMatch;
    }

    let failed = subject_checks(rule, ctx, wheel_group)
        .into_iter()
        .find(|(_, check)| *check == Check::Fail);

    match failed {
        None => RuleOutcome::Matched(rule.result),
        Some((constraint, _)) => RuleOutcome::Failed {
            constraint,
            inverse: rule.result_inverse,
        },
    }
}

/// Walk every file's normal chain in order; the first decision wins.
pub(crate) fn evaluate(
    files: &[RuleFile],
    action_id: &str,
    ctx: &RequestContext,
    wheel_group: &str,
) -> Verdict {
    files
        .iter()
        .flat_map(|file| file.normal.iter())
        .map(|rule| test_rule(rule, action_id, ctx, wheel_group).verdict())
        .find(|v| !v.is_unknown())
        .unwrap_or(Verdict::Unknown)
}

pub(crate) fn evaluate_detailed(
    files: &[RuleFile],
    action_id: &str,
    ctx: &RequestContext,
    wheel_group: &str,
) -> EvaluationReport {
    let start = Instant::now();
    let mut visited = Vec::new();

    for file in files {
        for rule in &file.normal {
            visited.push(format!("{}:{}", file.path.display(), rule.id));
            let outcome = test_rule(rule, action_id, ctx, wheel_group);
            let verdict = outcome.verdict();
            if verdict.is_unknown() {
                continue;
            }
            let failed = match outcome {
                RuleOutcome::Failed { constraint, .. } => Some(constraint),
                _ => None,
            };
            let decision = Decision::new(&file.path, &rule.id, failed);
            return EvaluationReport::new(verdict, Some(decision), visited, start.elapsed());
        }
    }

    EvaluationReport::new(Verdict::Unknown, None, visited, start.elapsed())
}
