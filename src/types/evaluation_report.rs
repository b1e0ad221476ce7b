use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::verdict::Verdict;

/// A subject constraint checked after a rule's action matched, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    SubjectActive,
    SubjectLocal,
    UnixGroups,
    UserNames,
}

impl Constraint {
    /// The rule-file key that declares this constraint.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Constraint::SubjectActive => "SubjectActive",
            Constraint::SubjectLocal => "SubjectLocal",
            Constraint::UnixGroups => "InUnixGroups",
            Constraint::UserNames => "InUserNames",
        }
    }
}

/// The rule that produced a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    file: PathBuf,
    rule: String,
    failed: Option<Constraint>,
}

impl Decision {
    pub(crate) fn new(file: &Path, rule: &str, failed: Option<Constraint>) -> Self {
        Self {
            file: file.to_path_buf(),
            rule: rule.to_owned(),
            failed,
        }
    }

    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    #[must_use]
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// The constraint whose failure selected `ResultInverse`, if that is how
    /// the decision was reached.
    #[must_use]
    pub fn failed_constraint(&self) -> Option<Constraint> {
        self.failed
    }

    #[must_use]
    pub fn is_inverse(&self) -> bool {
        self.failed.is_some()
    }
}

/// Detailed evaluation report returned by
/// [`RuleSet::evaluate_detailed()`](super::ruleset::RuleSet::evaluate_detailed).
///
/// Contains the verdict, the deciding rule, every rule visited, and the
/// wall-clock duration of the evaluation.
#[derive(Debug, Clone)]
#[must_use]
pub struct EvaluationReport {
    verdict: Verdict,
    decision: Option<Decision>,
    visited: Vec<String>,
    duration: Duration,
}

impl EvaluationReport {
    pub(crate) fn new(
        verdict: Verdict,
        decision: Option<Decision>,
        visited: Vec<String>,
        duration: Duration,
    ) -> Self {
        Self {
            verdict,
            decision,
            visited,
            duration,
        }
    }

    /// The evaluation verdict, same as [`RuleSet::evaluate()`](super::ruleset::RuleSet::evaluate).
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// The deciding rule, or `None` when the verdict is `Unknown`.
    #[must_use]
    pub fn decision(&self) -> Option<&Decision> {
        self.decision.as_ref()
    }

    /// Rules visited, as `file:rule`, in evaluation order.
    #[must_use]
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    /// Wall-clock duration of the evaluation.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "verdict: {}", self.verdict)?;
        if let Some(d) = &self.decision {
            write!(f, " by {}:{}", d.file.display(), d.rule)?;
            if let Some(c) = d.failed {
                write!(f, " (inverse, {} failed)", c.key())?;
            }
        }
        write!(f, ", visited: [{}]", self.visited.join(", "))?;
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}
