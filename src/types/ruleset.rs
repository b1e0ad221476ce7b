use std::fmt;
use std::path::PathBuf;

use super::context::RequestContext;
use super::evaluation_report::EvaluationReport;
use super::identity::Identity;
use super::rule::{Rule, RuleFile};
use super::verdict::Verdict;

/// Wheel group used when none is configured.
pub const DEFAULT_WHEEL_GROUP: &str = "wheel";

/// Builder for constructing a [`RuleSet`] without going through rule files on
/// disk.
///
/// # Example
///
/// ```
/// use keyrules::{RequestContext, Rule, RuleSetBuilder, Verdict};
///
/// let rules = RuleSetBuilder::new()
///     .file("10-admin.keyrules", |f| {
///         f.rule(Rule::new("wheel-yes").actions(["*"]).unix_groups(["%sudo%"]).result(Verdict::Authorized))
///             .admin_rule(Rule::new("admins").unix_groups(["%sudo%"]))
///     })
///     .wheel_group("sudo")
///     .build();
///
/// let ctx = RequestContext::new("alice").group("sudo");
/// assert_eq!(rules.evaluate("org.example.action", &ctx), Verdict::Authorized);
/// ```
#[derive(Debug)]
pub struct RuleSetBuilder {
    files: Vec<FileBuilder>,
    wheel_group: String,
}

/// Intermediate builder passed to the file definition closure.
#[derive(Debug)]
pub struct FileBuilder {
    path: PathBuf,
    normal: Vec<Rule>,
    admin: Vec<Rule>,
}

impl Default for RuleSetBuilder {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            wheel_group: DEFAULT_WHEEL_GROUP.to_owned(),
        }
    }
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a file. Files are evaluated in the order they are added.
    #[must_use]
    pub fn file(
        mut self,
        path: impl Into<PathBuf>,
        f: impl FnOnce(FileBuilder) -> FileBuilder,
    ) -> Self {
        self.files.push(f(FileBuilder {
            path: path.into(),
            normal: Vec::new(),
            admin: Vec::new(),
        }));
        self
    }

    /// Group that `%sudo%` stands for.
    #[must_use]
    pub fn wheel_group(mut self, group: impl Into<String>) -> Self {
        self.wheel_group = group.into();
        self
    }

    /// Build the rule set. Files with neither chain populated are dropped.
    #[must_use]
    pub fn build(self) -> RuleSet {
        let files = self
            .files
            .into_iter()
            .filter_map(|f| RuleFile::new(f.path, f.normal, f.admin))
            .collect();
        RuleSet::new(files, self.wheel_group)
    }
}

impl FileBuilder {
    /// Append a rule to the normal chain.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.normal.push(rule);
        self
    }

    /// Append a rule to the admin chain.
    #[must_use]
    pub fn admin_rule(mut self, rule: Rule) -> Self {
        self.admin.push(rule);
        self
    }
}

/// An ordered, immutable snapshot of compiled rule files. Thread-safe and
/// designed to live behind `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub(crate) files: Vec<RuleFile>,
    pub(crate) wheel_group: String,
}

impl RuleSet {
    /// Files must already be in evaluation order.
    #[must_use]
    pub fn new(files: Vec<RuleFile>, wheel_group: impl Into<String>) -> Self {
        Self {
            files,
            wheel_group: wheel_group.into(),
        }
    }

    #[must_use]
    pub fn empty(wheel_group: impl Into<String>) -> Self {
        Self::new(Vec::new(), wheel_group)
    }

    /// Evaluate an action request against every file's normal chain.
    ///
    /// Returns the first non-`Unknown` verdict, or `Unknown` if no rule
    /// decides.
    #[must_use]
    pub fn evaluate(&self, action_id: &str, ctx: &RequestContext) -> Verdict {
        crate::evaluate::evaluate(&self.files, action_id, ctx, &self.wheel_group)
    }

    /// Evaluate with detailed diagnostics.
    ///
    /// Returns an [`EvaluationReport`] with the verdict, the deciding rule,
    /// every rule visited, and timing information.
    pub fn evaluate_detailed(&self, action_id: &str, ctx: &RequestContext) -> EvaluationReport {
        crate::evaluate::evaluate_detailed(&self.files, action_id, ctx, &self.wheel_group)
    }

    /// Identities harvested from every file's admin chain, falling back to
    /// the superuser when none are valid.
    #[must_use]
    pub fn admin_identities(&self) -> Vec<Identity> {
        crate::admin::harvest(&self.files, &self.wheel_group)
    }

    #[must_use]
    pub fn files(&self) -> &[RuleFile] {
        &self.files
    }

    #[must_use]
    pub fn wheel_group(&self) -> &str {
        &self.wheel_group
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let normal: usize = self.files.iter().map(|f| f.normal.len()).sum();
        let admin: usize = self.files.iter().map(|f| f.admin.len()).sum();
        write!(
            f,
            "RuleSet({} files, {} rules, {} admin rules)",
            self.files.len(),
            normal,
            admin,
        )
    }
}
