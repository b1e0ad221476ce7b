use std::fmt;
use std::path::{Path, PathBuf};

use super::verdict::Verdict;

/// Alias in `InUnixGroups` / `InNetGroups` entries that stands for the
/// configured wheel group.
pub const WHEEL_ALIAS: &str = "%sudo%";

/// Action pattern that matches every action id.
pub const MATCH_ALL: &str = "*";

/// One named rule block from a rule file.
///
/// Every constraint is optional: `None` means the key was not declared and the
/// constraint is ignored, while `Some(vec![])` is a declared but empty list
/// that nothing can satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub id: String,
    pub actions: Option<Vec<String>>,
    pub action_contains: Option<Vec<String>>,
    pub unix_groups: Option<Vec<String>>,
    pub user_names: Option<Vec<String>>,
    pub net_groups: Option<Vec<String>>,
    pub subject_active: Option<bool>,
    pub subject_local: Option<bool>,
    pub result: Option<Verdict>,
    pub result_inverse: Option<Verdict>,
}

impl Rule {
    /// A rule with no constraints declared.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            actions: None,
            action_contains: None,
            unix_groups: None,
            user_names: None,
            net_groups: None,
            subject_active: None,
            subject_local: None,
            result: None,
            result_inverse: None,
        }
    }

    #[must_use]
    pub fn actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn action_contains<I, S>(mut self, substrings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.action_contains = Some(substrings.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn unix_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unix_groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn user_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn net_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.net_groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn subject_active(mut self, active: bool) -> Self {
        self.subject_active = Some(active);
        self
    }

    #[must_use]
    pub fn subject_local(mut self, local: bool) -> Self {
        self.subject_local = Some(local);
        self
    }

    #[must_use]
    pub fn result(mut self, verdict: Verdict) -> Self {
        self.result = Some(verdict);
        self
    }

    #[must_use]
    pub fn result_inverse(mut self, verdict: Verdict) -> Self {
        self.result_inverse = Some(verdict);
        self
    }

    /// Whether any action-matching constraint is declared. Rules without one
    /// never match an action.
    #[must_use]
    pub fn has_action_constraint(&self) -> bool {
        self.actions.is_some() || self.action_contains.is_some()
    }

    /// Whether any constraint other than the action match is declared.
    #[must_use]
    pub fn has_subject_constraint(&self) -> bool {
        self.subject_active.is_some()
            || self.subject_local.is_some()
            || self.unix_groups.is_some()
            || self.user_names.is_some()
    }

    /// Whether any identity list usable by the admin harvester is declared.
    #[must_use]
    pub fn has_identity_lists(&self) -> bool {
        self.unix_groups.is_some() || self.user_names.is_some() || self.net_groups.is_some()
    }
}

/// Which of a file's two rule chains a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    /// Listed under `Rules=`; consulted by authorization checks.
    Normal,
    /// Listed under `AdminRules=`; harvested for administrator identities.
    Admin,
}

impl Chain {
    /// The `[Policy]` key that lists this chain's rules.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Chain::Normal => "Rules",
            Chain::Admin => "AdminRules",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One compiled rule file: two independently ordered chains.
///
/// Never constructed with both chains empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFile {
    pub(crate) path: PathBuf,
    pub(crate) normal: Vec<Rule>,
    pub(crate) admin: Vec<Rule>,
}

impl RuleFile {
    /// Returns `None` when both chains are empty.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, normal: Vec<Rule>, admin: Vec<Rule>) -> Option<Self> {
        if normal.is_empty() && admin.is_empty() {
            return None;
        }
        Some(Self {
            path: path.into(),
            normal,
            admin,
        })
    }

    /// Compile rule-file source text. `Ok(None)` when the source declares no
    /// rules.
    ///
    /// # Errors
    ///
    /// Returns [`KeyrulesError`](crate::KeyrulesError) on parse or compile failure.
    pub fn from_source(
        path: impl Into<PathBuf>,
        input: &str,
    ) -> Result<Option<Self>, crate::KeyrulesError> {
        let keyfile = crate::parse::parse(input)?;
        let file = crate::compile::compile(path.into(), &keyfile)?;
        Ok(file)
    }

    /// Read and compile a rule file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`KeyrulesError`](crate::KeyrulesError) on I/O, parse, or compile failure.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Option<Self>, crate::KeyrulesError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)?;
        Self::from_source(path, &input)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn normal(&self) -> &[Rule] {
        &self.normal
    }

    #[must_use]
    pub fn admin(&self) -> &[Rule] {
        &self.admin
    }

    #[must_use]
    pub fn chain(&self, chain: Chain) -> &[Rule] {
        match chain {
            Chain::Normal => &self.normal,
            Chain::Admin => &self.admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rule_declares_nothing() {
        let rule = Rule::new("empty");
        assert!(!rule.has_action_constraint());
        assert!(!rule.has_subject_constraint());
        assert!(!rule.has_identity_lists());
        assert_eq!(rule.result, None);
    }

    #[test]
    fn empty_list_is_still_declared() {
        let rule = Rule::new("r").unix_groups(Vec::<String>::new());
        assert_eq!(rule.unix_groups, Some(vec![]));
        assert!(rule.has_subject_constraint());
    }

    #[test]
    fn rule_file_requires_a_chain() {
        assert!(RuleFile::new("a.keyrules", vec![], vec![]).is_none());
        let file = RuleFile::new("a.keyrules", vec![], vec![Rule::new("admins")]).unwrap();
        assert!(file.normal().is_empty());
        assert_eq!(file.chain(Chain::Admin).len(), 1);
    }
}
