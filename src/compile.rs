use std::collections::HashSet;
use std::path::PathBuf;

use tracing::debug;

use crate::parse::KeyFile;
use crate::{Chain, CompileError, Rule, RuleFile, Verdict};

/// Top-level group holding the `Rules` and `AdminRules` lists.
pub(crate) const POLICY_GROUP: &str = "Policy";

pub(crate) fn compile(path: PathBuf, keyfile: &KeyFile) -> Result<Option<RuleFile>, CompileError> {
    let normal = compile_chain(keyfile, Chain::Normal)?;
    let admin = compile_chain(keyfile, Chain::Admin)?;

    for rule in normal.iter().filter(|r| !r.has_action_constraint()) {
        debug!(
            path = %path.display(),
            rule = %rule.id,
            "rule declares no action constraint and can never match"
        );
    }

    Ok(RuleFile::new(path, normal, admin))
}

fn compile_chain(keyfile: &KeyFile, chain: Chain) -> Result<Vec<Rule>, CompileError> {
    let Some(names) = keyfile.string_list(POLICY_GROUP, chain.key())? else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(names.len());
    for name in &names {
        let name = name.trim();
        if !seen.insert(name) {
            return Err(CompileError::DuplicateRule {
                chain: chain.key(),
                rule: name.to_owned(),
            });
        }
        rules.push(compile_rule(keyfile, name, chain)?);
    }
    Ok(rules)
}

fn compile_rule(keyfile: &KeyFile, id: &str, chain: Chain) -> Result<Rule, CompileError> {
    if !keyfile.has_group(id) {
        return Err(CompileError::MissingRule {
            chain: chain.key(),
            rule: id.to_owned(),
        });
    }

    Ok(Rule {
        id: id.to_owned(),
        actions: list(keyfile, id, "Actions")?,
        action_contains: list(keyfile, id, "ActionContains")?,
        unix_groups: list(keyfile, id, "InUnixGroups")?,
        user_names: list(keyfile, id, "InUserNames")?,
        net_groups: list(keyfile, id, "InNetGroups")?,
        subject_active: keyfile.boolean(id, "SubjectActive")?,
        subject_local: keyfile.boolean(id, "SubjectLocal")?,
        result: verdict(keyfile, id, "Result")?,
        result_inverse: verdict(keyfile, id, "ResultInverse")?,
    })
}

fn list(keyfile: &KeyFile, group: &str, key: &str) -> Result<Option<Vec<String>>, CompileError> {
    Ok(keyfile
        .string_list(group, key)?
        .map(|items| items.iter().map(|s| s.trim().to_owned()).collect()))
}

fn verdict(
    keyfile: &KeyFile,
    group: &str,
    key: &'static str,
) -> Result<Option<Verdict>, CompileError> {
    keyfile
        .string(group, key)?
        .map(|raw| {
            raw.parse::<Verdict>()
                .map_err(|_| CompileError::InvalidResult {
                    rule: group.to_owned(),
                    key,
                    value: raw.trim().to_owned(),
                })
        })
        .transpose()
}
