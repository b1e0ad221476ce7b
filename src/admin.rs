//! Administrator identity harvesting.
//!
//! Admin chains define a pool of accounts that may approve administrator
//! authentication. Harvesting is unconditional: no action or subject matching
//! is performed.

use tracing::warn;

use crate::evaluate::resolve_alias;
use crate::{Identity, IdentityKind, RequestContext, RuleFile, RuleSet};

pub(crate) fn harvest(files: &[RuleFile], wheel_group: &str) -> Vec<Identity> {
    let mut identities = Vec::new();

    for rule in files.iter().flat_map(|file| file.admin.iter()) {
        let lists = [
            (IdentityKind::UnixGroup, &rule.unix_groups),
            (IdentityKind::UnixUser, &rule.user_names),
            (IdentityKind::UnixNetgroup, &rule.net_groups),
        ];
        for (kind, list) in lists {
            for entry in list.iter().flatten() {
                match Identity::new(kind, resolve_alias(entry, wheel_group)) {
                    Ok(identity) => identities.push(identity),
                    Err(e) => {
                        warn!(rule = %rule.id, error = %e, "identity is not valid, ignoring");
                    }
                }
            }
        }
    }

    if identities.is_empty() {
        identities.push(Identity::superuser());
    }
    identities
}

/// Identities eligible to approve administrator authentication.
///
/// `context` is `None` when the caller could not resolve the subject; the
/// result is then the superuser alone. The result is never empty.
#[must_use]
pub fn admin_identities(rule_set: &RuleSet, context: Option<&RequestContext>) -> Vec<Identity> {
    match context {
        Some(_) => rule_set.admin_identities(),
        None => vec![Identity::superuser()],
    }
}
