mod context;
mod error;
mod evaluation_report;
mod identity;
mod rule;
mod ruleset;
mod verdict;

pub use context::RequestContext;
pub use error::CompileError;
pub use evaluation_report::{Constraint, Decision, EvaluationReport};
pub use identity::{Identity, IdentityError, IdentityKind, SUPERUSER};
pub use rule::{Chain, Rule, RuleFile, MATCH_ALL, WHEEL_ALIAS};
pub use ruleset::{FileBuilder, RuleSet, RuleSetBuilder, DEFAULT_WHEEL_GROUP};
pub use verdict::{UnknownVerdict, Verdict};
