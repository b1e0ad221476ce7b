//! Authorization policy backend driven by key-file rule directories.
//!
//! Rule files (`*.keyrules`) are discovered in an ordered list of
//! directories, compiled into an immutable [`RuleSet`], and consulted to
//! answer whether a subject may perform an action and which identities may
//! authenticate as administrator. A [`ReloadController`] swaps in a freshly
//! built set whenever the rule directories change.
//!
//! ```
//! use keyrules::{RequestContext, RuleFile, RuleSet, Verdict};
//!
//! let src = "\
//! [Policy]
//! Rules=wheel-mount
//!
//! [wheel-mount]
//! ActionContains=udisks2
//! InUnixGroups=%sudo%
//! Result=yes
//! ResultInverse=auth_admin
//! ";
//! let file = RuleFile::from_source("10-mount.keyrules", src).unwrap().unwrap();
//! let rules = RuleSet::new(vec![file], "wheel");
//!
//! let admin = RequestContext::new("alice").group("wheel");
//! let guest = RequestContext::new("guest");
//! assert_eq!(rules.evaluate("org.freedesktop.udisks2.mount", &admin), Verdict::Authorized);
//! assert_eq!(
//!     rules.evaluate("org.freedesktop.udisks2.mount", &guest),
//!     Verdict::AdministratorAuthenticationRequired
//! );
//! ```

mod admin;
mod authority;
mod compile;
mod config;
mod error;
mod evaluate;
mod loader;
pub mod parse;
mod reload;
mod types;
pub mod validate;

pub use admin::admin_identities;
pub use authority::{
    Authority, ContextError, ContextProvider, KeyfileAuthority, AUTHORITY_NAME, AUTHORITY_VERSION,
};
pub use config::{Config, DIRS_ENV, RULES_SUFFIX, WHEEL_GROUP_ENV};
pub use error::KeyrulesError;
pub use loader::{rules_file_order, LoadReport, LoadResult, LoadStatus, RuleSetLoader};
pub use reload::{ChangeKind, ReloadController, ReloadEvent, RulesWatcher};
pub use types::{
    Chain, CompileError, Constraint, Decision, EvaluationReport, FileBuilder, Identity,
    IdentityError, IdentityKind, RequestContext, Rule, RuleFile, RuleSet, RuleSetBuilder,
    UnknownVerdict, Verdict, DEFAULT_WHEEL_GROUP, MATCH_ALL, SUPERUSER, WHEEL_ALIAS,
};
