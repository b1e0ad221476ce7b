//! Authorization interface served by the key-file rules.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::{Config, Identity, ReloadController, RequestContext, Verdict};

/// Backend name reported to callers.
pub const AUTHORITY_NAME: &str = "keyfile";

/// Backend version reported to callers.
pub const AUTHORITY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A subject could not be resolved into a [`RequestContext`].
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("unknown subject: {0}")]
    UnknownSubject(String),

    #[error("cannot determine user for subject: {0}")]
    UnresolvedUser(String),

    #[error("cannot determine groups for user '{user}': {reason}")]
    Groups { user: String, reason: String },
}

/// Resolves a caller-specific subject into the facts rules are matched against.
pub trait ContextProvider<S: ?Sized> {
    /// # Errors
    ///
    /// Returns [`ContextError`] when the subject cannot be resolved.
    fn prepare_context(&self, subject: &S) -> Result<RequestContext, ContextError>;
}

impl<S, F> ContextProvider<S> for F
where
    S: ?Sized,
    F: Fn(&S) -> Result<RequestContext, ContextError>,
{
    fn prepare_context(&self, subject: &S) -> Result<RequestContext, ContextError> {
        self(subject)
    }
}

/// The decisions the surrounding service asks of a policy backend.
///
/// `None` for the context means context preparation failed.
pub trait Authority {
    /// `NotAuthorized` when `context` is `None`, otherwise the first decision
    /// made by the active rules, or `Unknown`.
    fn check(&self, action_id: &str, context: Option<&RequestContext>) -> Verdict;

    /// Never empty. The superuser alone when `context` is `None`.
    fn admin_identities(&self, context: Option<&RequestContext>) -> Vec<Identity>;
}

impl Authority for ReloadController {
    fn check(&self, action_id: &str, context: Option<&RequestContext>) -> Verdict {
        match context {
            Some(ctx) => self.current().evaluate(action_id, ctx),
            None => Verdict::NotAuthorized,
        }
    }

    fn admin_identities(&self, context: Option<&RequestContext>) -> Vec<Identity> {
        crate::admin::admin_identities(&self.current(), context)
    }
}

/// Key-file policy backend: a reloading rule set plus a subject resolver.
pub struct KeyfileAuthority<P> {
    rules: Arc<ReloadController>,
    provider: P,
}

impl<P> std::fmt::Debug for KeyfileAuthority<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyfileAuthority")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl<P> KeyfileAuthority<P> {
    /// Load rules per `config` and resolve subjects with `provider`.
    #[must_use]
    pub fn new(config: &Config, provider: P) -> Self {
        Self::with_controller(Arc::new(ReloadController::new(config)), provider)
    }

    #[must_use]
    pub fn with_controller(rules: Arc<ReloadController>, provider: P) -> Self {
        Self { rules, provider }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        AUTHORITY_NAME
    }

    #[must_use]
    pub fn version(&self) -> &'static str {
        AUTHORITY_VERSION
    }

    /// The reload controller, for wiring change notifications and watchers.
    #[must_use]
    pub fn rules(&self) -> &Arc<ReloadController> {
        &self.rules
    }

    fn context<S>(&self, subject: &S) -> Option<RequestContext>
    where
        S: ?Sized,
        P: ContextProvider<S>,
    {
        match self.provider.prepare_context(subject) {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                warn!(error = %e, "failed to prepare request context");
                None
            }
        }
    }

    /// Decide `action_id` for `subject`. `Unknown` resolves to `implicit`;
    /// an unresolvable subject is `NotAuthorized`.
    pub fn check_authorization<S>(&self, subject: &S, action_id: &str, implicit: Verdict) -> Verdict
    where
        S: ?Sized,
        P: ContextProvider<S>,
    {
        let ctx = self.context(subject);
        let verdict = self.rules.check(action_id, ctx.as_ref());
        debug!(action = action_id, %verdict, "checked authorization");
        verdict.or(implicit)
    }

    /// Identities allowed to authenticate as administrator for `subject`.
    pub fn admin_identities_for<S>(&self, subject: &S) -> Vec<Identity>
    where
        S: ?Sized,
        P: ContextProvider<S>,
    {
        let ctx = self.context(subject);
        self.rules.admin_identities(ctx.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn resolve(user: &str) -> Result<RequestContext, ContextError> {
        match user {
            "alice" => Ok(RequestContext::new("alice").group("wheel").local(true).active(true)),
            other => Err(ContextError::UnknownSubject(other.to_owned())),
        }
    }

    fn authority() -> KeyfileAuthority<fn(&str) -> Result<RequestContext, ContextError>> {
        let config = Config::default().with_dirs(Vec::<PathBuf>::new());
        KeyfileAuthority::new(&config, resolve as fn(&str) -> _)
    }

    #[test]
    fn unknown_falls_back_to_implicit() {
        let auth = authority();
        assert_eq!(
            auth.check_authorization("alice", "org.a", Verdict::AuthenticationRequired),
            Verdict::AuthenticationRequired
        );
    }

    #[test]
    fn unresolved_subject_is_denied() {
        let auth = authority();
        assert_eq!(
            auth.check_authorization("mallory", "org.a", Verdict::Authorized),
            Verdict::NotAuthorized
        );
    }

    #[test]
    fn unresolved_subject_gets_superuser_admins() {
        assert_eq!(
            authority().admin_identities_for("mallory"),
            vec![Identity::superuser()]
        );
    }

    #[test]
    fn closure_provider() {
        let provider = |uid: &u32| -> Result<RequestContext, ContextError> {
            Ok(RequestContext::new(uid.to_string()))
        };
        let ctx = provider.prepare_context(&1000).unwrap();
        assert_eq!(ctx.username(), "1000");
    }

    #[test]
    fn name_and_version() {
        let auth = authority();
        assert_eq!(auth.name(), "keyfile");
        assert_eq!(auth.version(), env!("CARGO_PKG_VERSION"));
    }
}
