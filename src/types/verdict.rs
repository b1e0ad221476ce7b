use std::fmt;
use std::str::FromStr;

/// Outcome of an authorization check.
///
/// `Unknown` means the policy expresses no opinion and the caller applies its
/// own implicit default. Every other variant is a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[must_use]
pub enum Verdict {
    #[default]
    Unknown,
    /// `no`
    NotAuthorized,
    /// `auth_self`
    AuthenticationRequired,
    /// `auth_admin`
    AdministratorAuthenticationRequired,
    /// `auth_self_keep`
    AuthenticationRequiredRetained,
    /// `auth_admin_keep`
    AdministratorAuthenticationRequiredRetained,
    /// `yes`
    Authorized,
}

/// Returned when a string is not one of the recognised result names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a recognised result")]
pub struct UnknownVerdict(pub String);

impl Verdict {
    /// All decisions that may be written as `Result=` / `ResultInverse=`.
    pub const DECISIONS: [Verdict; 6] = [
        Verdict::NotAuthorized,
        Verdict::AuthenticationRequired,
        Verdict::AdministratorAuthenticationRequired,
        Verdict::AuthenticationRequiredRetained,
        Verdict::AdministratorAuthenticationRequiredRetained,
        Verdict::Authorized,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Unknown => "unknown",
            Verdict::NotAuthorized => "no",
            Verdict::AuthenticationRequired => "auth_self",
            Verdict::AdministratorAuthenticationRequired => "auth_admin",
            Verdict::AuthenticationRequiredRetained => "auth_self_keep",
            Verdict::AdministratorAuthenticationRequiredRetained => "auth_admin_keep",
            Verdict::Authorized => "yes",
        }
    }

    #[must_use]
    pub fn is_unknown(self) -> bool {
        self == Verdict::Unknown
    }

    /// Substitute `implicit` when this verdict is `Unknown`.
    pub fn or(self, implicit: Verdict) -> Verdict {
        if self.is_unknown() {
            implicit
        } else {
            self
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = UnknownVerdict;

    /// Case-insensitive and whitespace-trimmed. `unknown` is rejected: a rule
    /// result must be a decision.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Verdict::DECISIONS
            .into_iter()
            .find(|v| v.as_str() == needle)
            .ok_or_else(|| UnknownVerdict(s.trim().to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_trimmed() {
        assert_eq!(" YES ".parse::<Verdict>(), Ok(Verdict::Authorized));
        assert_eq!("Auth_Admin_Keep".parse::<Verdict>(), Ok(Verdict::AdministratorAuthenticationRequiredRetained));
        assert_eq!("no".parse::<Verdict>(), Ok(Verdict::NotAuthorized));
    }

    #[test]
    fn unknown_is_not_a_decision() {
        assert!("unknown".parse::<Verdict>().is_err());
        assert!("allow".parse::<Verdict>().is_err());
        assert!("".parse::<Verdict>().is_err());
    }

    #[test]
    fn display_round_trips_decisions() {
        for v in Verdict::DECISIONS {
            assert_eq!(v.to_string().parse::<Verdict>(), Ok(v));
        }
        assert_eq!(Verdict::Unknown.to_string(), "unknown");
    }

    #[test]
    fn or_only_replaces_unknown() {
        assert_eq!(Verdict::Unknown.or(Verdict::AuthenticationRequired), Verdict::AuthenticationRequired);
        assert_eq!(Verdict::NotAuthorized.or(Verdict::Authorized), Verdict::NotAuthorized);
    }
}
