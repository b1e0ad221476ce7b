use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The account that is always allowed to authenticate as administrator.
pub const SUPERUSER: &str = "root";

/// The kind of account an [`Identity`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum IdentityKind {
    UnixUser,
    UnixGroup,
    UnixNetgroup,
}

impl IdentityKind {
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            IdentityKind::UnixUser => "unix-user",
            IdentityKind::UnixGroup => "unix-group",
            IdentityKind::UnixNetgroup => "unix-netgroup",
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("identity '{0}' has no kind prefix")]
    MissingKind(String),

    #[error("unknown identity kind '{0}'")]
    UnknownKind(String),

    #[error("identity '{identity}' has an invalid name")]
    InvalidName { identity: String },
}

/// An account eligible to approve administrative authentication, written as
/// `kind:name` (e.g. `unix-group:wheel`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identity {
    kind: IdentityKind,
    name: String,
}

impl Identity {
    /// Build an identity, validating the name for its kind.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidName`] if the name is malformed.
    pub fn new(kind: IdentityKind, name: &str) -> Result<Self, IdentityError> {
        if !valid_name(kind, name) {
            return Err(IdentityError::InvalidName {
                identity: format!("{}:{name}", kind.prefix()),
            });
        }
        Ok(Self {
            kind,
            name: name.to_owned(),
        })
    }

    /// The superuser account, returned when no administrator is configured.
    #[must_use]
    pub fn superuser() -> Self {
        Self {
            kind: IdentityKind::UnixUser,
            name: SUPERUSER.to_owned(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> IdentityKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Names may be numeric ids or portable account names; netgroups only need
/// to be free of separators.
fn valid_name(kind: IdentityKind, name: &str) -> bool {
    if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c.is_control() || c == ':') {
        return false;
    }
    match kind {
        IdentityKind::UnixNetgroup => true,
        IdentityKind::UnixUser | IdentityKind::UnixGroup => {
            if name.bytes().all(|b| b.is_ascii_digit()) {
                return name.parse::<u32>().is_ok();
            }
            let body = name.strip_suffix('$').unwrap_or(name);
            !body.is_empty()
                && !body.starts_with('-')
                && body
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, name) = s
            .split_once(':')
            .ok_or_else(|| IdentityError::MissingKind(s.to_owned()))?;
        let kind = match prefix {
            "unix-user" => IdentityKind::UnixUser,
            "unix-group" => IdentityKind::UnixGroup,
            "unix-netgroup" => IdentityKind::UnixNetgroup,
            other => return Err(IdentityError::UnknownKind(other.to_owned())),
        };
        Identity::new(kind, name)
    }
}
