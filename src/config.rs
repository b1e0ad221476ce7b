use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::DEFAULT_WHEEL_GROUP;

/// Rule-file name suffix.
pub const RULES_SUFFIX: &str = ".keyrules";

/// Overrides the rule directory list; a platform path list, highest priority first.
pub const DIRS_ENV: &str = "KEYRULES_DIRS";

/// Overrides the group that `%sudo%` stands for.
pub const WHEEL_GROUP_ENV: &str = "KEYRULES_WHEEL_GROUP";

const SYSCONF_DIR: &str = match option_env!("KEYRULES_SYSCONF_DIR") {
    Some(dir) => dir,
    None => "/etc",
};

const DATA_DIR: &str = match option_env!("KEYRULES_DATA_DIR") {
    Some(dir) => dir,
    None => "/usr/share",
};

const BUILD_WHEEL_GROUP: &str = match option_env!("KEYRULES_WHEEL_GROUP") {
    Some(group) => group,
    None => DEFAULT_WHEEL_GROUP,
};

const RULES_SUBDIR: &str = "polkit-1/rules.d";

fn env_opt(key: &str) -> Option<OsString> {
    env::var_os(key).filter(|v| !v.is_empty())
}

/// Where rule files are discovered and how they are interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    dirs: Vec<PathBuf>,
    wheel_group: String,
    suffix: String,
}

impl Default for Config {
    /// The system-configuration directory, then the vendor-data directory.
    fn default() -> Self {
        Self {
            dirs: vec![
                Path::new(SYSCONF_DIR).join(RULES_SUBDIR),
                Path::new(DATA_DIR).join(RULES_SUBDIR),
            ],
            wheel_group: BUILD_WHEEL_GROUP.to_owned(),
            suffix: RULES_SUFFIX.to_owned(),
        }
    }
}

impl Config {
    /// Defaults overridden by `KEYRULES_DIRS` and `KEYRULES_WHEEL_GROUP`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(env_opt)
    }

    fn from_lookup(get: impl Fn(&str) -> Option<OsString>) -> Self {
        let mut config = Self::default();
        if let Some(dirs) = get(DIRS_ENV) {
            config.dirs = env::split_paths(&dirs)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
        if let Some(group) = get(WHEEL_GROUP_ENV).and_then(|g| g.into_string().ok()) {
            config.wheel_group = group;
        }
        config
    }

    /// Replace the directory list. Earlier directories take priority when two
    /// files share a base name.
    #[must_use]
    pub fn with_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_wheel_group(mut self, group: impl Into<String>) -> Self {
        self.wheel_group = group.into();
        self
    }

    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    #[must_use]
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    #[must_use]
    pub fn wheel_group(&self) -> &str {
        &self.wheel_group
    }

    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}
