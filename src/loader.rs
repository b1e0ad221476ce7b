//! Rule directory discovery and loading.
//!
//! Every configured directory is scanned (non-recursively) for files ending
//! in the rule suffix. The combined list is ordered by base name, then by
//! full path, and each file is compiled in that order. A file that fails to
//! read or compile is reported and skipped; it never prevents the rest from
//! loading.

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{Config, KeyrulesError, RuleFile, RuleSet};

/// Outcome of loading a single rule file.
#[derive(Debug)]
pub struct LoadResult {
    pub path: PathBuf,
    pub status: LoadStatus,
}

/// Status of a single file load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// The file compiled and was added to the rule set.
    Loaded { normal: usize, admin: usize },
    /// The file declares no rules.
    Skipped { reason: String },
    /// Read, parse, or compile error; the whole file was discarded.
    Failed { error: String },
}

/// Everything one loader pass produced.
#[derive(Debug)]
pub struct LoadReport {
    rule_set: RuleSet,
    results: Vec<LoadResult>,
}

impl LoadReport {
    #[must_use]
    pub fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }

    #[must_use]
    pub fn into_rule_set(self) -> RuleSet {
        self.rule_set
    }

    /// Per-file results, in evaluation order.
    #[must_use]
    pub fn results(&self) -> &[LoadResult] {
        &self.results
    }

    #[must_use]
    pub fn loaded(&self) -> usize {
        self.count(|s| matches!(s, LoadStatus::Loaded { .. }))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, LoadStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&LoadStatus) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.status)).count()
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files loaded, {} failed, {} skipped",
            self.loaded(),
            self.failed(),
            self.results.len() - self.loaded() - self.failed(),
        )
    }
}

/// Evaluation order of two rule files: base name first, then the full path
/// compared as raw bytes. `Path`'s own ordering works per component and
/// would sort `rules.d/` after `rules.d-local/`.
#[must_use]
pub fn rules_file_order(a: &Path, b: &Path) -> Ordering {
    a.file_name()
        .cmp(&b.file_name())
        .then_with(|| a.as_os_str().cmp(b.as_os_str()))
}

/// Scans the configured directories and compiles a fresh [`RuleSet`].
#[derive(Debug, Clone)]
pub struct RuleSetLoader {
    dirs: Vec<PathBuf>,
    suffix: String,
    wheel_group: String,
}

impl RuleSetLoader {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            dirs: config.dirs().to_vec(),
            suffix: config.suffix().to_owned(),
            wheel_group: config.wheel_group().to_owned(),
        }
    }

    #[must_use]
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Rule files in every readable directory, in evaluation order.
    ///
    /// Unreadable directories are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`KeyrulesError::NoReadableDirectory`] when directories are
    /// configured and none of them can be read.
    pub fn discover(&self) -> Result<Vec<PathBuf>, KeyrulesError> {
        let mut paths = Vec::new();
        let mut readable = 0;

        for dir in &self.dirs {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "failed to read rules directory");
                    continue;
                }
            };
            readable += 1;
            info!(path = %dir.display(), "scanning rules directory");

            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(path = %dir.display(), error = %e, "failed to read directory entry");
                        continue;
                    }
                };
                let name = entry.file_name();
                let is_rules = name
                    .to_str()
                    .map(|n| n.ends_with(&self.suffix))
                    .unwrap_or(false);
                if is_rules {
                    paths.push(entry.path());
                }
            }
        }

        if readable == 0 && !self.dirs.is_empty() {
            return Err(KeyrulesError::NoReadableDirectory {
                dirs: self.dirs.clone(),
            });
        }

        paths.sort_by(|a, b| rules_file_order(a, b));
        Ok(paths)
    }

    /// Compile every discovered file into a new rule set.
    ///
    /// # Errors
    ///
    /// Only fails when no directory could be read, so the caller can keep
    /// whatever rule set it already has.
    pub fn load(&self) -> Result<LoadReport, KeyrulesError> {
        let paths = self.discover()?;
        let mut files = Vec::with_capacity(paths.len());
        let mut results = Vec::with_capacity(paths.len());

        for path in paths {
            let status = match RuleFile::from_path(&path) {
                Ok(Some(file)) => {
                    debug!(
                        path = %path.display(),
                        rules = file.normal().len(),
                        admin_rules = file.admin().len(),
                        "loaded rules file"
                    );
                    let status = LoadStatus::Loaded {
                        normal: file.normal().len(),
                        admin: file.admin().len(),
                    };
                    files.push(file);
                    status
                }
                Ok(None) => {
                    debug!(path = %path.display(), "rules file declares no rules, skipping");
                    LoadStatus::Skipped {
                        reason: "no rules declared".to_owned(),
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load rules file");
                    LoadStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            results.push(LoadResult { path, status });
        }

        info!(files = files.len(), "loaded rules files");
        Ok(LoadReport {
            rule_set: RuleSet::new(files, self.wheel_group.clone()),
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_by_base_name_then_path() {
        let mut paths = vec![
            PathBuf::from("/usr/share/rules.d/20-b.keyrules"),
            PathBuf::from("/usr/share/rules.d/10-a.keyrules"),
            PathBuf::from("/etc/rules.d/20-b.keyrules"),
            PathBuf::from("/etc/rules.d/30-c.keyrules"),
        ];
        paths.sort_by(|a, b| rules_file_order(a, b));
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/usr/share/rules.d/10-a.keyrules"),
                PathBuf::from("/etc/rules.d/20-b.keyrules"),
                PathBuf::from("/usr/share/rules.d/20-b.keyrules"),
                PathBuf::from("/etc/rules.d/30-c.keyrules"),
            ]
        );
    }

    #[test]
    fn tie_break_compares_whole_path_bytes() {
        let plain = Path::new("/x/rules.d/50.keyrules");
        let local = Path::new("/x/rules.d-local/50.keyrules");
        // '-' (0x2d) sorts before '/' (0x2f)
        assert_eq!(rules_file_order(plain, local), Ordering::Greater);
        assert_eq!(rules_file_order(local, plain), Ordering::Less);

        let doubled = Path::new("/x//rules.d/50.keyrules");
        assert_ne!(rules_file_order(doubled, plain), Ordering::Equal);
    }

    #[test]
    fn no_directories_is_an_empty_set() {
        let loader = RuleSetLoader::new(&Config::default().with_dirs(Vec::<PathBuf>::new()));
        let report = loader.load().unwrap();
        assert!(report.rule_set().is_empty());
        assert!(report.results().is_empty());
    }

    #[test]
    fn report_display() {
        let report = LoadReport {
            rule_set: RuleSet::empty("wheel"),
            results: vec![
                LoadResult {
                    path: "a.keyrules".into(),
                    status: LoadStatus::Loaded { normal: 1, admin: 0 },
                },
                LoadResult {
                    path: "b.keyrules".into(),
                    status: LoadStatus::Failed { error: "bad".into() },
                },
                LoadResult {
                    path: "c.keyrules".into(),
                    status: LoadStatus::Skipped { reason: "empty".into() },
                },
            ],
        };
        assert_eq!(report.to_string(), "1 files loaded, 1 failed, 1 skipped");
    }
}
