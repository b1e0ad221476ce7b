//! keyrules: inspect and exercise key-file authorization rules.
//!
//! Subcommands:
//! - `check`: evaluate an action for a described subject
//! - `admins`: list the identities allowed to authenticate as administrator
//! - `lint`: report rules that can never behave as written
//! - `watch`: keep the rules loaded and log every reload

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::info;

use keyrules::validate;
use keyrules::{
    Authority, Config, ReloadController, RequestContext, RuleFile, RuleSetLoader,
    Verdict,
};

// ── CLI ─────────────────────────────────────────────────────────────

/// Key-file authorization rules tool.
#[derive(Parser, Debug)]
#[command(name = "keyrules", version, about)]
struct Cli {
    /// Rule directory, highest priority first. Repeat for several.
    /// Defaults to KEYRULES_DIRS or the built-in system directories.
    #[arg(long = "dir", global = true)]
    dirs: Vec<PathBuf>,

    /// Group that `%sudo%` stands for.
    #[arg(long, global = true)]
    wheel_group: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate an action id for a subject.
    Check {
        /// Action id, e.g. org.freedesktop.udisks2.filesystem-mount.
        action: String,

        #[command(flatten)]
        subject: SubjectArgs,

        /// Verdict used when no rule decides.
        #[arg(long, default_value = "no")]
        implicit: Verdict,

        /// Print the deciding rule and every rule visited.
        #[arg(long)]
        explain: bool,
    },

    /// List administrator identities.
    Admins,

    /// Lint rule files. Without arguments, every discovered file.
    Lint {
        files: Vec<PathBuf>,
    },

    /// Load rules, watch their directories, and log reloads until killed.
    Watch,
}

#[derive(clap::Args, Debug)]
struct SubjectArgs {
    /// User name of the subject.
    #[arg(long, env = "USER")]
    user: String,

    /// Group the subject belongs to. Repeat for several.
    #[arg(long = "group")]
    groups: Vec<String>,

    /// Subject is on a local seat.
    #[arg(long)]
    local: bool,

    /// Subject's session is active.
    #[arg(long)]
    active: bool,
}

impl SubjectArgs {
    fn context(&self) -> RequestContext {
        RequestContext::new(self.user.as_str())
            .groups(self.groups.iter().cloned())
            .local(self.local)
            .active(self.active)
    }
}

// ── commands ────────────────────────────────────────────────────────

fn check(
    config: &Config,
    action: &str,
    subject: &SubjectArgs,
    implicit: Verdict,
    explain: bool,
) -> anyhow::Result<()> {
    let rules = ReloadController::new(config);
    let ctx = subject.context();
    if explain {
        let report = rules.current().evaluate_detailed(action, &ctx);
        println!("{report}");
    }
    let verdict = rules.check(action, Some(&ctx)).or(implicit);
    println!("{verdict}");
    Ok(())
}

fn admins(config: &Config) -> anyhow::Result<()> {
    let rules = ReloadController::new(config);
    for identity in rules.current().admin_identities() {
        println!("{identity}");
    }
    Ok(())
}

fn lint(config: &Config, files: Vec<PathBuf>) -> anyhow::Result<()> {
    let paths = if files.is_empty() {
        RuleSetLoader::new(config)
            .discover()
            .context("discovering rule files")?
    } else {
        files
    };

    let mut findings = 0;
    for path in &paths {
        match RuleFile::from_path(path) {
            Ok(Some(file)) => {
                for diagnostic in validate::lint(&file) {
                    println!("{diagnostic}");
                    findings += 1;
                }
            }
            Ok(None) => println!("{}: no rules declared", path.display()),
            Err(e) => {
                println!("{}: {e}", path.display());
                findings += 1;
            }
        }
    }
    info!(files = paths.len(), findings, "lint finished");
    if findings > 0 {
        anyhow::bail!("{findings} problems found");
    }
    Ok(())
}

fn watch(config: &Config) -> anyhow::Result<()> {
    let rules = Arc::new(ReloadController::new(config));
    rules.on_changed(|event| {
        info!(
            generation = event.generation,
            files = event.files_loaded,
            failed = event.files_failed,
            "rules changed"
        );
    });
    let watcher = rules.watch().context("starting directory watchers")?;
    info!(dirs = watcher.len(), rules = %rules.current(), "watching for rule changes");

    loop {
        std::thread::park();
    }
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if !cli.dirs.is_empty() {
        config = config.with_dirs(cli.dirs);
    }
    if let Some(group) = cli.wheel_group {
        config = config.with_wheel_group(group);
    }

    match cli.command {
        Command::Check {
            action,
            subject,
            implicit,
            explain,
        } => check(&config, &action, &subject, implicit, explain),
        Command::Admins => admins(&config),
        Command::Lint { files } => lint(&config, files),
        Command::Watch => watch(&config),
    }
}
