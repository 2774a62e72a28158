use std::path::{Path, PathBuf};

use strap_fs::PermissionMode;
use strap_platform::command::Command;

use super::{HookContext, PostInstallHook};
use crate::error::HookError;

/// Fetches a directory tree from a remote repository.
pub trait RepositoryFetcher: Send + Sync {
    fn fetch_repository(&self, url: &str, dest: &Path) -> Result<(), HookError>;
}

/// Starts a program without waiting for it to finish.
pub trait ScriptRunner: Send + Sync {
    fn launch(&self, program: &Path, args: &[String], workdir: &Path) -> Result<(), HookError>;
}

/// Clones with the `git` executable found on `PATH`.
#[derive(Clone, Debug)]
pub struct GitCommandFetcher {
    program: String,
}

impl Default for GitCommandFetcher {
    fn default() -> Self {
        Self {
            program: "git".to_owned(),
        }
    }
}

impl GitCommandFetcher {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl RepositoryFetcher for GitCommandFetcher {
    fn fetch_repository(&self, url: &str, dest: &Path) -> Result<(), HookError> {
        strap_fs::ensure_dir(dest, PermissionMode::Inherit)?;
        Command::new(self.program.clone())
            .arg("clone")
            .arg("--quiet")
            .arg(url)
            .arg(dest)
            .status()
            .map_err(|e| HookError::Fetch {
                url: url.to_owned(),
                source: Box::new(e),
            })?;
        Ok(())
    }
}

/// Spawns the script as a detached child process.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpawnScriptRunner;

impl ScriptRunner for SpawnScriptRunner {
    fn launch(&self, program: &Path, args: &[String], workdir: &Path) -> Result<(), HookError> {
        let child = Command::new(program.display().to_string())
            .args(args)
            .current_dir(workdir)
            .detached()
            .spawn()
            .map_err(|e| HookError::Launch {
                program: program.display().to_string(),
                source: Box::new(e),
            })?;
        tracing::info!(program = %program.display(), pid = child.id(), "launched setup script");
        Ok(())
    }
}

/// Program run after a successful fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Script {
    /// Resolved against the live root when relative.
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Script {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// Fetch an auxiliary repository, then launch its setup script.
///
/// The script only runs when the fetch succeeded. Its outcome is not awaited.
pub struct RepositoryHook {
    url: String,
    destination: PathBuf,
    script: Option<Script>,
    fetcher: Box<dyn RepositoryFetcher>,
    runner: Box<dyn ScriptRunner>,
}

impl RepositoryHook {
    /// `destination` is resolved against the home directory when relative.
    pub fn new<F, R>(
        url: impl Into<String>,
        destination: impl Into<PathBuf>,
        fetcher: F,
        runner: R,
    ) -> Self
    where
        F: RepositoryFetcher + 'static,
        R: ScriptRunner + 'static,
    {
        Self {
            url: url.into(),
            destination: destination.into(),
            script: None,
            fetcher: Box::new(fetcher),
            runner: Box::new(runner),
        }
    }

    pub fn script(mut self, script: Script) -> Self {
        self.script = Some(script);
        self
    }
}

impl PostInstallHook for RepositoryHook {
    fn name(&self) -> &'static str {
        "repository"
    }

    fn run(&self, ctx: &HookContext<'_>) -> Result<(), HookError> {
        let dest = ctx.in_home(&self.destination);
        tracing::info!(url = %self.url, dest = %dest.display(), "fetching repository");
        self.fetcher.fetch_repository(&self.url, &dest)?;

        if let Some(script) = &self.script {
            let program = ctx.in_live_root(&script.program);
            self.runner.launch(&program, &script.args, ctx.home)?;
        }
        Ok(())
    }
}
