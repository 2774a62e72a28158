//! Caller-facing entry point: install when needed, retry on request, then
//! run the post-install hooks.

use std::path::{Path, PathBuf};

use crate::config::InstallConfig;
use crate::controller::Installer;
use crate::error::ConfigError;
use crate::hooks::{HookContext, HookReport, Hooks};
use crate::source::ArchiveSource;
use crate::state::{InstallFailure, InstallOutcome, InstallReport};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wipe the live root and start a new attempt.
    TryAgain,
    Abort,
}

/// Decides what happens after a failed attempt.
pub trait FailureReporter {
    fn report(&mut self, failure: &InstallFailure) -> RetryDecision;
}

impl<F> FailureReporter for F
where
    F: FnMut(&InstallFailure) -> RetryDecision,
{
    fn report(&mut self, failure: &InstallFailure) -> RetryDecision {
        self(failure)
    }
}

#[derive(Debug)]
pub struct SetupSummary {
    pub install: InstallReport,
    /// Empty when nothing was installed.
    pub hooks: Vec<HookReport>,
    pub attempts: usize,
}

#[derive(Debug)]
pub enum SetupOutcome {
    Ready(SetupSummary),
    Aborted {
        failure: InstallFailure,
        attempts: usize,
    },
}

impl SetupOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

#[derive(Debug)]
pub struct Bootstrap {
    installer: Installer,
    hooks: Hooks,
    home: PathBuf,
}

impl Bootstrap {
    pub fn new(installer: Installer, hooks: Hooks, home: impl Into<PathBuf>) -> Self {
        Self {
            installer,
            hooks,
            home: home.into(),
        }
    }

    pub fn from_config(config: &InstallConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            Installer::from_config(config)?,
            Hooks::from_config(config),
            config.layout.home.clone(),
        ))
    }

    pub fn installer(&self) -> &Installer {
        &self.installer
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Install from `source` unless the live root is already complete.
    ///
    /// `when_done` runs once the environment is usable, after any hooks. On
    /// failure `reporter` chooses between another attempt and giving up.
    pub fn setup_if_needed<F>(
        &self,
        source: &dyn ArchiveSource,
        reporter: &mut dyn FailureReporter,
        when_done: F,
    ) -> SetupOutcome
    where
        F: FnOnce(&SetupSummary),
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.installer.install(source) {
                InstallOutcome::Success(install) => {
                    let hooks = if install.installed() {
                        self.run_hooks()
                    } else {
                        Vec::new()
                    };
                    let summary = SetupSummary {
                        install,
                        hooks,
                        attempts,
                    };
                    when_done(&summary);
                    return SetupOutcome::Ready(summary);
                }
                InstallOutcome::Failure(failure) => match reporter.report(&failure) {
                    RetryDecision::TryAgain => {
                        tracing::warn!(attempt = attempts, "retrying bootstrap install");
                        let live = self.installer.live_root();
                        if let Err(e) = strap_fs::remove_path(live) {
                            tracing::warn!(path = %live.display(), error = %e, "failed to remove live root before retry");
                        }
                    }
                    RetryDecision::Abort => {
                        return SetupOutcome::Aborted { failure, attempts };
                    }
                },
            }
        }
    }

    fn run_hooks(&self) -> Vec<HookReport> {
        let ctx = HookContext {
            live_root: self.installer.live_root(),
            home: &self.home,
        };
        self.hooks.run_all(&ctx)
    }
}
