//! Post-install hooks.
//!
//! Hooks run only after an attempt actually installed the environment. Each
//! one is independent: a failure is logged and reported, but never undoes
//! the promotion and never prevents the hooks after it from running.

use std::path::{Path, PathBuf};

use crate::config::InstallConfig;
use crate::error::HookError;

mod environment;
mod properties;
mod repository;

pub use environment::{EnvironmentHook, EnvironmentWriter, ShellEnvironmentWriter};
pub use properties::PropertiesHook;
pub use repository::{
    GitCommandFetcher, RepositoryFetcher, RepositoryHook, Script, ScriptRunner, SpawnScriptRunner,
};

/// What a hook may look at.
#[derive(Clone, Copy, Debug)]
pub struct HookContext<'a> {
    pub live_root: &'a Path,
    pub home: &'a Path,
}

impl HookContext<'_> {
    /// Relative paths resolve against the home directory.
    pub fn in_home(&self, path: &Path) -> PathBuf {
        self.home.join(path)
    }

    /// Relative paths resolve against the live root.
    pub fn in_live_root(&self, path: &Path) -> PathBuf {
        self.live_root.join(path)
    }
}

pub trait PostInstallHook: Send + Sync {
    /// Name of this hook for logs and reports.
    fn name(&self) -> &'static str;

    fn run(&self, ctx: &HookContext<'_>) -> Result<(), HookError>;
}

#[derive(Debug)]
pub struct HookReport {
    pub name: &'static str,
    pub result: Result<(), HookError>,
}

impl HookReport {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Ordered hook list.
#[derive(Default)]
pub struct Hooks {
    hooks: Vec<Box<dyn PostInstallHook>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in hooks enabled by `config`, in their fixed order.
    pub fn from_config(config: &InstallConfig) -> Self {
        let hooks_config = &config.hooks;
        let mut hooks = Self::new();

        if hooks_config.properties.enabled {
            hooks.push(PropertiesHook::new(
                hooks_config.properties.path.clone(),
                hooks_config.properties.content.clone(),
            ));
        }
        if hooks_config.environment.enabled {
            let writer = ShellEnvironmentWriter::new(
                hooks_config.environment.file.clone(),
                config.layout.home.clone(),
            )
            .extra(hooks_config.environment.extra.clone());
            hooks.push(EnvironmentHook::new(writer));
        }
        if let (true, Some(url)) = (
            hooks_config.repository.enabled,
            &hooks_config.repository.url,
        ) {
            let mut hook = RepositoryHook::new(
                url.clone(),
                hooks_config.repository.destination.clone(),
                GitCommandFetcher::default(),
                SpawnScriptRunner,
            );
            if let Some(script) = &hooks_config.repository.script {
                hook = hook.script(Script::new(script.program.clone(), script.args.clone()));
            }
            hooks.push(hook);
        }

        hooks
    }

    pub fn with<H: PostInstallHook + 'static>(mut self, hook: H) -> Self {
        self.push(hook);
        self
    }

    pub fn push<H: PostInstallHook + 'static>(&mut self, hook: H) {
        self.hooks.push(Box::new(hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    pub fn run_all(&self, ctx: &HookContext<'_>) -> Vec<HookReport> {
        self.hooks
            .iter()
            .map(|hook| {
                let result = hook.run(ctx);
                match &result {
                    Ok(()) => tracing::info!(hook = hook.name(), "post-install hook finished"),
                    Err(e) => {
                        tracing::warn!(hook = hook.name(), error = %e, "post-install hook failed")
                    }
                }
                HookReport {
                    name: hook.name(),
                    result,
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
