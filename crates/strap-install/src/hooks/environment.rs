use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use strap_platform::env::ShellEnvironment;

use super::{HookContext, PostInstallHook};
use crate::error::HookError;

/// Produces the environment file for a freshly installed root.
pub trait EnvironmentWriter: Send + Sync {
    fn write_environment(&self, root: &Path) -> Result<(), HookError>;
}

/// Renders a [`ShellEnvironment`] for the root plus configured extras.
#[derive(Clone, Debug)]
pub struct ShellEnvironmentWriter {
    file: PathBuf,
    home: PathBuf,
    extra: BTreeMap<String, String>,
}

impl ShellEnvironmentWriter {
    /// `file` is relative to the root being written.
    pub fn new(file: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            home: home.into(),
            extra: BTreeMap::new(),
        }
    }

    pub fn extra(mut self, extra: BTreeMap<String, String>) -> Self {
        self.extra = extra;
        self
    }

    pub fn environment(&self, root: &Path) -> Result<ShellEnvironment, HookError> {
        let mut env = ShellEnvironment::for_prefix(root, &self.home);
        for (key, value) in &self.extra {
            env.set(key.clone(), value.clone())?;
        }
        Ok(env)
    }
}

impl EnvironmentWriter for ShellEnvironmentWriter {
    fn write_environment(&self, root: &Path) -> Result<(), HookError> {
        self.environment(root)?.write_to(&root.join(&self.file))?;
        Ok(())
    }
}

pub struct EnvironmentHook {
    writer: Box<dyn EnvironmentWriter>,
}

impl EnvironmentHook {
    pub fn new<W: EnvironmentWriter + 'static>(writer: W) -> Self {
        Self {
            writer: Box::new(writer),
        }
    }
}

impl PostInstallHook for EnvironmentHook {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn run(&self, ctx: &HookContext<'_>) -> Result<(), HookError> {
        self.writer.write_environment(ctx.live_root)
    }
}
