//! Shell environment snapshots rendered as sourceable `export` lines.

use std::collections::BTreeMap;
use std::path::Path;

use strap_fs::{PermissionMode, WriteOptions};

use crate::error::{Error, Result};

/// An ordered set of variables for the installed environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShellEnvironment {
    vars: BTreeMap<String, String>,
}

impl ShellEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base variables for an environment rooted at `prefix` with `home`.
    pub fn for_prefix(prefix: &Path, home: &Path) -> Self {
        let prefix_str = prefix.display().to_string();
        let mut env = Self::new();
        env.vars.insert("HOME".into(), home.display().to_string());
        env.vars.insert("PREFIX".into(), prefix_str.clone());
        env.vars.insert("PATH".into(), format!("{prefix_str}/bin"));
        env.vars.insert("TMPDIR".into(), format!("{prefix_str}/tmp"));
        env.vars.insert("SHELL".into(), format!("{prefix_str}/bin/login"));
        env.vars.insert("LANG".into(), "en_US.UTF-8".into());
        env.vars.insert("COLORTERM".into(), "truecolor".into());
        env.vars.insert("TERM".into(), "xterm-256color".into());
        env
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        if !is_valid_name(&key) {
            return Err(Error::InvalidVariable(key));
        }
        self.vars.insert(key, value.into());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.vars {
            out.push_str("export ");
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value));
            out.push_str("\"\n");
        }
        out
    }

    /// Replace `path` with the rendered snapshot in one rename.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let write_err = |source| Error::WriteEnvironment {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            strap_fs::ensure_dir(parent, PermissionMode::Inherit).map_err(write_err)?;
        }
        strap_fs::atomic_write(
            path,
            self.render().as_bytes(),
            WriteOptions::new()
                .permissions(PermissionMode::ReadWrite)
                .sync(true),
        )
        .map_err(write_err)?;

        tracing::debug!(path = %path.display(), vars = self.vars.len(), "wrote environment file");
        Ok(())
    }
}

fn is_valid_name(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Escape for a double-quoted POSIX shell string.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
