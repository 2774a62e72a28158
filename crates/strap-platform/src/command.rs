use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Child, Command as StdCommand, ExitStatus, Stdio};

#[derive(Debug)]
pub struct Command {
    inner: StdCommand,
    program: String,
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        Self {
            inner: StdCommand::new(&program),
            program,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.inner.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.inner.args(args);
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.inner.current_dir(dir);
        self
    }

    pub fn env<K, V>(mut self, key: K, val: V) -> Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.inner.env(key, val);
        self
    }

    /// Detach the standard streams so a background child never blocks on them.
    pub fn detached(mut self) -> Self {
        self.inner
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        self
    }

    /// Run to completion and fail on a non-zero exit.
    pub fn status(&mut self) -> Result<ExitStatus> {
        let status = self.inner.status().map_err(|e| Error::CommandFailed {
            cmd: self.program.clone(),
            source: e,
        })?;
        if !status.success() {
            return Err(Error::CommandExited {
                cmd: self.program.clone(),
                status,
            });
        }
        Ok(status)
    }

    pub fn spawn(&mut self) -> Result<Child> {
        tracing::debug!(cmd = %self.program, "spawning");
        self.inner.spawn().map_err(|e| Error::CommandFailed {
            cmd: self.program.clone(),
            source: e,
        })
    }
}
