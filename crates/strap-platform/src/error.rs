use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("command failed to start: {cmd}, source: {source}")]
    CommandFailed { cmd: String, source: std::io::Error },

    #[error("command exited unsuccessfully: {cmd} ({status})")]
    CommandExited {
        cmd: String,
        status: std::process::ExitStatus,
    },

    #[error("home directory could not be determined")]
    NoHomeDir,

    #[error("environment variable name is not valid: '{0}'")]
    InvalidVariable(String),

    #[error("failed to write environment file '{}': {source}", path.display())]
    WriteEnvironment {
        path: PathBuf,
        source: strap_fs::Error,
    },
}
