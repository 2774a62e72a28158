use std::path::PathBuf;

use crate::error::{Error, Result};

pub fn user_home() -> Result<PathBuf> {
    home::home_dir().ok_or(Error::NoHomeDir)
}

/// Expand a leading `~` or `~/` against the user's home directory.
pub fn expand_home(path: impl Into<PathBuf>) -> Result<PathBuf> {
    let path = path.into();
    match path.strip_prefix("~") {
        Ok(rest) => Ok(user_home()?.join(rest)),
        Err(_) => Ok(path),
    }
}
