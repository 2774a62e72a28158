use strap_fs::PermissionMode;

/// Prefixes whose files must be executable after extraction.
pub const DEFAULT_EXECUTABLE_PREFIXES: &[&str] =
    &["bin/", "libexec", "lib/apt/apt-helper", "lib/apt/methods"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionClass {
    Executable,
    Default,
}

/// Static prefix table deciding which extracted files become executable.
///
/// Matching is a plain string prefix test on the archive-relative path, so
/// `libexec` also covers `libexec/` and `libexecute`.
#[derive(Clone, Debug)]
pub struct PermissionRules {
    prefixes: Vec<String>,
    executable_mode: PermissionMode,
}

impl Default for PermissionRules {
    fn default() -> Self {
        Self::new(
            DEFAULT_EXECUTABLE_PREFIXES.iter().copied(),
            PermissionMode::OwnerOnly,
        )
    }
}

impl PermissionRules {
    pub fn new<I, S>(prefixes: I, executable_mode: PermissionMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            executable_mode,
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn classify(&self, entry_path: &str) -> PermissionClass {
        if self.prefixes.iter().any(|p| entry_path.starts_with(p.as_str())) {
            PermissionClass::Executable
        } else {
            PermissionClass::Default
        }
    }

    /// Mode to apply for `class`. `Default` keeps the creation permissions.
    pub fn mode_for(&self, class: PermissionClass) -> PermissionMode {
        match class {
            PermissionClass::Executable => self.executable_mode,
            PermissionClass::Default => PermissionMode::Inherit,
        }
    }
}
