//! Layered configuration: built-in defaults, an optional TOML file, then
//! `STRAP_`-prefixed environment variables (`__` separates nested keys).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use strap_archive::{
    Checksum, DEFAULT_DELIMITER, DEFAULT_EXECUTABLE_PREFIXES, DEFAULT_MANIFEST_NAME,
    ExtractOptions, PermissionRules,
};
use strap_fs::PermissionMode;

use crate::error::ConfigError;

const FILES_DIR: &str = "/data/data/com.andronux.termux/files";

/// Entries a live root may contain and still count as not installed.
pub const DEFAULT_PLACEHOLDERS: &[&str] =
    &["tmp", "etc/termux/termux.env", "etc/termux/termux.env.tmp"];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    pub layout: LayoutConfig,
    pub archive: ArchiveConfig,
    pub lock: LockConfig,
    pub hooks: HooksConfig,
    pub storage: StorageConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub live_root: PathBuf,
    pub staging_root: PathBuf,
    pub home: PathBuf,
    pub placeholders: Vec<PathBuf>,
    pub directory_mode: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            live_root: PathBuf::from(FILES_DIR).join("usr"),
            staging_root: PathBuf::from(FILES_DIR).join("usr-staging"),
            home: PathBuf::from(FILES_DIR).join("home"),
            placeholders: DEFAULT_PLACEHOLDERS.iter().map(PathBuf::from).collect(),
            directory_mode: 0o700,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub manifest_name: String,
    pub delimiter: char,
    pub executable_prefixes: Vec<String>,
    pub executable_mode: u32,
    /// Expected SHA-256 of the archive, hex encoded. Unchecked when unset.
    pub sha256: Option<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            manifest_name: DEFAULT_MANIFEST_NAME.to_owned(),
            delimiter: DEFAULT_DELIMITER,
            executable_prefixes: DEFAULT_EXECUTABLE_PREFIXES
                .iter()
                .map(|p| (*p).to_owned())
                .collect(),
            executable_mode: 0o700,
            sha256: None,
        }
    }
}

impl ArchiveConfig {
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions::default()
            .manifest_name(self.manifest_name.clone())
            .delimiter(self.delimiter)
            .rules(PermissionRules::new(
                self.executable_prefixes.iter().cloned(),
                PermissionMode::custom(self.executable_mode),
            ))
    }

    pub fn checksum(&self) -> Result<Option<Checksum>, ConfigError> {
        Ok(self.sha256.as_deref().map(Checksum::parse).transpose()?)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub enabled: bool,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    pub properties: PropertiesConfig,
    pub environment: EnvironmentConfig,
    pub repository: RepositoryConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertiesConfig {
    pub enabled: bool,
    /// Relative paths resolve against the home directory.
    pub path: PathBuf,
    pub content: String,
}

impl Default for PropertiesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(".termux/termux.properties"),
            content: "# Termux configuration\n\
                      # Allow external apps to execute commands via RunCommandService\n\
                      allow-external-apps = true\n"
                .to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub enabled: bool,
    /// Relative to the live root.
    pub file: PathBuf,
    pub extra: BTreeMap<String, String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: PathBuf::from("etc/termux/termux.env"),
            extra: BTreeMap::new(),
        }
    }
}

/// Distribution installer fetched into the home directory after install.
pub const DEFAULT_REPOSITORY_URL: &str = "https://github.com/tbvns/proot-distro.git";

/// Auxiliary repository cloned after install. Skipped when disabled or when
/// `url` is unset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub enabled: bool,
    pub url: Option<String>,
    /// Relative paths resolve against the home directory.
    pub destination: PathBuf,
    pub script: Option<ScriptConfig>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: Some(DEFAULT_REPOSITORY_URL.to_owned()),
            destination: PathBuf::from("proot-distro"),
            script: Some(ScriptConfig::default()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Relative paths resolve against the live root.
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("bin/bash"),
            args: vec![
                "-c".to_owned(),
                "cd proot-distro && ./install.sh && proot-distro install archlinux".to_owned(),
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Relative paths resolve against the home directory.
    pub directory: PathBuf,
    pub links: BTreeMap<String, PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let shared = PathBuf::from("/storage/emulated/0");
        let links = [
            ("shared", shared.clone()),
            ("downloads", shared.join("Download")),
            ("dcim", shared.join("DCIM")),
            ("pictures", shared.join("Pictures")),
            ("music", shared.join("Music")),
            ("movies", shared.join("Movies")),
            ("documents", shared.join("Documents")),
        ]
        .into_iter()
        .map(|(name, target)| (name.to_owned(), target))
        .collect();

        Self {
            directory: PathBuf::from("storage"),
            links,
        }
    }
}

impl InstallConfig {
    /// Merge defaults, `file` (when given and present) and the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        let config: Self = figment
            .merge(Env::prefixed("STRAP_").split("__"))
            .extract()?;
        config.expanded()
    }

    /// Expand `~` in the layout paths.
    pub fn expanded(mut self) -> Result<Self, ConfigError> {
        self.layout.live_root = strap_platform::dir::expand_home(self.layout.live_root)?;
        self.layout.staging_root = strap_platform::dir::expand_home(self.layout.staging_root)?;
        self.layout.home = strap_platform::dir::expand_home(self.layout.home)?;
        Ok(self)
    }

    pub fn directory_mode(&self) -> PermissionMode {
        PermissionMode::custom(self.layout.directory_mode)
    }

    pub fn resolve_home(&self, path: &Path) -> PathBuf {
        self.layout.home.join(path)
    }

    pub fn storage_directory(&self) -> PathBuf {
        self.resolve_home(&self.storage.directory)
    }
}
