use std::path::Path;

use anyhow::{Context, Result, bail};
use strap_install::{
    Bootstrap, FailureReporter, FileSource, Hooks, InstallConfig, InstallFailure, Installer,
    RetryDecision, SetupOutcome, StorageLinks,
};

/// Retries recoverable failures until the budget runs out.
#[derive(Debug)]
pub struct RetryBudget {
    remaining: usize,
}

impl RetryBudget {
    pub fn new(retries: usize) -> Self {
        Self { remaining: retries }
    }
}

impl FailureReporter for RetryBudget {
    fn report(&mut self, failure: &InstallFailure) -> RetryDecision {
        eprintln!("{}", failure.message());
        if failure.recoverable && self.remaining > 0 {
            self.remaining -= 1;
            eprintln!("trying again ({} retries left)", self.remaining);
            RetryDecision::TryAgain
        } else {
            RetryDecision::Abort
        }
    }
}

pub fn install(
    mut config: InstallConfig,
    archive: &Path,
    sha256: Option<String>,
    retries: usize,
    skip_hooks: bool,
) -> Result<()> {
    if sha256.is_some() {
        config.archive.sha256 = sha256;
    }

    let installer = Installer::from_config(&config).context("invalid install configuration")?;
    let hooks = if skip_hooks {
        Hooks::new()
    } else {
        Hooks::from_config(&config)
    };
    let bootstrap = Bootstrap::new(installer, hooks, config.layout.home.clone());

    let source = FileSource::new(archive);
    let mut reporter = RetryBudget::new(retries);
    let outcome = bootstrap.setup_if_needed(&source, &mut reporter, |summary| {
        match &summary.install.extracted {
            Some(report) => println!(
                "installed {} files, {} directories, {} symlinks ({} bytes) into {}",
                report.files,
                report.directories,
                report.symlinks,
                report.bytes,
                bootstrap.installer().live_root().display()
            ),
            None => println!(
                "already installed at {}",
                bootstrap.installer().live_root().display()
            ),
        }
        for hook in &summary.hooks {
            match &hook.result {
                Ok(()) => println!("hook {}: ok", hook.name),
                Err(e) => println!("hook {}: failed: {e}", hook.name),
            }
        }
    });

    match outcome {
        SetupOutcome::Ready(_) => Ok(()),
        SetupOutcome::Aborted { failure, attempts } => {
            bail!("{} (after {attempts} attempt(s))", failure.message())
        }
    }
}

pub fn status(config: &InstallConfig) -> Result<()> {
    let installer = Installer::from_config(config).context("invalid install configuration")?;
    let installed = installer
        .is_installed()
        .with_context(|| format!("failed to inspect {}", installer.live_root().display()))?;

    println!("live root:    {}", installer.live_root().display());
    println!("staging root: {}", installer.staging_root().display());
    println!("installed:    {}", if installed { "yes" } else { "no" });
    if std::fs::symlink_metadata(installer.staging_root()).is_ok() {
        println!("note: a staging directory from an interrupted install is present");
    }
    Ok(())
}

pub fn storage(config: &InstallConfig) -> Result<()> {
    let links = StorageLinks::from_config(config);
    let created = links
        .setup()
        .with_context(|| format!("failed to set up {}", links.directory().display()))?;
    println!("created {created} links in {}", links.directory().display());
    Ok(())
}

pub fn print_config(config: &InstallConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("failed to render configuration")?;
    print!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use strap_install::InstallError;

    fn failure(error: InstallError) -> InstallFailure {
        InstallFailure::new(error, Vec::new())
    }

    #[test]
    fn budget_retries_only_recoverable_failures() {
        let mut budget = RetryBudget::new(1);
        let transient = || {
            failure(InstallError::Source {
                source_name: "bootstrap.zip".into(),
                source: io::Error::from(io::ErrorKind::Interrupted),
            })
        };
        assert_eq!(budget.report(&transient()), RetryDecision::TryAgain);
        assert_eq!(budget.report(&transient()), RetryDecision::Abort);

        let mut budget = RetryBudget::new(5);
        let broken = failure(InstallError::Archive(
            strap_archive::Error::MissingSymlinkManifest {
                manifest: "SYMLINKS.txt".into(),
            },
        ));
        assert_eq!(budget.report(&broken), RetryDecision::Abort);
    }

    #[test]
    fn status_of_empty_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = InstallConfig::default();
        config.layout.live_root = dir.path().join("usr");
        config.layout.staging_root = dir.path().join("usr-staging");
        status(&config).unwrap();
    }

    #[test]
    fn default_config_renders_as_toml() {
        let rendered = toml::to_string_pretty(&InstallConfig::default()).unwrap();
        let parsed: InstallConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, InstallConfig::default());
    }

    #[test]
    fn install_with_missing_archive_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = InstallConfig::default();
        config.layout.live_root = dir.path().join("usr");
        config.layout.staging_root = dir.path().join("usr-staging");
        config.layout.home = dir.path().join("home");

        let err = install(config, &dir.path().join("missing.zip"), None, 0, true).unwrap_err();
        assert!(err.to_string().contains("missing.zip"));
        assert!(!dir.path().join("usr").exists());
    }
}
