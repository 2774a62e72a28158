use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use strap_install::hooks::{HookContext, PostInstallHook};
use strap_install::{
    ArchiveSource, Bootstrap, BytesSource, FailureReason, HookError, Hooks, InstallError,
    InstallFailure, InstallOutcome, InstallState, Installer, RetryDecision, SetupOutcome,
};
use zip::write::SimpleFileOptions;

fn bootstrap_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn good_archive() -> Vec<u8> {
    bootstrap_zip(&[
        ("SYMLINKS.txt", "dash\u{2190}./bin/sh\n../libexec/tool\u{2190}./bin/tool\n"),
        ("bin/dash", "#!dash"),
        ("share/doc/readme", "docs"),
        ("libexec/tool", "#!tool"),
    ])
}

struct Layout {
    _dir: tempfile::TempDir,
    live: PathBuf,
    staging: PathBuf,
    home: PathBuf,
}

fn layout() -> Layout {
    let dir = tempfile::Builder::new()
        .prefix("strap-test-install-")
        .tempdir()
        .expect("Failed to create temp dir");
    let files = dir.path().join("files");
    Layout {
        live: files.join("usr"),
        staging: files.join("usr-staging"),
        home: files.join("home"),
        _dir: dir,
    }
}

fn installer(layout: &Layout) -> Installer {
    Installer::new(&layout.live, &layout.staging)
}

fn expect_failure(outcome: InstallOutcome) -> InstallFailure {
    match outcome {
        InstallOutcome::Failure(failure) => failure,
        InstallOutcome::Success(report) => panic!("expected failure, got {report:?}"),
    }
}

/// Yields `limit` good bytes, then a hard I/O error.
struct FailingSource {
    bytes: Vec<u8>,
    limit: usize,
}

struct FailAfter {
    inner: Cursor<Vec<u8>>,
    remaining: usize,
}

impl Read for FailAfter {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "payload provider died"));
        }
        let len = buf.len().min(self.remaining);
        let n = self.inner.read(&mut buf[..len])?;
        self.remaining -= n;
        Ok(n)
    }
}

impl ArchiveSource for FailingSource {
    fn open(&self) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(FailAfter {
            inner: Cursor::new(self.bytes.clone()),
            remaining: self.limit,
        }))
    }

    fn describe(&self) -> String {
        "failing source".to_owned()
    }
}

#[test]
fn fresh_install_reaches_done() {
    let layout = layout();
    let outcome = installer(&layout).install(&BytesSource::new(good_archive()));

    assert_eq!(
        outcome.states(),
        [
            InstallState::Idle,
            InstallState::Cleaning,
            InstallState::Extracting,
            InstallState::Promoting,
            InstallState::Done,
        ]
    );
    let InstallOutcome::Success(report) = outcome else {
        unreachable!()
    };
    let extracted = report.extracted.expect("fresh install extracts");
    assert_eq!(extracted.files, 3);
    assert_eq!(extracted.symlinks, 2);

    assert!(!layout.staging.exists());
    assert_eq!(
        std::fs::read_to_string(layout.live.join("share/doc/readme")).unwrap(),
        "docs"
    );
    assert!(installer(&layout).is_installed().unwrap());
}

#[test]
fn complete_live_root_is_left_alone() {
    let layout = layout();
    std::fs::create_dir_all(layout.live.join("bin")).unwrap();
    std::fs::write(layout.live.join("bin/custom"), "user data").unwrap();
    let before = std::fs::metadata(layout.live.join("bin/custom"))
        .unwrap()
        .modified()
        .unwrap();

    // Not even a readable archive: the source must never be opened.
    let outcome = installer(&layout).install(&BytesSource::new(b"garbage".to_vec()));

    assert_eq!(outcome.states(), [InstallState::Idle, InstallState::Done]);
    let InstallOutcome::Success(report) = outcome else {
        unreachable!()
    };
    assert!(!report.installed());
    assert!(!layout.staging.exists());
    assert_eq!(
        std::fs::read_to_string(layout.live.join("bin/custom")).unwrap(),
        "user data"
    );
    let after = std::fs::metadata(layout.live.join("bin/custom"))
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(before, after);
}

#[test]
fn placeholder_only_live_root_is_reinstalled() {
    let layout = layout();
    std::fs::create_dir_all(layout.live.join("etc/termux")).unwrap();
    std::fs::create_dir_all(layout.live.join("tmp")).unwrap();
    std::fs::write(layout.live.join("etc/termux/termux.env"), "export A=1").unwrap();

    let outcome = installer(&layout).install(&BytesSource::new(good_archive()));
    assert!(outcome.is_success());
    assert!(layout.live.join("bin/dash").exists());
    assert!(!layout.live.join("etc/termux/termux.env").exists());
}

#[test]
fn fault_during_extraction_leaves_live_root_absent() {
    let layout = layout();
    let bytes = good_archive();
    let source = FailingSource {
        limit: bytes.len() / 4,
        bytes,
    };

    let failure = expect_failure(installer(&layout).install(&source));

    assert_eq!(failure.reason, FailureReason::Extraction);
    assert!(failure.recoverable);
    assert_eq!(failure.states.last(), Some(&InstallState::Failed));
    assert!(failure.states.contains(&InstallState::Extracting));
    assert!(!failure.states.contains(&InstallState::Promoting));
    assert!(std::fs::symlink_metadata(&layout.live).is_err());
}

#[test]
fn fault_during_extraction_keeps_previous_placeholder_state_out_of_live() {
    let layout = layout();
    std::fs::create_dir_all(layout.live.join("tmp")).unwrap();

    let failure = expect_failure(installer(&layout).install(&FailingSource {
        bytes: good_archive(),
        limit: 64,
    }));
    assert_eq!(failure.reason, FailureReason::Extraction);
    assert!(!layout.live.join("bin").exists());
}

#[cfg(unix)]
#[test]
fn permissions_follow_path_prefix() {
    use std::os::unix::fs::PermissionsExt;

    let layout = layout();
    let bytes = bootstrap_zip(&[
        ("bin/sh", "elf"),
        ("share/doc/readme", "docs"),
        ("SYMLINKS.txt", "sh\u{2190}bin/bash"),
    ]);
    assert!(
        installer(&layout)
            .install(&BytesSource::new(bytes))
            .is_success()
    );

    let mode = |p: &str| {
        std::fs::metadata(layout.live.join(p))
            .unwrap()
            .permissions()
            .mode()
            & 0o777
    };
    assert_eq!(mode("bin/sh"), 0o700);
    assert_eq!(mode("share/doc/readme") & 0o111, 0);
}

#[cfg(unix)]
#[test]
fn symlink_to_later_entry_resolves() {
    let layout = layout();
    assert!(
        installer(&layout)
            .install(&BytesSource::new(good_archive()))
            .is_success()
    );

    assert_eq!(
        std::fs::read_link(layout.live.join("bin/tool")).unwrap(),
        Path::new("../libexec/tool")
    );
    assert_eq!(
        std::fs::read_to_string(layout.live.join("bin/tool")).unwrap(),
        "#!tool"
    );
    assert_eq!(
        std::fs::read_to_string(layout.live.join("bin/sh")).unwrap(),
        "#!dash"
    );
}

#[test]
fn malformed_manifest_fails_without_live_root() {
    let layout = layout();
    let bytes = bootstrap_zip(&[
        ("bin/dash", "elf"),
        ("SYMLINKS.txt", "dash\u{2190}bin/sh\nthis line has no arrow\n"),
    ]);

    let failure = expect_failure(installer(&layout).install(&BytesSource::new(bytes)));
    assert_eq!(failure.reason, FailureReason::Extraction);
    assert!(!failure.recoverable);
    assert!(matches!(
        failure.error,
        InstallError::Archive(strap_archive::Error::MalformedManifest { line_number: 2, .. })
    ));
    assert!(!layout.live.exists());
}

#[test]
fn missing_manifest_fails_without_live_root() {
    let layout = layout();
    let bytes = bootstrap_zip(&[("bin/dash", "elf")]);

    let failure = expect_failure(installer(&layout).install(&BytesSource::new(bytes)));
    assert!(matches!(
        failure.error,
        InstallError::Archive(strap_archive::Error::MissingSymlinkManifest { .. })
    ));
    assert!(!layout.live.exists());
}

#[test]
fn retry_cleans_stale_remnants() {
    let layout = layout();
    std::fs::create_dir_all(layout.staging.join("bin")).unwrap();
    std::fs::write(layout.staging.join("bin/leftover"), "stale").unwrap();
    std::fs::create_dir_all(layout.live.parent().unwrap()).unwrap();
    std::fs::write(&layout.live, "a file where the live root belongs").unwrap();

    let outcome = installer(&layout).install(&BytesSource::new(good_archive()));
    assert!(outcome.is_success());
    assert!(layout.live.is_dir());
    assert!(!layout.live.join("bin/leftover").exists());
    assert!(!layout.staging.exists());
}

#[test]
fn checksum_mismatch_blocks_promotion() {
    let layout = layout();
    let installer = installer(&layout).checksum(Some(
        strap_archive::Checksum::parse(&"00".repeat(32)).unwrap(),
    ));

    let failure = expect_failure(installer.install(&BytesSource::new(good_archive())));
    assert!(matches!(
        failure.error,
        InstallError::Archive(strap_archive::Error::ChecksumMismatch { .. })
    ));
    assert!(!failure.recoverable);
    assert!(!layout.live.exists());
}

#[test]
fn matching_checksum_installs() {
    use sha2::Digest;

    let layout = layout();
    let bytes = good_archive();
    let digest = hex::encode(sha2::Sha256::digest(&bytes));
    let installer =
        installer(&layout).checksum(Some(strap_archive::Checksum::parse(&digest).unwrap()));

    assert!(installer.install(&BytesSource::new(bytes)).is_success());
}

/// Recreates the live root while the archive is being opened.
struct RacingSource {
    live: PathBuf,
    bytes: Vec<u8>,
}

impl ArchiveSource for RacingSource {
    fn open(&self) -> io::Result<Box<dyn Read>> {
        std::fs::create_dir_all(&self.live)?;
        Ok(Box::new(Cursor::new(self.bytes.clone())))
    }

    fn describe(&self) -> String {
        "racing source".to_owned()
    }
}

#[test]
fn live_root_appearing_mid_attempt_fails_promotion() {
    let layout = layout();
    let source = RacingSource {
        live: layout.live.clone(),
        bytes: good_archive(),
    };

    let failure = expect_failure(installer(&layout).lock(false).install(&source));
    assert_eq!(failure.reason, FailureReason::Promotion);
    assert!(failure.recoverable);
    assert!(layout.staging.join("bin/dash").exists());
    assert!(std::fs::read_dir(&layout.live).unwrap().next().is_none());
}

#[test]
fn complete_live_root_install_writes_nothing_beside_it() {
    let layout = layout();
    std::fs::create_dir_all(layout.live.join("bin")).unwrap();
    std::fs::write(layout.live.join("bin/custom"), "user data").unwrap();
    let parent = layout.live.parent().unwrap();
    let listing = || {
        let mut names: Vec<_> = std::fs::read_dir(parent)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        names.sort();
        names
    };
    let before = listing();

    let outcome = installer(&layout).install(&BytesSource::new(good_archive()));

    assert_eq!(outcome.states(), [InstallState::Idle, InstallState::Done]);
    assert_eq!(listing(), before);
}

#[cfg(unix)]
#[test]
fn unreadable_live_root_is_not_treated_as_missing() {
    let layout = layout();
    // A file where the parent directory belongs makes the lookup fail with
    // something other than "not found".
    std::fs::write(layout.live.parent().unwrap(), "not a directory").unwrap();
    let installer = installer(&layout);

    assert!(installer.is_installed().is_err());
    let failure = expect_failure(installer.install(&BytesSource::new(good_archive())));
    assert_eq!(failure.reason, FailureReason::Cleanup);
    assert_eq!(
        std::fs::read_to_string(layout.live.parent().unwrap()).unwrap(),
        "not a directory"
    );
}

#[test]
fn lock_is_released_after_attempt() {
    let layout = layout();
    let installer = installer(&layout);
    assert!(installer.install(&BytesSource::new(good_archive())).is_success());

    assert_eq!(
        installer.lock_path(),
        layout.live.parent().unwrap().join(".usr.lock")
    );
    assert!(installer.lock_path().exists());
    let held = strap_fs::InstallLock::try_acquire(installer.lock_path()).unwrap();

    // flock locks belong to the open file, so a second handle contends like
    // another process would.
    assert!(strap_fs::InstallLock::try_acquire(installer.lock_path()).is_err());
    drop(held);
}

struct Recording {
    name: &'static str,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl PostInstallHook for Recording {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&self, ctx: &HookContext<'_>) -> Result<(), HookError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(ctx.live_root.join("bin/dash").exists());
        if self.fail {
            return Err(HookError::Fs(strap_fs::Error::Write {
                path: ctx.home.join("nope"),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            }));
        }
        Ok(())
    }
}

#[test]
fn hooks_run_after_install_and_failures_are_isolated() {
    let layout = layout();
    let calls = Arc::new(AtomicUsize::new(0));
    let hooks = Hooks::new()
        .with(Recording {
            name: "broken",
            fail: true,
            calls: Arc::clone(&calls),
        })
        .with(Recording {
            name: "fine",
            fail: false,
            calls: Arc::clone(&calls),
        });
    let bootstrap = Bootstrap::new(installer(&layout), hooks, &layout.home);

    let mut done = false;
    let outcome = bootstrap.setup_if_needed(
        &BytesSource::new(good_archive()),
        &mut |_: &InstallFailure| RetryDecision::Abort,
        |summary| {
            done = true;
            assert_eq!(summary.hooks.len(), 2);
        },
    );

    assert!(done);
    let SetupOutcome::Ready(summary) = outcome else {
        panic!("setup aborted");
    };
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!summary.hooks[0].succeeded());
    assert!(summary.hooks[1].succeeded());
    assert!(bootstrap.installer().is_installed().unwrap());
}

#[test]
fn hooks_are_skipped_when_already_installed() {
    let layout = layout();
    std::fs::create_dir_all(layout.live.join("bin")).unwrap();
    std::fs::write(layout.live.join("bin/dash"), "elf").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let hooks = Hooks::new().with(Recording {
        name: "counted",
        fail: false,
        calls: Arc::clone(&calls),
    });
    let bootstrap = Bootstrap::new(installer(&layout), hooks, &layout.home);

    let outcome = bootstrap.setup_if_needed(
        &BytesSource::new(good_archive()),
        &mut |_: &InstallFailure| RetryDecision::Abort,
        |_| {},
    );
    assert!(outcome.is_ready());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// Fails on the first open, succeeds afterwards.
struct FlakySource {
    opens: AtomicUsize,
    bytes: Vec<u8>,
}

impl ArchiveSource for FlakySource {
    fn open(&self) -> io::Result<Box<dyn Read>> {
        if self.opens.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "not yet"));
        }
        Ok(Box::new(Cursor::new(self.bytes.clone())))
    }

    fn describe(&self) -> String {
        "flaky source".to_owned()
    }
}

#[test]
fn try_again_runs_a_new_attempt() {
    let layout = layout();
    let bootstrap = Bootstrap::new(installer(&layout), Hooks::new(), &layout.home);
    let source = FlakySource {
        opens: AtomicUsize::new(0),
        bytes: good_archive(),
    };

    let mut reported = Vec::new();
    let outcome = bootstrap.setup_if_needed(
        &source,
        &mut |failure: &InstallFailure| {
            reported.push(failure.reason);
            RetryDecision::TryAgain
        },
        |_| {},
    );

    let SetupOutcome::Ready(summary) = outcome else {
        panic!("setup aborted");
    };
    assert_eq!(summary.attempts, 2);
    assert_eq!(reported, [FailureReason::Extraction]);
    assert!(layout.live.join("bin/dash").exists());
}

#[test]
fn abort_returns_the_failure() {
    let layout = layout();
    let bootstrap = Bootstrap::new(installer(&layout), Hooks::new(), &layout.home);

    let mut called = false;
    let outcome = bootstrap.setup_if_needed(
        &BytesSource::new(bootstrap_zip(&[("bin/dash", "elf")])),
        &mut |_: &InstallFailure| RetryDecision::Abort,
        |_| called = true,
    );

    assert!(!called);
    match outcome {
        SetupOutcome::Aborted { failure, attempts } => {
            assert_eq!(attempts, 1);
            assert!(failure.message().contains("SYMLINKS.txt"));
        }
        SetupOutcome::Ready(_) => panic!("expected abort"),
    }
}
