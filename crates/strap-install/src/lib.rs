//! Retry-safe deployment of a bootstrap archive.
//!
//! - `controller` - staged install state machine with atomic promotion
//! - `hooks` - independent post-install side effects
//! - `bootstrap` - install-if-needed entry point with caller-driven retries
//! - `storage` - named links into shared storage
//! - `config` - layered configuration

pub mod bootstrap;
pub mod config;
pub mod controller;
mod error;
pub mod hooks;
pub mod source;
pub mod state;
pub mod storage;

pub use bootstrap::{Bootstrap, FailureReporter, RetryDecision, SetupOutcome, SetupSummary};
pub use config::InstallConfig;
pub use controller::Installer;
pub use error::{ConfigError, FailureReason, HookError, InstallError, StorageError};
pub use hooks::{HookContext, HookReport, Hooks, PostInstallHook};
pub use source::{ArchiveSource, BytesSource, FileSource};
pub use state::{InstallFailure, InstallOutcome, InstallReport, InstallState};
pub use storage::StorageLinks;
