//! # rollcall - SSH Fleet Inventory
//!
//! rollcall logs in to every host of a fleet over SSH, trying a list of
//! ports and credentials per host, and records what each machine reports
//! about itself.
//!
//! ## Features
//!
//! - **Profiles**: Named groups of address ranges, ports and ordered credentials
//! - **Bounded Concurrency**: Fixed worker pool fed through a bounded queue
//! - **Flexible Ranges**: Single IPs, hostnames, CIDR blocks and address spans
//! - **Partial Results**: Per-host failures are recorded, never fatal
//! - **Result Persistence**: Automatic saving and export of scan reports
//! - **Multiple Output Formats**: Plain text, JSON, and CSV
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use rollcall::config::{Config, PasswordCredential, Profile};
//! use rollcall::resolver::TargetResolver;
//! use rollcall::scanner::{Executor, ExecutorConfig, SshTransport};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut config = Config::new();
//!     config.add_credential(PasswordCredential::new("lab", "root", "secret").into()).unwrap();
//!     config
//!         .add_profile(Profile::new("web").with_ranges(["10.0.0.0/29"]).with_credentials(["lab"]))
//!         .unwrap();
//!
//!     let resolution = TargetResolver::new(&config).resolve_profiles(&["web"]).unwrap();
//!     let executor = Executor::new(Arc::new(SshTransport::new()), ExecutorConfig::default());
//!     let report = executor.run(resolution.targets).await;
//!
//!     for outcome in &report.outcomes {
//!         println!("{} {:?}", outcome.host, outcome.field("uname.hostname"));
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`types`] - Ports, address ranges and scan ids
//! - [`config`] - Credentials, profiles, the JSON codec and settings
//! - [`resolver`] - Expands profiles into scan targets
//! - [`scanner`] - The worker pool, the transport seam and scan reports
//! - [`commands`] - Diagnostic commands and their output parsing
//! - [`storage`] - Scan report persistence
//! - [`error`] - Error types for every layer
//! - [`output`] - Output formatting utilities

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod resolver;
pub mod scanner;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use config::{Config, Credential, Profile};
pub use error::CliError;
pub use resolver::{Resolution, TargetResolver};
pub use scanner::{Executor, ExecutorConfig, ScanOutcome, ScanReport, ScanTarget, Transport};
pub use types::{Port, ScanId};
