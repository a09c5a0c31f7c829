//! Configuration management for rollcall.
//!
//! Holds the credential/profile model and its JSON codec, the persistence
//! seam for the serialized store, and XDG-compliant application settings.

pub mod codec;
mod credential;
mod profile;
mod settings;
mod store;
mod vault;

pub use codec::CONFIG_VERSION;
pub use credential::{Credential, KeyCredential, PasswordCredential};
pub use profile::Profile;
pub use settings::{AppSettings, Paths, PASSPHRASE_ENV};
pub use store::Config;
pub use vault::{ConfigVault, PlainVault};
