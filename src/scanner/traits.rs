//! Transport abstraction.
//!
//! The executor only knows how to open a session and run commands on it.
//! `SshTransport` is the shipped implementation; tests script their own.

use crate::commands::Command;
use crate::config::Credential;
use crate::error::TransportResult;
use crate::types::Port;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Opens authenticated sessions to remote hosts.
///
/// # Example
///
/// ```ignore
/// use rollcall::scanner::Transport;
///
/// async fn can_log_in<T: Transport>(transport: &T, credential: &Credential) -> bool {
///     transport
///         .connect("10.0.0.1", Port::SSH, credential, Duration::from_secs(5))
///         .await
///         .is_ok()
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect and authenticate within `timeout`.
    ///
    /// An explicit rejection of the credential must be reported as
    /// `TransportError::AuthRejected` so callers can tell it apart from a
    /// host that never answered.
    async fn connect(
        &self,
        host: &str,
        port: Port,
        credential: &Credential,
        timeout: Duration,
    ) -> TransportResult<Box<dyn Session>>;
}

/// An authenticated session.
#[async_trait]
pub trait Session: Send {
    /// Run a command and return its standard output.
    async fn run(&mut self, command: &Command) -> TransportResult<String>;

    /// Close the session. Errors while closing are ignored.
    async fn close(&mut self);
}

/// A transport shared between scan workers.
pub type SharedTransport = Arc<dyn Transport>;
