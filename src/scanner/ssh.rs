//! SSH transport on top of libssh2.
//!
//! libssh2 is blocking, so every call runs on tokio's blocking pool. The
//! session is moved into each blocking closure and handed back afterwards.

use std::io::{ErrorKind, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use async_trait::async_trait;
use ssh2::ErrorCode;
use tracing::debug;

use super::traits::{Session, Transport};
use crate::commands::Command;
use crate::config::Credential;
use crate::error::{TransportError, TransportResult};
use crate::types::Port;

/// libssh2's LIBSSH2_ERROR_TIMEOUT.
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;

/// Connects with libssh2, using password or in-memory private key auth.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshTransport;

impl SshTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn connect(
        &self,
        host: &str,
        port: Port,
        credential: &Credential,
        timeout: Duration,
    ) -> TransportResult<Box<dyn Session>> {
        let host = host.to_string();
        let credential = credential.clone();

        let session = tokio::task::spawn_blocking(move || {
            open_session(&host, port, &credential, timeout)
        })
        .await
        .map_err(|e| TransportError::Channel(e.to_string()))??;

        Ok(Box::new(SshSession {
            session: Some(session),
        }))
    }
}

fn open_session(
    host: &str,
    port: Port,
    credential: &Credential,
    timeout: Duration,
) -> TransportResult<ssh2::Session> {
    let tcp = connect_tcp(host, port, timeout)?;
    let _ = tcp.set_read_timeout(Some(timeout));
    let _ = tcp.set_write_timeout(Some(timeout));

    let mut session =
        ssh2::Session::new().map_err(|e| TransportError::Channel(e.message().to_string()))?;
    session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
    session.set_tcp_stream(tcp);
    session.handshake().map_err(|e| classify(e, false))?;

    let username = credential.username();
    let result = match credential {
        Credential::Password(password) => session.userauth_password(username, password.password()),
        Credential::Key(key) => {
            let passphrase = Some(key.passphrase()).filter(|p| !p.is_empty());
            session.userauth_pubkey_memory(username, None, key.key(), passphrase)
        }
    };
    result.map_err(|e| classify(e, true))?;

    if !session.authenticated() {
        return Err(TransportError::AuthRejected(format!(
            "{} was not accepted",
            credential.name()
        )));
    }

    debug!(host, port = %port, credential = credential.name(), "authenticated");
    Ok(session)
}

/// Try every address the host resolves to until one accepts.
fn connect_tcp(host: &str, port: Port, timeout: Duration) -> TransportResult<TcpStream> {
    let addrs = (host, port.as_u16())
        .to_socket_addrs()
        .map_err(|e| TransportError::Unreachable(format!("{}: {}", host, e)))?;

    let mut last = TransportError::Unreachable(format!("{}: no addresses", host));
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) if e.kind() == ErrorKind::TimedOut => last = TransportError::Timeout,
            Err(e) => last = TransportError::Unreachable(format!("{}: {}", addr, e)),
        }
    }
    Err(last)
}

fn classify(error: ssh2::Error, authenticating: bool) -> TransportError {
    match error.code() {
        ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT) => TransportError::Timeout,
        _ if authenticating => TransportError::AuthRejected(error.message().to_string()),
        _ => TransportError::Unreachable(error.message().to_string()),
    }
}

/// An authenticated libssh2 session.
pub struct SshSession {
    session: Option<ssh2::Session>,
}

#[async_trait]
impl Session for SshSession {
    async fn run(&mut self, command: &Command) -> TransportResult<String> {
        let session = self
            .session
            .take()
            .ok_or_else(|| TransportError::Channel("session closed".to_string()))?;
        let line = command.command.clone();

        let (session, output) = tokio::task::spawn_blocking(move || {
            let output = exec(&session, &line);
            (session, output)
        })
        .await
        .map_err(|e| TransportError::Channel(e.to_string()))?;

        self.session = Some(session);
        output
    }

    async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            let _ = tokio::task::spawn_blocking(move || {
                let _ = session.disconnect(None, "scan complete", None);
            })
            .await;
        }
    }
}

fn exec(session: &ssh2::Session, line: &str) -> TransportResult<String> {
    let channel_error = |e: ssh2::Error| match e.code() {
        ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT) => TransportError::Timeout,
        _ => TransportError::Channel(e.message().to_string()),
    };

    let mut channel = session.channel_session().map_err(channel_error)?;
    channel.exec(line).map_err(channel_error)?;

    let mut output = String::new();
    channel.read_to_string(&mut output).map_err(|e| match e.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => TransportError::Timeout,
        _ => TransportError::Channel(e.to_string()),
    })?;
    let _ = channel.wait_close();

    Ok(output)
}
