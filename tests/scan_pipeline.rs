//! End-to-end: decode a stored configuration, resolve profiles and run the
//! executor against a scripted transport.

use async_trait::async_trait;
use rollcall::commands::Command;
use rollcall::config::{codec, Credential};
use rollcall::error::{TransportError, TransportResult};
use rollcall::scanner::{FailureReason, Session};
use rollcall::{Executor, ExecutorConfig, Port, TargetResolver, Transport};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CONFIG: &str = r#"{
    "version": 1,
    "credentials": [
        {"name": "ops", "type": "ssh", "username": "ops", "password": "ops-pw"},
        {"name": "root", "type": "ssh", "username": "root", "password": "root-pw"},
        {"name": "deploy", "type": "ssh_key", "username": "deploy", "key": "-----BEGIN KEY-----"}
    ],
    "groups": [
        {"name": "web", "range": ["10.0.0.1-10.0.0.3"], "credentials": ["ops", "root"], "ports": [22, "2222"]},
        {"name": "db", "range": ["10.0.0.3", "10.0.1.0/30"], "credentials": ["deploy"]}
    ]
}"#;

/// Accepts only the scripted (host, port, credential) logins.
struct ScriptedTransport {
    accept: HashSet<(String, u16, String)>,
    silent: HashSet<String>,
    attempts: Mutex<Vec<(String, u16, String)>>,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self {
            accept: HashSet::new(),
            silent: HashSet::new(),
            attempts: Mutex::new(Vec::new()),
        }
    }

    fn accept(mut self, host: &str, port: u16, credential: &str) -> Self {
        self.accept
            .insert((host.to_string(), port, credential.to_string()));
        self
    }

    fn silent(mut self, host: &str) -> Self {
        self.silent.insert(host.to_string());
        self
    }

    fn attempts_for(&self, host: &str) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, _, _)| h == host)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(
        &self,
        host: &str,
        port: Port,
        credential: &Credential,
        _timeout: Duration,
    ) -> TransportResult<Box<dyn Session>> {
        let key = (host.to_string(), port.as_u16(), credential.name().to_string());
        self.attempts.lock().unwrap().push(key.clone());

        if self.silent.contains(host) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if self.accept.contains(&key) {
            return Ok(Box::new(ScriptedSession {
                host: host.to_string(),
            }));
        }
        Err(TransportError::AuthRejected(format!(
            "{} rejected",
            credential.username()
        )))
    }
}

struct ScriptedSession {
    host: String,
}

#[async_trait]
impl Session for ScriptedSession {
    async fn run(&mut self, command: &Command) -> TransportResult<String> {
        Ok(match command.name.as_str() {
            "uname" => format!("Linux\n{}\nx86_64\n", self.host.replace('.', "-")),
            "redhat-release" => "redhat-release-server\n7.9\n7.el7\n".to_string(),
            _ => String::new(),
        })
    }

    async fn close(&mut self) {}
}

#[tokio::test]
async fn test_profiles_resolve_and_scan() {
    let config = codec::decode(CONFIG).unwrap();
    let resolution = TargetResolver::new(&config)
        .with_timeout(Duration::from_millis(100))
        .resolve_profiles(&["web", "missing", "db"])
        .unwrap();

    assert_eq!(resolution.missing, vec!["missing".to_string()]);
    let hosts: Vec<&str> = resolution.targets.iter().map(|t| t.host.as_str()).collect();
    assert_eq!(
        hosts,
        vec!["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.1.1", "10.0.1.2"]
    );

    let transport = Arc::new(
        ScriptedTransport::new()
            .accept("10.0.0.1", 22, "ops")
            .accept("10.0.0.2", 2222, "root")
            .accept("10.0.1.1", 22, "deploy")
            .silent("10.0.1.2"),
    );

    let report = Executor::new(transport.clone(), ExecutorConfig::new(2))
        .run(resolution.targets)
        .await
        .with_missing_profiles(resolution.missing);

    assert_eq!(report.outcomes.len(), 5);

    let first = report.get("10.0.0.1").unwrap();
    assert!(first.succeeded);
    assert_eq!(first.credential.as_deref(), Some("ops"));
    assert_eq!(first.field("uname.hostname"), Some("10-0-0-1"));
    assert_eq!(first.field("redhat-release.version"), Some("7.9"));
    assert_eq!(transport.attempts_for("10.0.0.1"), 1);

    let second = report.get("10.0.0.2").unwrap();
    assert_eq!(second.port, Some(Port::new(2222).unwrap()));
    assert_eq!(second.credential.as_deref(), Some("root"));
    assert_eq!(second.attempts, 4);

    // 10.0.0.3 belongs to "web" because that profile was resolved first.
    let third = report.get("10.0.0.3").unwrap();
    assert_eq!(third.profile, "web");
    assert_eq!(third.failure, Some(FailureReason::AuthRejected));
    assert_eq!(third.attempts, 4);

    assert!(report.get("10.0.1.1").unwrap().succeeded);

    let silent = report.get("10.0.1.2").unwrap();
    assert_eq!(silent.failure, Some(FailureReason::Timeout));

    let summary = report.summary();
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 2);
    assert_eq!(report.missing_profiles, vec!["missing".to_string()]);
}

#[tokio::test]
async fn test_reports_do_not_leak_secrets() {
    let config = codec::decode(CONFIG).unwrap();
    let resolution = TargetResolver::new(&config)
        .resolve_profiles(&["web"])
        .unwrap();
    let transport = Arc::new(ScriptedTransport::new().accept("10.0.0.1", 22, "ops"));

    let report = Executor::new(transport, ExecutorConfig::default())
        .run(resolution.targets)
        .await;

    let json = serde_json::to_string(&report).unwrap();
    assert!(!json.contains("ops-pw"));
    assert!(!json.contains("root-pw"));
}
