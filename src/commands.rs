//! Diagnostic commands run on every host that accepts a login.
//!
//! Each command knows its shell line and how to turn raw output into named
//! fields such as `uname.hostname`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The kinds of diagnostic command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    /// Kernel name, node name and processor type.
    Uname,
    /// Name, version and release of the installed redhat-release package.
    RedhatRelease,
    /// An arbitrary command line.
    Script,
}

/// A diagnostic command descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub kind: CommandKind,
    /// Field prefix and display name.
    pub name: String,
    /// Shell line executed on the remote host.
    pub command: String,
}

impl Command {
    pub fn uname() -> Self {
        Self {
            kind: CommandKind::Uname,
            name: "uname".to_string(),
            command: "uname -s; uname -n; uname -p".to_string(),
        }
    }

    pub fn redhat_release() -> Self {
        Self {
            kind: CommandKind::RedhatRelease,
            name: "redhat-release".to_string(),
            command: r#"rpm -q --queryformat "%{NAME}\n%{VERSION}\n%{RELEASE}\n" --whatprovides redhat-release"#
                .to_string(),
        }
    }

    /// The `index`th user script, named `script.<index>`.
    pub fn script(index: usize, command: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::Script,
            name: format!("script.{}", index),
            command: command.into(),
        }
    }

    /// User scripts numbered from 1 in the order given.
    pub fn scripts<I, S>(commands: I) -> Vec<Command>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        commands
            .into_iter()
            .enumerate()
            .map(|(i, command)| Self::script(i + 1, command))
            .collect()
    }

    /// The commands run when none are configured.
    pub fn defaults() -> Vec<Command> {
        vec![Self::uname(), Self::redhat_release()]
    }

    /// Extract named fields from raw output.
    ///
    /// Output that does not have the expected shape yields no fields; the
    /// raw text is always kept alongside in `CommandResult`.
    pub fn parse(&self, raw: &str) -> BTreeMap<String, String> {
        let lines: Vec<&str> = raw.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let keys: &[&str] = match self.kind {
            CommandKind::Uname => &["os", "hostname", "processor"],
            CommandKind::RedhatRelease => {
                // rpm reports a missing package on stdout
                if lines.iter().any(|l| l.contains("no package provides")) {
                    return BTreeMap::new();
                }
                &["name", "version", "release"]
            }
            CommandKind::Script => {
                let mut fields = BTreeMap::new();
                fields.insert(format!("{}.output", self.name), raw.trim_end().to_string());
                return fields;
            }
        };

        if lines.len() < keys.len() {
            return BTreeMap::new();
        }

        keys.iter()
            .zip(lines)
            .map(|(key, value)| (format!("{}.{}", self.name, key), value.to_string()))
            .collect()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Output of one command on one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub name: String,
    /// Raw stdout; empty when the command could not be run.
    pub output: String,
    /// Parsed fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    /// Why the command produced no output, if it failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResult {
    pub fn completed(command: &Command, output: String) -> Self {
        Self {
            name: command.name.clone(),
            fields: command.parse(&output),
            output,
            error: None,
        }
    }

    pub fn failed(command: &Command, error: impl Into<String>) -> Self {
        Self {
            name: command.name.clone(),
            output: String::new(),
            fields: BTreeMap::new(),
            error: Some(error.into()),
        }
    }
}
