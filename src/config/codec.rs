//! JSON codec for the credential/profile store.
//!
//! Decoding is strict: the top level must hold exactly `version`,
//! `credentials` and `groups`, and every record is checked for missing and
//! unexpected keys before it is turned into a model value. Credentials are
//! decoded first so that profile references can be checked as the store is
//! built.
//!
//! ```json
//! {
//!   "version": 1,
//!   "credentials": [
//!     {"name": "bobslogin", "type": "ssh", "username": "bob", "password": "..."},
//!     {"name": "bobskey", "type": "ssh_key", "username": "bob", "key": "...", "password": ""}
//!   ],
//!   "groups": [
//!     {"name": "accounting", "range": ["192.168.0.0/24"], "credentials": ["bobskey"], "ports": [22, 2222]}
//!   ]
//! }
//! ```

use serde::Serialize;
use serde_json::{Map, Value};

use super::credential::{Credential, KeyCredential, PasswordCredential};
use super::profile::Profile;
use super::store::Config;
use crate::error::{CodecError, CodecResult};
use crate::types::{Port, PortList};

/// Current serialized format version.
pub const CONFIG_VERSION: i64 = 1;

const VERSION_KEY: &str = "version";
const CREDENTIALS_KEY: &str = "credentials";
const GROUPS_KEY: &str = "groups";
const NAME_KEY: &str = "name";
const TYPE_KEY: &str = "type";
const USERNAME_KEY: &str = "username";
const PASSWORD_KEY: &str = "password";
const KEY_KEY: &str = "key";
const RANGE_KEY: &str = "range";
const PORTS_KEY: &str = "ports";

const PASSWORD_TYPE: &str = "ssh";
const KEY_TYPE: &str = "ssh_key";

/// Parse configuration text into a validated `Config`.
///
/// Nothing is returned unless the whole document is valid.
pub fn decode(text: &str) -> CodecResult<Config> {
    let root: Value =
        serde_json::from_str(text).map_err(|e| CodecError::Malformed(e.to_string()))?;
    let root = root
        .as_object()
        .ok_or_else(|| CodecError::Malformed("top level is not an object".to_string()))?;

    verify_keys(root, &[VERSION_KEY, CREDENTIALS_KEY, GROUPS_KEY], &[])?;

    let version = root[VERSION_KEY]
        .as_i64()
        .ok_or_else(|| CodecError::wrong_type(VERSION_KEY, "an integer"))?;
    if version != CONFIG_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let mut config = Config::new();

    for record in array(root, CREDENTIALS_KEY)? {
        let record = record
            .as_object()
            .ok_or_else(|| CodecError::wrong_type(CREDENTIALS_KEY, "an array of objects"))?;
        config.add_credential(decode_credential(record)?)?;
    }

    for record in array(root, GROUPS_KEY)? {
        let record = record
            .as_object()
            .ok_or_else(|| CodecError::wrong_type(GROUPS_KEY, "an array of objects"))?;
        config.add_profile(decode_profile(record)?)?;
    }

    Ok(config)
}

/// Serialize a `Config` to compact JSON.
pub fn encode(config: &Config) -> CodecResult<String> {
    Ok(serde_json::to_string(&ConfigRecord::from(config))?)
}

/// Serialize a `Config` to indented JSON.
pub fn encode_pretty(config: &Config) -> CodecResult<String> {
    Ok(serde_json::to_string_pretty(&ConfigRecord::from(config))?)
}

fn decode_credential(record: &Map<String, Value>) -> CodecResult<Credential> {
    // Only name and type are checked before dispatch; each variant then
    // checks its own full key set.
    verify_keys_required(record, &[NAME_KEY, TYPE_KEY])?;

    let kind = string(record, TYPE_KEY)?;
    match kind {
        PASSWORD_TYPE => {
            verify_keys(record, &[NAME_KEY, TYPE_KEY, USERNAME_KEY, PASSWORD_KEY], &[])?;
            Ok(PasswordCredential::new(
                string(record, NAME_KEY)?,
                string(record, USERNAME_KEY)?,
                string(record, PASSWORD_KEY)?,
            )
            .into())
        }
        KEY_TYPE => {
            verify_keys(
                record,
                &[NAME_KEY, TYPE_KEY, USERNAME_KEY, KEY_KEY],
                &[PASSWORD_KEY],
            )?;
            let passphrase = match record.get(PASSWORD_KEY) {
                Some(_) => string(record, PASSWORD_KEY)?,
                None => "",
            };
            Ok(KeyCredential::new(
                string(record, NAME_KEY)?,
                string(record, USERNAME_KEY)?,
                string(record, KEY_KEY)?,
            )
            .with_passphrase(passphrase)
            .into())
        }
        other => Err(CodecError::UnsupportedType(other.to_string())),
    }
}

fn decode_profile(record: &Map<String, Value>) -> CodecResult<Profile> {
    verify_keys(record, &[NAME_KEY, RANGE_KEY, CREDENTIALS_KEY], &[PORTS_KEY])?;

    let name = string(record, NAME_KEY)?;
    let ranges = string_array(record, RANGE_KEY)?;
    let credential_names = string_array(record, CREDENTIALS_KEY)?;

    let ports = match record.get(PORTS_KEY) {
        Some(_) => array(record, PORTS_KEY)?
            .iter()
            .map(|value| decode_port(name, value))
            .collect::<CodecResult<Vec<Port>>>()?,
        None => Vec::new(),
    };

    Ok(Profile {
        name: name.to_string(),
        ranges,
        credential_names,
        ports: PortList::new(ports),
    })
}

/// Ports may be JSON integers or strings holding an integer.
fn decode_port(profile: &str, value: &Value) -> CodecResult<Port> {
    let invalid = || CodecError::InvalidPort {
        profile: profile.to_string(),
        value: value.to_string(),
    };

    let number = match value {
        Value::Number(n) => n.as_i64().ok_or_else(invalid)?,
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };
    Port::try_from(number).map_err(|_| invalid())
}

/// Check that all `required` keys are present and nothing outside
/// `required` and `optional` is.
fn verify_keys(
    record: &Map<String, Value>,
    required: &[&str],
    optional: &[&str],
) -> CodecResult<()> {
    verify_keys_required(record, required)?;
    if let Some(extra) = record
        .keys()
        .find(|key| !required.contains(&key.as_str()) && !optional.contains(&key.as_str()))
    {
        return Err(CodecError::extraneous(extra));
    }
    Ok(())
}

fn verify_keys_required(record: &Map<String, Value>, required: &[&str]) -> CodecResult<()> {
    match required.iter().find(|key| !record.contains_key(**key)) {
        Some(missing) => Err(CodecError::missing(missing)),
        None => Ok(()),
    }
}

fn string<'a>(record: &'a Map<String, Value>, key: &str) -> CodecResult<&'a str> {
    record
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| CodecError::wrong_type(key, "a string"))
}

fn array<'a>(record: &'a Map<String, Value>, key: &str) -> CodecResult<&'a Vec<Value>> {
    record
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| CodecError::wrong_type(key, "an array"))
}

fn string_array(record: &Map<String, Value>, key: &str) -> CodecResult<Vec<String>> {
    array(record, key)?
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| CodecError::wrong_type(key, "an array of strings"))
        })
        .collect()
}

// Serialized shapes. Field order here is the output key order.

#[derive(Serialize)]
struct ConfigRecord<'a> {
    version: i64,
    credentials: Vec<CredentialRecord<'a>>,
    groups: Vec<GroupRecord<'a>>,
}

#[derive(Serialize)]
struct CredentialRecord<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<&'a str>,
    password: &'a str,
}

#[derive(Serialize)]
struct GroupRecord<'a> {
    name: &'a str,
    range: &'a [String],
    credentials: &'a [String],
    ports: &'a [Port],
}

impl<'a> From<&'a Config> for ConfigRecord<'a> {
    fn from(config: &'a Config) -> Self {
        Self {
            version: CONFIG_VERSION,
            credentials: config.credentials().iter().map(CredentialRecord::from).collect(),
            groups: config
                .profiles()
                .iter()
                .map(|p| GroupRecord {
                    name: &p.name,
                    range: &p.ranges,
                    credentials: &p.credential_names,
                    ports: p.ports.as_slice(),
                })
                .collect(),
        }
    }
}

impl<'a> From<&'a Credential> for CredentialRecord<'a> {
    fn from(credential: &'a Credential) -> Self {
        match credential {
            Credential::Password(c) => Self {
                name: credential.name(),
                kind: PASSWORD_TYPE,
                username: credential.username(),
                key: None,
                password: c.password(),
            },
            Credential::Key(c) => Self {
                name: credential.name(),
                kind: KEY_TYPE,
                username: credential.username(),
                key: Some(c.key()),
                password: c.passphrase(),
            },
        }
    }
}
