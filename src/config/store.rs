//! The credential and profile store.
//!
//! `Config` owns every credential and profile of one run. It is an ordinary
//! value: callers load it, pass it by reference to whoever needs it, and
//! decide themselves when to write it back.

use std::collections::HashMap;

use tracing::debug;

use super::credential::Credential;
use super::profile::Profile;
use crate::error::{StoreError, StoreResult};

/// Credentials and profiles with name indexes.
///
/// Invariants upheld by every mutation:
/// - credential names are unique and non-empty;
/// - profile names are unique and non-empty;
/// - a profile is only admitted when all its credential names exist.
///
/// Clearing or removing credentials does not touch profiles that reference
/// them; the resolver skips such dangling names.
#[derive(Debug, Clone, Default)]
pub struct Config {
    credentials: Vec<Credential>,
    credential_index: HashMap<String, usize>,
    profiles: Vec<Profile>,
    profile_index: HashMap<String, usize>,
}

impl Config {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store, adding credentials before profiles.
    pub fn from_parts(
        credentials: impl IntoIterator<Item = Credential>,
        profiles: impl IntoIterator<Item = Profile>,
    ) -> StoreResult<Self> {
        let mut config = Self::new();
        for credential in credentials {
            config.add_credential(credential)?;
        }
        for profile in profiles {
            config.add_profile(profile)?;
        }
        Ok(config)
    }

    /// Add a credential. Fails if the name is empty or taken.
    pub fn add_credential(&mut self, credential: Credential) -> StoreResult<()> {
        let name = credential.name();
        validate_name("credential", name)?;

        if self.credential_index.contains_key(name) {
            return Err(StoreError::DuplicateName {
                kind: "credential",
                name: name.to_string(),
            });
        }

        debug!(name, kind = credential.kind(), "adding credential");
        self.credential_index
            .insert(name.to_string(), self.credentials.len());
        self.credentials.push(credential);
        Ok(())
    }

    /// Remove a credential by name.
    ///
    /// Unknown names are ignored so callers can issue idempotent
    /// "ensure removed" calls. Returns whether anything was removed.
    pub fn remove_credential(&mut self, name: &str) -> bool {
        let Some(position) = self.credential_index.remove(name) else {
            return false;
        };
        self.credentials.remove(position);
        self.credential_index = index_by(&self.credentials, Credential::name);
        true
    }

    /// Look up a credential by name.
    pub fn credential(&self, name: &str) -> Option<&Credential> {
        self.credential_index
            .get(name)
            .map(|&position| &self.credentials[position])
    }

    /// All credentials in insertion order.
    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    /// Remove every credential. Profiles are left as they are.
    pub fn clear_credentials(&mut self) {
        self.credentials.clear();
        self.credential_index.clear();
    }

    /// Add a profile.
    ///
    /// Fails on an empty or duplicate name, or with the first credential
    /// name that does not exist. The store is unchanged on failure.
    pub fn add_profile(&mut self, profile: Profile) -> StoreResult<()> {
        validate_name("profile", &profile.name)?;

        if self.profile_index.contains_key(&profile.name) {
            return Err(StoreError::DuplicateName {
                kind: "profile",
                name: profile.name.clone(),
            });
        }

        if let Some(missing) = profile
            .credential_names
            .iter()
            .find(|name| !self.credential_index.contains_key(name.as_str()))
        {
            return Err(StoreError::UnknownCredential(missing.clone()));
        }

        debug!(name = %profile.name, ranges = profile.ranges.len(), "adding profile");
        self.profile_index
            .insert(profile.name.clone(), self.profiles.len());
        self.profiles.push(profile);
        Ok(())
    }

    /// Remove a profile by name; unknown names are ignored.
    pub fn remove_profile(&mut self, name: &str) -> bool {
        let Some(position) = self.profile_index.remove(name) else {
            return false;
        };
        self.profiles.remove(position);
        self.profile_index = index_by(&self.profiles, |p| p.name.as_str());
        true
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profile_index
            .get(name)
            .map(|&position| &self.profiles[position])
    }

    /// All profiles in insertion order.
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Remove every profile.
    pub fn clear_profiles(&mut self) {
        self.profiles.clear();
        self.profile_index.clear();
    }

    /// Names of profiles referencing a credential that is not in the store.
    pub fn dangling_profiles(&self) -> Vec<&str> {
        self.profiles
            .iter()
            .filter(|p| {
                p.credential_names
                    .iter()
                    .any(|name| !self.credential_index.contains_key(name))
            })
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Strip credential names that are not in the store from every profile.
    /// Returns the names of the profiles that changed.
    pub fn drop_dangling_references(&mut self) -> Vec<String> {
        let known = &self.credential_index;
        let mut changed = Vec::new();
        for profile in &mut self.profiles {
            let before = profile.credential_names.len();
            profile
                .credential_names
                .retain(|name| known.contains_key(name));
            if profile.credential_names.len() != before {
                debug!(profile = %profile.name, "dropped dangling credential names");
                changed.push(profile.name.clone());
            }
        }
        changed
    }
}

fn validate_name(kind: &'static str, name: &str) -> StoreResult<()> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidName {
            kind,
            reason: "name cannot be empty".to_string(),
        });
    }
    Ok(())
}

fn index_by<T>(items: &[T], key: impl Fn(&T) -> &str) -> HashMap<String, usize> {
    items
        .iter()
        .enumerate()
        .map(|(position, item)| (key(item).to_string(), position))
        .collect()
}
