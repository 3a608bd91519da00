//! Persisted cache metadata
//!
//! The `[metadata]` table of a layer, kept across builds. It is an open
//! mapping so keys written by other tools survive a round trip; the keys
//! this crate cares about live in [`keys`].

use crate::cache::fingerprint::Fingerprint;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata keys
pub mod keys {
    /// Fingerprint of the inputs of the last install
    pub const CACHE_SHA: &str = "cache_sha";
    /// When the last install finished (RFC3339)
    pub const BUILT_AT: &str = "built_at";
}

/// Layer metadata mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheMetadata(BTreeMap<String, toml::Value>);

impl CacheMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint recorded by the previous build. Non-string values count as absent.
    pub fn cache_sha(&self) -> Option<Fingerprint> {
        self.0
            .get(keys::CACHE_SHA)
            .and_then(toml::Value::as_str)
            .map(Fingerprint::new)
    }

    /// Record the fingerprint of a successful install
    pub fn set_cache_sha(&mut self, fingerprint: &Fingerprint) {
        self.0.insert(
            keys::CACHE_SHA.to_string(),
            toml::Value::String(fingerprint.to_string()),
        );
    }

    /// Forget the recorded fingerprint, so the next build cannot skip on it
    pub fn clear_cache_sha(&mut self) {
        self.0.remove(keys::CACHE_SHA);
    }

    /// When the recorded install finished
    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.0
            .get(keys::BUILT_AT)
            .and_then(toml::Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn set_built_at(&mut self, at: DateTime<Utc>) {
        self.0.insert(
            keys::BUILT_AT.to_string(),
            toml::Value::String(at.to_rfc3339_opts(SecondsFormat::Nanos, true)),
        );
    }

    /// Raw access to any key
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
