use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::ConfigError;
use crate::verify::fingerprint::{FingerprintMatcher, FingerprintTable};

pub const FRESH_CAPTURE_WINDOW_MS: i64 = 60_000;
pub const MAX_FRESH_HOURS: f64 = 48.0;

/// Tunables of the verifier, as stored in a rules file. Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PolicyRules {
    pub fresh_capture_window_ms: i64,
    pub max_fresh_hours: f64,
    pub editors: Vec<String>,
    pub fingerprints: FingerprintTable,
}

impl Default for PolicyRules {
    fn default() -> Self {
        Self {
            fresh_capture_window_ms: FRESH_CAPTURE_WINDOW_MS,
            max_fresh_hours: MAX_FRESH_HOURS,
            editors: ["photoshop", "gimp", "lightroom", "canva", "paint", "snapseed"]
                .into_iter()
                .map(String::from)
                .collect(),
            fingerprints: FingerprintTable::default(),
        }
    }
}

/// Rules ready for use: fingerprints compiled, editor names lowercased.
#[derive(Debug, Clone)]
pub struct VerificationPolicy {
    pub fresh_capture_window_ms: i64,
    pub max_fresh_hours: f64,
    editors: Vec<String>,
    fingerprints: FingerprintMatcher,
}

impl VerificationPolicy {
    pub fn from_rules(rules: PolicyRules) -> Result<Self, ConfigError> {
        Ok(Self {
            fresh_capture_window_ms: rules.fresh_capture_window_ms,
            max_fresh_hours: rules.max_fresh_hours,
            editors: rules.editors.iter().map(|e| e.to_lowercase()).collect(),
            fingerprints: FingerprintMatcher::compile(&rules.fingerprints)?,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::from_rules(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let policy = Self::from_json(&json)?;

        info!(
            "Loaded verification rules from {} (fingerprints v{})",
            path.display(),
            policy.fingerprints.version()
        );

        Ok(policy)
    }

    pub fn messaging_app(&self, file_name: &str) -> Option<&str> {
        self.fingerprints.detect(file_name)
    }

    pub fn is_editor(&self, software: &str) -> bool {
        let software = software.to_lowercase();
        self.editors
            .iter()
            .any(|editor| software.contains(editor.as_str()))
    }
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        let rules = PolicyRules::default();

        Self {
            fresh_capture_window_ms: rules.fresh_capture_window_ms,
            max_fresh_hours: rules.max_fresh_hours,
            editors: rules.editors,
            fingerprints: FingerprintMatcher::default(),
        }
    }
}
