use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File-name conventions of apps that strip metadata when re-sharing images.
/// Versioned so rule files can be updated without touching the trust algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintTable {
    pub version: u32,
    pub apps: Vec<AppFingerprint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppFingerprint {
    pub app: String,
    /// Regular expressions, matched case-insensitively anywhere in the name.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Plain substrings, matched case-insensitively.
    #[serde(default)]
    pub contains: Vec<String>,
}

impl AppFingerprint {
    fn new(app: &str, patterns: &[&str], contains: &[&str]) -> Self {
        Self {
            app: app.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            contains: contains.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Default for FingerprintTable {
    fn default() -> Self {
        Self {
            version: 1,
            apps: vec![
                AppFingerprint::new("WhatsApp", &[r"IMG-\d{8}-WA\d+"], &["whatsapp"]),
                AppFingerprint::new("Telegram", &[r"photo_\d{4}-\d{2}-\d{2}"], &["telegram"]),
                AppFingerprint::new("Signal", &[r"signal-\d{4}-\d{2}-\d{2}"], &[]),
                AppFingerprint::new("Messenger", &[r"^received_\d+"], &[]),
                AppFingerprint::new("Instagram", &[], &["insta"]),
            ],
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledFingerprint {
    app: String,
    patterns: Vec<Regex>,
    contains: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FingerprintMatcher {
    version: u32,
    apps: Vec<CompiledFingerprint>,
}

impl FingerprintMatcher {
    pub fn compile(table: &FingerprintTable) -> Result<Self, ConfigError> {
        let apps = table
            .apps
            .iter()
            .map(|fingerprint| {
                let patterns = fingerprint
                    .patterns
                    .iter()
                    .map(|pattern| {
                        RegexBuilder::new(pattern)
                            .case_insensitive(true)
                            .build()
                            .map_err(|source| ConfigError::InvalidPattern {
                                app: fingerprint.app.clone(),
                                source,
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(CompiledFingerprint {
                    app: fingerprint.app.clone(),
                    patterns,
                    contains: fingerprint
                        .contains
                        .iter()
                        .map(|needle| needle.to_lowercase())
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            version: table.version,
            apps,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Name of the first app whose fingerprint matches `file_name`.
    pub fn detect(&self, file_name: &str) -> Option<&str> {
        let lowercase_name = file_name.to_lowercase();

        self.apps
            .iter()
            .find(|fingerprint| {
                fingerprint.patterns.iter().any(|re| re.is_match(file_name))
                    || fingerprint
                        .contains
                        .iter()
                        .any(|needle| lowercase_name.contains(needle.as_str()))
            })
            .map(|fingerprint| fingerprint.app.as_str())
    }
}

impl Default for FingerprintMatcher {
    fn default() -> Self {
        let table = FingerprintTable::default();

        Self {
            version: table.version,
            apps: table
                .apps
                .into_iter()
                .map(|fingerprint| CompiledFingerprint {
                    patterns: fingerprint
                        .patterns
                        .iter()
                        .filter_map(|pattern| {
                            RegexBuilder::new(pattern).case_insensitive(true).build().ok()
                        })
                        .collect(),
                    contains: fingerprint.contains,
                    app: fingerprint.app,
                })
                .collect(),
        }
    }
}
