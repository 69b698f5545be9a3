//! Configuration structures for extraction and ledger handling.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LedgerError, Result};

/// Main configuration for the cfdi pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Invoice extraction configuration.
    pub extraction: ExtractionConfig,

    /// Ledger file configuration.
    pub ledger: LedgerFileConfig,
}

/// What to do with a monetary value that is present but not a usable amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountPolicy {
    /// Store zero and log a warning.
    #[default]
    DefaultToZero,
    /// Fail the whole file.
    Reject,
}

/// Invoice extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Policy for an invalid `SubTotal` or `Total`. An invalid tax amount is
    /// always stored as zero.
    pub amount_policy: AmountPolicy,

    /// File extensions picked up when expanding batch inputs.
    pub file_extensions: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            amount_policy: AmountPolicy::DefaultToZero,
            file_extensions: vec!["xml".to_string()],
        }
    }
}

impl ExtractionConfig {
    /// Whether a path has one of the accepted extensions (case-insensitive).
    pub fn accepts(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        self.file_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
    }
}

/// Ledger file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerFileConfig {
    /// Ledger used when none is given on the command line.
    pub default_path: Option<PathBuf>,

    /// Leave the ledger file untouched when the merged table has no rows.
    pub skip_empty_save: bool,
}

impl Default for LedgerFileConfig {
    fn default() -> Self {
        Self {
            default_path: None,
            skip_empty_save: true,
        }
    }
}

impl LedgerConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| LedgerError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{"extraction": {"amount_policy": "reject"}}"#).unwrap();
        assert_eq!(config.extraction.amount_policy, AmountPolicy::Reject);
        assert_eq!(config.extraction.file_extensions, vec!["xml".to_string()]);
        assert!(config.ledger.skip_empty_save);
    }

    #[test]
    fn test_accepts_extension_case_insensitive() {
        let config = ExtractionConfig::default();
        assert!(config.accepts(std::path::Path::new("a/b/F1.XML")));
        assert!(!config.accepts(std::path::Path::new("a/b/F1.pdf")));
        assert!(!config.accepts(std::path::Path::new("noext")));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = LedgerConfig::default();
        config.ledger.default_path = Some(PathBuf::from("ledger.csv"));
        config.save(&path).unwrap();

        let loaded = LedgerConfig::from_file(&path).unwrap();
        assert_eq!(loaded.ledger.default_path, Some(PathBuf::from("ledger.csv")));
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(LedgerConfig::from_file(&missing), Err(LedgerError::Io(_))));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"extraction": {"amount_policy": "sometimes"}}"#).unwrap();
        let err = LedgerConfig::from_file(&bad).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
        assert!(err.to_string().contains("bad.json"));
    }
}
