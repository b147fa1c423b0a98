use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::LedgerError;
use crate::model::IdentityKey;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub identity: IdentityKey,
    /// GROUP cell values accepted verbatim by the classifier. Any other GROUP
    /// cell sends the row through free-text parsing, which infers Finding,
    /// SB/ADs or Customer Report from the text itself.
    #[serde(default = "default_valid_groups")]
    pub valid_groups: Vec<String>,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub continuation: ContinuationConfig,
    #[serde(default)]
    pub consolidation: ConsolidationConfig,
    #[serde(default)]
    pub similarity: SimilarityConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            identity: IdentityKey::default(),
            valid_groups: default_valid_groups(),
            classifier: ClassifierConfig::default(),
            continuation: ContinuationConfig::default(),
            consolidation: ConsolidationConfig::default(),
            similarity: SimilarityConfig::default(),
        }
    }
}

fn default_name() -> String {
    "task ledger".into()
}

fn default_valid_groups() -> Vec<String> {
    [
        "Planned",
        "Internal Procedure",
        "Customer Request",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// An unrecognized critical-issue status longer than this is description spillover.
    #[serde(default = "default_spillover_min_len")]
    pub spillover_min_len: usize,
    /// Regulatory reference searched for in SB/ADs descriptions lacking an external task.
    #[serde(default = "default_regulatory_reference")]
    pub regulatory_reference: String,
    /// Cell values that mark a repeated table header row.
    #[serde(default = "default_header_signature")]
    pub header_signature: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            spillover_min_len: default_spillover_min_len(),
            regulatory_reference: default_regulatory_reference(),
            header_signature: default_header_signature(),
        }
    }
}

fn default_spillover_min_len() -> usize {
    20
}

fn default_regulatory_reference() -> String {
    r"AD\s?\(ANAC\)\s?\d{4}-\d{2}-\d{2}".into()
}

fn default_header_signature() -> Vec<String> {
    vec!["SEQ".into(), "GROUP".into(), "DESCRIPTION".into()]
}

// ---------------------------------------------------------------------------
// Continuation guards
// ---------------------------------------------------------------------------

/// Continuation text matching either pattern is discarded instead of being
/// appended to the buffered task.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContinuationConfig {
    #[serde(default = "default_task_code_pattern")]
    pub task_code_pattern: String,
    #[serde(default = "default_header_pattern")]
    pub header_pattern: String,
}

impl Default for ContinuationConfig {
    fn default() -> Self {
        Self {
            task_code_pattern: default_task_code_pattern(),
            header_pattern: default_header_pattern(),
        }
    }
}

fn default_task_code_pattern() -> String {
    r"^\d{2}-\d{2}-\d{2}-\d{3}".into()
}

fn default_header_pattern() -> String {
    "PHASE SEQ GROUP".into()
}

// ---------------------------------------------------------------------------
// Consolidation + Similarity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsolidationConfig {
    /// Substrings that mark a description fragment as boilerplate.
    #[serde(default = "default_junk_markers")]
    pub junk_markers: Vec<String>,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            junk_markers: default_junk_markers(),
        }
    }
}

fn default_junk_markers() -> Vec<String> {
    vec![
        "PHASE SEQ GROUP".into(),
        "Assunto escalado".into(),
        "MATERIAL SEM PRAZO".into(),
    ]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimilarityConfig {
    #[serde(default = "default_similarity_threshold")]
    pub threshold: u8,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: default_similarity_threshold(),
        }
    }
}

fn default_similarity_threshold() -> u8 {
    98
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl LedgerConfig {
    /// Read and validate a config file.
    pub fn from_path(path: &Path) -> Result<Self, LedgerError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Io(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&input)
    }

    pub fn from_toml(input: &str) -> Result<Self, LedgerError> {
        let config: LedgerConfig =
            toml::from_str(input).map_err(|e| LedgerError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.valid_groups.is_empty() {
            return Err(LedgerError::ConfigValidation(
                "valid_groups must list at least one group".into(),
            ));
        }

        if self.similarity.threshold > 100 {
            return Err(LedgerError::ConfigValidation(format!(
                "similarity.threshold must be 0..=100, got {}",
                self.similarity.threshold
            )));
        }

        if self.classifier.header_signature.len() < 2 {
            return Err(LedgerError::ConfigValidation(
                "classifier.header_signature needs at least two tokens".into(),
            ));
        }

        compile_pattern("classifier.regulatory_reference", &self.classifier.regulatory_reference)?;
        compile_pattern("continuation.task_code_pattern", &self.continuation.task_code_pattern)?;
        compile_pattern("continuation.header_pattern", &self.continuation.header_pattern)?;

        Ok(())
    }
}

pub(crate) fn compile_pattern(field: &str, pattern: &str) -> Result<Regex, LedgerError> {
    Regex::new(pattern).map_err(|e| LedgerError::InvalidPattern {
        field: field.to_string(),
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
name = "Line maintenance ledger"
identity = "group_seq"
valid_groups = ["Planned", "Customer Request"]

[classifier]
spillover_min_len = 30
header_signature = ["SEQ", "GROUP"]

[continuation]
task_code_pattern = '^\d{3}-\d{3}'
header_pattern = 'SEQ GROUP'

[consolidation]
junk_markers = ["Assunto escalado"]

[similarity]
threshold = 95
"#;

    #[test]
    fn parse_full_config() {
        let config = LedgerConfig::from_toml(FULL).unwrap();
        assert_eq!(config.name, "Line maintenance ledger");
        assert_eq!(config.identity, IdentityKey::GroupSeq);
        assert_eq!(config.valid_groups.len(), 2);
        assert_eq!(config.classifier.spillover_min_len, 30);
        assert_eq!(config.continuation.header_pattern, "SEQ GROUP");
        assert_eq!(config.consolidation.junk_markers, vec!["Assunto escalado"]);
        assert_eq!(config.similarity.threshold, 95);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = LedgerConfig::from_toml("").unwrap();
        assert_eq!(config.identity, IdentityKey::Seq);
        assert_eq!(
            config.valid_groups,
            vec!["Planned", "Internal Procedure", "Customer Request"]
        );
        assert_eq!(config.classifier.spillover_min_len, 20);
        assert_eq!(config.similarity.threshold, 98);
        assert_eq!(config.consolidation.junk_markers.len(), 3);
    }

    #[test]
    fn default_matches_empty_toml() {
        let parsed = LedgerConfig::from_toml("").unwrap();
        let built = LedgerConfig::default();
        assert_eq!(parsed.name, built.name);
        assert_eq!(parsed.valid_groups, built.valid_groups);
        assert_eq!(parsed.continuation.task_code_pattern, built.continuation.task_code_pattern);
    }

    #[test]
    fn reject_unknown_identity() {
        let err = LedgerConfig::from_toml(r#"identity = "phase_seq""#);
        assert!(matches!(err, Err(LedgerError::ConfigParse(_))));
    }

    #[test]
    fn reject_unknown_field() {
        let err = LedgerConfig::from_toml("spillover = 12");
        assert!(matches!(err, Err(LedgerError::ConfigParse(_))));
    }

    #[test]
    fn reject_empty_groups() {
        let err = LedgerConfig::from_toml("valid_groups = []").unwrap_err();
        assert!(err.to_string().contains("valid_groups"));
    }

    #[test]
    fn reject_threshold_over_100() {
        let err = LedgerConfig::from_toml("[similarity]\nthreshold = 101").unwrap_err();
        assert!(matches!(err, LedgerError::ConfigValidation(_)));
    }

    #[test]
    fn reject_bad_regex() {
        let err = LedgerConfig::from_toml("[continuation]\ntask_code_pattern = '(unclosed'")
            .unwrap_err();
        match err {
            LedgerError::InvalidPattern { field, .. } => {
                assert_eq!(field, "continuation.task_code_pattern")
            }
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.toml");
        std::fs::write(&path, "identity = \"group_seq\"\n").unwrap();
        let config = LedgerConfig::from_path(&path).unwrap();
        assert_eq!(config.identity, IdentityKey::GroupSeq);
    }

    #[test]
    fn from_path_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LedgerConfig::from_path(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, LedgerError::Io(_)));
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn reject_short_header_signature() {
        let err = LedgerConfig::from_toml("[classifier]\nheader_signature = [\"SEQ\"]").unwrap_err();
        assert!(matches!(err, LedgerError::ConfigValidation(_)));
    }
}
