use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::selector::MethodKind;

/// Looked up in the working directory at startup.
pub const CONFIG_FILE: &str = "panels.json";

// ---------------------------------------------------------------------------
// Study configuration
// ---------------------------------------------------------------------------

/// How one day ordinal is mapped onto every method's cross-sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Resolve the ordinal to a date through the reference method, then look
    /// each method up by that date.
    #[default]
    ByDate,
    /// Use the ordinal as a position in every method. Date sequences are
    /// verified to match the reference when the study is built.
    Positional,
}

/// One input file and the method it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub kind: MethodKind,
    pub file: String,
}

impl DatasetConfig {
    fn new(kind: MethodKind, file: &str) -> Self {
        Self {
            kind,
            file: file.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    pub data_dir: PathBuf,
    pub alignment: Alignment,
    /// Method whose days drive the slider.
    pub reference: MethodKind,
    pub datasets: Vec<DatasetConfig>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/"),
            alignment: Alignment::default(),
            reference: MethodKind::Jackwerth,
            datasets: vec![
                DatasetConfig::new(MethodKind::Birs, "results_birs_noLCS.parquet.gzip"),
                DatasetConfig::new(MethodKind::Jackwerth, "results_jackwerth_noLCS.parquet.gzip"),
                DatasetConfig::new(
                    MethodKind::Bondarenko,
                    "results_bondarenko_noLCS.parquet.gzip",
                ),
                DatasetConfig::new(
                    MethodKind::FilteredQuotes,
                    "OptionsData_after_filter.parquet.gzip",
                ),
            ],
        }
    }
}

impl StudyConfig {
    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Each method may be listed at most once.
    fn validate(&self) -> Result<()> {
        for (i, ds) in self.datasets.iter().enumerate() {
            if let Some(prev) = self.datasets[..i].iter().find(|d| d.kind == ds.kind) {
                bail!(
                    "method '{}' listed twice ({} and {})",
                    ds.kind,
                    prev.file,
                    ds.file
                );
            }
        }
        Ok(())
    }

    /// [`Self::load`] when `path` exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("{} not found, using default configuration", path.display());
            Ok(Self::default())
        }
    }

    pub fn dataset_path(&self, dataset: &DatasetConfig) -> PathBuf {
        self.data_dir.join(&dataset.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_study_files() {
        let config = StudyConfig::default();
        assert_eq!(config.reference, MethodKind::Jackwerth);
        assert_eq!(config.alignment, Alignment::ByDate);
        assert_eq!(config.datasets.len(), 4);
        assert_eq!(
            config.dataset_path(&config.datasets[0]),
            PathBuf::from("./data/results_birs_noLCS.parquet.gzip")
        );
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("panels.json");
        std::fs::write(
            &path,
            r#"{ "alignment": "positional", "reference": "birs",
                 "datasets": [{ "kind": "arbViolations", "file": "arb.parquet" }] }"#,
        )
        .unwrap();

        let config = StudyConfig::load(&path).unwrap();
        assert_eq!(config.alignment, Alignment::Positional);
        assert_eq!(config.reference, MethodKind::Birs);
        assert_eq!(config.data_dir, PathBuf::from("./data/"));
        assert_eq!(
            config.datasets,
            vec![DatasetConfig::new(MethodKind::ArbViolations, "arb.parquet")]
        );
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("panels.json");
        std::fs::write(&path, r#"{ "reference": "heston" }"#).unwrap();

        let err = StudyConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("unknown method kind 'heston'"));
    }

    #[test]
    fn test_duplicate_kind_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("panels.json");
        std::fs::write(
            &path,
            r#"{ "datasets": [{ "kind": "birs", "file": "a.parquet" },
                              { "kind": "birs", "file": "b.parquet" }] }"#,
        )
        .unwrap();

        let err = StudyConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("method 'birs' listed twice"));
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let config = StudyConfig::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, StudyConfig::default());
    }
}
