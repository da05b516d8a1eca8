use std::path::PathBuf;

use crate::color::MethodColors;
use crate::config::StudyConfig;
use crate::data::error::PanelResult;
use crate::data::model::ResultTable;
use crate::data::selector::MethodKind;
use crate::data::study::Study;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Where the study is loaded from; edited by the folder dialog.
    pub config: StudyConfig,

    /// Loaded study (None until a load succeeds).
    pub study: Option<Study>,

    /// Selected day, within `[0, study.max_ordinal()]`.
    pub day: usize,

    /// Per-method cross-sections for `day` (cached).
    pub selections: Vec<(MethodKind, PanelResult<ResultTable>)>,

    /// Method shown in the cross-section table.
    pub table_method: MethodKind,

    pub colors: MethodColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: StudyConfig) -> Self {
        let table_method = config.reference;
        Self {
            config,
            study: None,
            day: 0,
            selections: Vec::new(),
            table_method,
            colors: MethodColors::default(),
            status_message: None,
        }
    }

    /// (Re)load every dataset named by `config`.
    pub fn load(&mut self) {
        match Study::load(&self.config) {
            Ok(study) => {
                log::info!(
                    "Loaded study from {}: {} days, slider driven by {}",
                    self.config.data_dir.display(),
                    study.day_count(),
                    study.reference()
                );
                self.set_study(study);
            }
            Err(e) => {
                log::error!("Failed to load study: {e:#}");
                self.study = None;
                self.selections.clear();
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Point the study at another data directory and reload.
    pub fn set_data_dir(&mut self, dir: PathBuf) {
        self.config.data_dir = dir;
        self.load();
    }

    /// Ingest a newly built study and select its first day.
    pub fn set_study(&mut self, study: Study) {
        self.study = Some(study);
        self.status_message = None;
        self.set_day(0);
    }

    /// Move the day slider, clamped to the study's range, and reselect.
    pub fn set_day(&mut self, day: usize) {
        let max = self.study.as_ref().map_or(0, Study::max_ordinal);
        self.day = day.min(max);
        self.reselect();
    }

    /// Recompute `selections` after a day or study change.
    pub fn reselect(&mut self) {
        self.selections = match &self.study {
            Some(study) => study.select_all(self.day as i64),
            None => Vec::new(),
        };
        for (kind, result) in &self.selections {
            if let Err(e) = result {
                log::debug!("day {}: {kind} unavailable: {e}", self.day);
            }
        }
    }

    /// Cached cross-section of one method for the current day.
    pub fn selection(&self, kind: MethodKind) -> Option<&PanelResult<ResultTable>> {
        self.selections
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, result)| result)
    }

    /// Label of the selected day, e.g. `2020-01-06 / 2020-01-10`.
    pub fn day_label(&self) -> Option<String> {
        let study = self.study.as_ref()?;
        study.day_key(self.day as i64).ok().map(|k| k.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Alignment;
    use crate::data::model::{CellValue, Column};
    use crate::data::selector::FITTED_COLUMNS;

    fn study(days: &[i64]) -> Study {
        let mut columns = vec![
            Column::new("date", days.iter().map(|&d| CellValue::Integer(d)).collect()),
            Column::new("exdate", vec![CellValue::Integer(99); days.len()]),
        ];
        for name in FITTED_COLUMNS {
            columns.push(Column::new(name, vec![CellValue::Float(1.0); days.len()]));
        }
        let table = ResultTable::new("jackwerth", columns).unwrap();
        Study::build(
            vec![
                (MethodKind::Jackwerth, "jackwerth".into(), Ok(table)),
                (
                    MethodKind::Birs,
                    "birs".into(),
                    Err(anyhow::anyhow!("missing file")),
                ),
            ],
            MethodKind::Jackwerth,
            Alignment::ByDate,
        )
        .unwrap()
    }

    #[test]
    fn test_day_is_clamped_to_slider_range() {
        let mut state = AppState::new(StudyConfig::default());
        state.set_study(study(&[1, 2, 3]));
        assert_eq!(state.day, 0);

        state.set_day(10);
        assert_eq!(state.day, 2);
        assert_eq!(state.day_label().as_deref(), Some("3 / 99"));
    }

    #[test]
    fn test_selections_are_isolated_per_method() {
        let mut state = AppState::new(StudyConfig::default());
        state.set_study(study(&[1, 2]));
        state.set_day(1);

        assert!(matches!(state.selection(MethodKind::Jackwerth), Some(Ok(t)) if t.len() == 1));
        assert!(matches!(state.selection(MethodKind::Birs), Some(Err(_))));
        assert!(state.selection(MethodKind::Bondarenko).is_none());
    }

    #[test]
    fn test_failed_load_sets_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(StudyConfig::default());
        state.set_data_dir(dir.path().to_path_buf());

        assert!(state.study.is_none());
        assert!(state.status_message.is_some());
        assert!(state.selections.is_empty());
    }
}
