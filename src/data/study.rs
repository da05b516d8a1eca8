use std::collections::BTreeMap;

use crate::config::{Alignment, StudyConfig};

use super::error::{PanelError, PanelResult};
use super::loader;
use super::model::ResultTable;
use super::panel::{GroupKey, PanelIndex};
use super::selector::{self, MethodKind};

// ---------------------------------------------------------------------------
// MethodPanel – one configured dataset, healthy or not
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MethodPanel {
    pub kind: MethodKind,
    /// Where the table came from (file name or test label).
    pub source: String,
    /// The built index, or why this method cannot be shown.
    pub index: PanelResult<PanelIndex>,
}

// ---------------------------------------------------------------------------
// Study – every method's panel plus the day alignment policy
// ---------------------------------------------------------------------------

/// All panels of one research study, built once and read-only afterwards.
///
/// A failure in one method is stored in its [`MethodPanel`] and only surfaces
/// when that method is selected.
#[derive(Debug, Clone)]
pub struct Study {
    alignment: Alignment,
    reference: MethodKind,
    panels: BTreeMap<MethodKind, MethodPanel>,
}

impl Study {
    /// Load every configured file and build the study.
    pub fn load(config: &StudyConfig) -> anyhow::Result<Self> {
        let tables = config
            .datasets
            .iter()
            .map(|ds| {
                let path = config.dataset_path(ds);
                let table = loader::load_file(&path);
                match &table {
                    Ok(t) => log::info!(
                        "{}: loaded {} rows from {}",
                        ds.kind,
                        t.len(),
                        path.display()
                    ),
                    Err(e) => log::error!("{}: failed to load {}: {e:#}", ds.kind, path.display()),
                }
                (ds.kind, ds.file.clone(), table)
            })
            .collect();

        Ok(Self::build(tables, config.reference, config.alignment)?)
    }

    /// Index every table and check alignment against `reference`.
    ///
    /// Fails only when no method at all can drive the slider. If the
    /// configured reference is unusable the first healthy method takes over.
    pub fn build(
        tables: Vec<(MethodKind, String, anyhow::Result<ResultTable>)>,
        reference: MethodKind,
        alignment: Alignment,
    ) -> PanelResult<Self> {
        let mut panels = BTreeMap::new();
        for (kind, source, table) in tables {
            if let Some(first) = panels.get(&kind).map(|p: &MethodPanel| &p.source) {
                log::warn!("{kind}: ignoring {source}, already loaded from {first}");
                continue;
            }
            let index = table
                .map_err(|e| PanelError::Unavailable {
                    method: kind.to_string(),
                    reason: format!("{e:#}"),
                })
                .and_then(|t| PanelIndex::build(&t, kind.key_fields()));
            if let Err(e) = &index {
                log::warn!("{kind}: {e}");
            }
            panels.insert(
                kind,
                MethodPanel {
                    kind,
                    source,
                    index,
                },
            );
        }

        let reference = Self::pick_reference(&panels, reference)?;

        let mut study = Self {
            alignment,
            reference,
            panels,
        };
        if alignment == Alignment::Positional {
            study.verify_positional();
        }
        Ok(study)
    }

    fn pick_reference(
        panels: &BTreeMap<MethodKind, MethodPanel>,
        wanted: MethodKind,
    ) -> PanelResult<MethodKind> {
        let healthy = |k: &MethodKind| panels.get(k).is_some_and(|p| p.index.is_ok());
        if healthy(&wanted) {
            return Ok(wanted);
        }

        let fallback = MethodKind::ALL.into_iter().find(healthy);
        match (fallback, panels.get(&wanted)) {
            (Some(kind), _) => {
                log::warn!("reference {wanted} unavailable, using {kind} to drive the day slider");
                Ok(kind)
            }
            (None, Some(MethodPanel { index: Err(e), .. })) => Err(e.clone()),
            (None, _) => Err(PanelError::Unavailable {
                method: wanted.to_string(),
                reason: "not configured".to_string(),
            }),
        }
    }

    /// Mark every method whose date sequence differs from the reference's.
    fn verify_positional(&mut self) {
        let Some(Ok(reference)) = self.panels.get(&self.reference).map(|p| &p.index) else {
            return;
        };
        let expected: Vec<_> = reference.dates().into_iter().cloned().collect();
        let reference_name = self.reference.to_string();

        for panel in self.panels.values_mut() {
            let Ok(index) = &panel.index else { continue };
            let dates = index.dates();
            let detail = if dates.len() != expected.len() {
                Some(format!("{} days, reference has {}", dates.len(), expected.len()))
            } else {
                dates
                    .iter()
                    .zip(&expected)
                    .position(|(a, b)| *a != b)
                    .map(|i| format!("day {i} is {}, reference has {}", dates[i], expected[i]))
            };
            if let Some(detail) = detail {
                let err = PanelError::date_mismatch(panel.kind.to_string(), &reference_name, detail);
                log::warn!("{err}");
                panel.index = Err(err);
            }
        }
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn reference(&self) -> MethodKind {
        self.reference
    }

    fn reference_index(&self) -> &PanelIndex {
        match self.panels.get(&self.reference).map(|p| &p.index) {
            Some(Ok(index)) => index,
            // `build` only keeps a reference whose index is healthy
            _ => unreachable!("study reference {} has no index", self.reference),
        }
    }

    /// Number of selectable days.
    pub fn day_count(&self) -> usize {
        self.reference_index().count()
    }

    /// Inclusive upper bound of the day slider.
    pub fn max_ordinal(&self) -> usize {
        self.reference_index().max_ordinal()
    }

    /// Reference key of a day, e.g. `2020-01-06 / 2020-01-10`.
    pub fn day_key(&self, ordinal: i64) -> PanelResult<&GroupKey> {
        self.reference_index().key(ordinal)
    }

    pub fn panels(&self) -> impl Iterator<Item = &MethodPanel> {
        self.panels.values()
    }

    /// Projected, moneyness-sorted cross-section of `kind` for day `ordinal`.
    pub fn select(&self, ordinal: i64, kind: MethodKind) -> PanelResult<ResultTable> {
        let panel = self.panels.get(&kind).ok_or_else(|| PanelError::Unavailable {
            method: kind.to_string(),
            reason: "not configured".to_string(),
        })?;
        let index = panel.index.as_ref().map_err(Clone::clone)?;

        match self.alignment {
            Alignment::Positional => selector::select(index, ordinal, kind),
            Alignment::ByDate if kind == self.reference => selector::select(index, ordinal, kind),
            Alignment::ByDate => {
                let key = self.day_key(ordinal)?;
                // same grouping as the reference: match the whole key, else the date alone
                let pos = if index.key_fields() == self.reference_index().key_fields() {
                    index.position_of_key(key)
                } else {
                    index.position_of_date(key.date())
                };
                let pos = pos.ok_or_else(|| {
                    PanelError::date_mismatch(
                        kind.to_string(),
                        self.reference.to_string(),
                        format!("no cross-section for {key}"),
                    )
                })?;
                selector::select(index, pos as i64, kind)
            }
        }
    }

    /// [`Self::select`] for every configured method; failures stay per method.
    pub fn select_all(&self, ordinal: i64) -> Vec<(MethodKind, PanelResult<ResultTable>)> {
        self.panels
            .keys()
            .map(|&kind| (kind, self.select(ordinal, kind)))
            .collect()
    }
}
