use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{PanelError, PanelResult};
use super::model::{ResultTable, DATE, EXPIRY, MONEYNESS};
use super::panel::PanelIndex;

/// Columns kept for observed market quotes and other diagnostics.
pub const RAW_COLUMNS: [&str; 5] = [MONEYNESS, "strike_price", "forward_price", "callprice", "iv_raw"];

/// Columns kept for fitted quantile/expectile curves.
pub const FITTED_COLUMNS: [&str; 9] = [
    MONEYNESS, "strike", "forward", "prices", "vols", "QAlpha", "QPDF", "EAlpha", "EPDF",
];

// ---------------------------------------------------------------------------
// MethodKind – closed set of datasets the viewer knows about
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MethodKind {
    /// Primary estimation method (BIRS).
    Birs,
    /// Jackwerth (2004) benchmark.
    Jackwerth,
    /// Bondarenko (2003) benchmark.
    Bondarenko,
    /// Option quotes that survived the data filter.
    FilteredQuotes,
    /// Quotes flagged for arbitrage violations.
    ArbViolations,
}

/// Which column set a method's cross-sections are projected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Raw,
    Fitted,
}

impl Projection {
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Projection::Raw => &RAW_COLUMNS,
            Projection::Fitted => &FITTED_COLUMNS,
        }
    }
}

impl MethodKind {
    pub const ALL: [MethodKind; 5] = [
        MethodKind::Birs,
        MethodKind::Jackwerth,
        MethodKind::Bondarenko,
        MethodKind::FilteredQuotes,
        MethodKind::ArbViolations,
    ];

    /// Methods drawn as fitted curves, in display order.
    pub const FITTED: [MethodKind; 3] = [
        MethodKind::Birs,
        MethodKind::Jackwerth,
        MethodKind::Bondarenko,
    ];

    pub fn projection(self) -> Projection {
        match self {
            MethodKind::Birs | MethodKind::Jackwerth | MethodKind::Bondarenko => {
                Projection::Fitted
            }
            MethodKind::FilteredQuotes | MethodKind::ArbViolations => Projection::Raw,
        }
    }

    /// Grouping key: the primary method has one cross-section per date, the
    /// others one per (date, expiry).
    pub fn key_fields(self) -> &'static [&'static str] {
        match self {
            MethodKind::Birs => &[DATE],
            _ => &[DATE, EXPIRY],
        }
    }

    /// Identifier used in configuration files.
    pub fn id(self) -> &'static str {
        match self {
            MethodKind::Birs => "birs",
            MethodKind::Jackwerth => "jackwerth",
            MethodKind::Bondarenko => "bondarenko",
            MethodKind::FilteredQuotes => "lcs",
            MethodKind::ArbViolations => "arbViolations",
        }
    }

    /// Human readable name for panel headings.
    pub fn label(self) -> &'static str {
        match self {
            MethodKind::Birs => "Our approach (BIRS)",
            MethodKind::Jackwerth => "Jackwerth (2004)",
            MethodKind::Bondarenko => "Bondarenko (2003)",
            MethodKind::FilteredQuotes => "Observed market prices",
            MethodKind::ArbViolations => "Arbitrage violations",
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for MethodKind {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MethodKind::ALL
            .into_iter()
            .find(|k| k.id() == s)
            .ok_or_else(|| PanelError::UnknownMethodKind(s.to_string()))
    }
}

impl TryFrom<String> for MethodKind {
    type Error = PanelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MethodKind> for String {
    fn from(kind: MethodKind) -> Self {
        kind.id().to_string()
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The cross-section at `ordinal`, projected for `kind` and sorted by moneyness.
pub fn select(index: &PanelIndex, ordinal: i64, kind: MethodKind) -> PanelResult<ResultTable> {
    let (key, group) = index.get(ordinal)?;
    log::debug!("{kind}: day {ordinal} -> {key} ({} rows)", group.len());
    project_sorted(group, kind)
}

/// Projection and stable moneyness sort of a single cross-section.
pub fn project_sorted(group: &ResultTable, kind: MethodKind) -> PanelResult<ResultTable> {
    let projected = group.project(kind.projection().columns())?;

    let moneyness = projected.require_column(MONEYNESS)?.to_f64();

    // `sort_by` is stable, so equal moneyness keeps the original row order.
    let mut order: Vec<usize> = (0..projected.len()).collect();
    order.sort_by(|&a, &b| moneyness[a].total_cmp(&moneyness[b]));

    Ok(projected.take(&order))
}

/// Moneyness paired with another numeric column, for plotting.
pub fn xy(table: &ResultTable, y_column: &str) -> PanelResult<Vec<[f64; 2]>> {
    let x = table.require_column(MONEYNESS)?;
    let y = table.require_column(y_column)?;
    Ok(x
        .values
        .iter()
        .zip(&y.values)
        .filter_map(|(xv, yv)| Some([xv.as_f64()?, yv.as_f64()?]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Column};

    fn floats(v: &[f64]) -> Vec<CellValue> {
        v.iter().map(|&x| CellValue::Float(x)).collect()
    }

    /// Quote table with every raw column plus a date key.
    fn raw_table(dates: &[i64], kf: &[f64], price: &[f64]) -> ResultTable {
        let n = dates.len();
        ResultTable::new(
            "quotes",
            vec![
                Column::new("date", dates.iter().map(|&d| CellValue::Integer(d)).collect()),
                Column::new("K/F", floats(kf)),
                Column::new("strike_price", floats(&vec![100.0; n])),
                Column::new("forward_price", floats(&vec![100.0; n])),
                Column::new("callprice", floats(price)),
                Column::new("iv_raw", floats(&vec![0.2; n])),
                Column::new("volume", floats(&vec![5.0; n])),
            ],
        )
        .unwrap()
    }

    fn fitted_table(kf: &[f64]) -> ResultTable {
        let n = kf.len();
        let mut columns = vec![
            Column::new("date", vec![CellValue::Date("2020-01-06".into()); n]),
            Column::new("exdate", vec![CellValue::Date("2020-01-10".into()); n]),
        ];
        for name in FITTED_COLUMNS {
            let values = if name == MONEYNESS {
                floats(kf)
            } else {
                floats(&vec![0.5; n])
            };
            columns.push(Column::new(name, values));
        }
        columns.push(Column::new("extra", floats(&vec![1.0; n])));
        ResultTable::new("fitted", columns).unwrap()
    }

    fn pairs(table: &ResultTable, price: &str) -> Vec<(f64, f64)> {
        xy(table, price)
            .unwrap()
            .into_iter()
            .map(|[x, y]| (x, y))
            .collect()
    }

    #[test]
    fn test_three_row_scenario() {
        let t = raw_table(&[1, 1, 2], &[1.05, 0.95, 1.0], &[10.0, 25.0, 15.0]);
        let idx = PanelIndex::build(&t, &["date"]).unwrap();
        assert_eq!(idx.count(), 2);

        let sel = select(&idx, 0, MethodKind::FilteredQuotes).unwrap();
        assert_eq!(pairs(&sel, "callprice"), vec![(0.95, 25.0), (1.05, 10.0)]);
    }

    #[test]
    fn test_moneyness_non_decreasing_for_every_day() {
        let t = raw_table(
            &[1, 1, 1, 2, 2, 3],
            &[1.1, 0.8, 0.95, 1.2, 0.7, 1.0],
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        );
        let idx = PanelIndex::build(&t, &["date"]).unwrap();
        for ordinal in 0..idx.count() as i64 {
            let sel = select(&idx, ordinal, MethodKind::ArbViolations).unwrap();
            assert!(!sel.is_empty());
            let kf = sel.column(MONEYNESS).unwrap().to_f64();
            assert!(kf.windows(2).all(|w| w[0] <= w[1]), "day {ordinal}: {kf:?}");
        }
    }

    #[test]
    fn test_ties_keep_original_order() {
        let t = raw_table(&[1, 1, 1], &[1.0, 0.9, 1.0], &[7.0, 8.0, 9.0]);
        let idx = PanelIndex::build(&t, &["date"]).unwrap();
        let sel = select(&idx, 0, MethodKind::FilteredQuotes).unwrap();
        assert_eq!(pairs(&sel, "callprice"), vec![(0.9, 8.0), (1.0, 7.0), (1.0, 9.0)]);
    }

    #[test]
    fn test_rows_preserved_and_idempotent() {
        let t = raw_table(
            &[3, 3, 3, 3],
            &[1.0, 0.9, 1.0, 1.1],
            &[5.0, 6.0, 5.0, 4.0],
        );
        let idx = PanelIndex::build(&t, &["date"]).unwrap();

        let first = select(&idx, 0, MethodKind::FilteredQuotes).unwrap();
        let second = select(&idx, 0, MethodKind::FilteredQuotes).unwrap();
        assert_eq!(first, second);

        let sort = |mut v: Vec<(f64, f64)>| {
            v.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
            v
        };
        let (_, group) = idx.get(0).unwrap();
        assert_eq!(
            sort(pairs(&first, "callprice")),
            sort(pairs(group, "callprice"))
        );
    }

    #[test]
    fn test_boundaries() {
        let t = raw_table(&[1, 2, 3], &[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0]);
        let idx = PanelIndex::build(&t, &["date"]).unwrap();
        let count = idx.count() as i64;

        assert!(select(&idx, 0, MethodKind::FilteredQuotes).is_ok());
        assert!(select(&idx, count - 1, MethodKind::FilteredQuotes).is_ok());
        for bad in [count, -1] {
            assert!(matches!(
                select(&idx, bad, MethodKind::FilteredQuotes),
                Err(PanelError::OutOfRange { .. })
            ));
        }
    }

    #[test]
    fn test_column_sets() {
        let raw = raw_table(&[1], &[1.0], &[1.0]);
        let idx = PanelIndex::build(&raw, &["date"]).unwrap();
        let sel = select(&idx, 0, MethodKind::FilteredQuotes).unwrap();
        assert_eq!(sel.column_names(), RAW_COLUMNS.to_vec());

        let fitted = fitted_table(&[1.1, 0.9]);
        let idx = PanelIndex::build(&fitted, MethodKind::Jackwerth.key_fields()).unwrap();
        for kind in MethodKind::FITTED {
            let sel = select(&idx, 0, kind).unwrap();
            assert_eq!(sel.column_names(), FITTED_COLUMNS.to_vec());
        }
    }

    #[test]
    fn test_schema_mismatch_reports_missing_column() {
        let raw = raw_table(&[1], &[1.0], &[1.0]);
        let idx = PanelIndex::build(&raw, &["date"]).unwrap();
        let err = select(&idx, 0, MethodKind::Birs).unwrap_err();
        assert!(matches!(err, PanelError::MissingColumn { column, .. } if column == "strike"));
    }

    #[test]
    fn test_method_kind_parsing() {
        for kind in MethodKind::ALL {
            assert_eq!(kind.id().parse::<MethodKind>().unwrap(), kind);
        }
        assert_eq!(
            "birs_v2".parse::<MethodKind>().unwrap_err(),
            PanelError::UnknownMethodKind("birs_v2".into())
        );
        let kind: MethodKind = serde_json::from_str("\"bondarenko\"").unwrap();
        assert_eq!(kind, MethodKind::Bondarenko);
        assert!(serde_json::from_str::<MethodKind>("\"lcs_birs\"").is_err());
    }

    #[test]
    fn test_projection_policy() {
        assert_eq!(MethodKind::Birs.projection(), Projection::Fitted);
        assert_eq!(MethodKind::FilteredQuotes.projection(), Projection::Raw);
        assert_eq!(MethodKind::ArbViolations.projection(), Projection::Raw);
        assert_eq!(MethodKind::Birs.key_fields(), &["date"]);
        assert_eq!(MethodKind::Bondarenko.key_fields(), &["date", "exdate"]);
    }
}
