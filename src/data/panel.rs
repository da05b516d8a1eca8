use std::collections::BTreeMap;

use super::error::{PanelError, PanelResult};
use super::model::{CellValue, ResultTable};

// ---------------------------------------------------------------------------
// GroupKey – the date (or date + expiry) values of one cross-section
// ---------------------------------------------------------------------------

/// Key values of one group, in key-field order. Ordered lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupKey(pub Vec<CellValue>);

impl GroupKey {
    /// Leading key value, i.e. the trading date.
    pub fn date(&self) -> &CellValue {
        &self.0[0]
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", parts.join(" / "))
    }
}

// ---------------------------------------------------------------------------
// PanelIndex – one method's cross-sections in ascending key order
// ---------------------------------------------------------------------------

/// Cross-sections of a result table, addressable by 0-based day ordinal.
#[derive(Debug, Clone)]
pub struct PanelIndex {
    key_fields: Vec<String>,
    groups: Vec<(GroupKey, ResultTable)>,
}

impl PanelIndex {
    /// Partition `table` into groups sharing identical `key_fields` values.
    ///
    /// Groups come out in ascending key order; each keeps every column and the
    /// original row order.
    pub fn build(table: &ResultTable, key_fields: &[&str]) -> PanelResult<Self> {
        if table.is_empty() {
            return Err(PanelError::EmptyInput {
                table: table.name.clone(),
            });
        }

        let key_columns = key_fields
            .iter()
            .map(|field| {
                table.column(field).ok_or_else(|| PanelError::MissingField {
                    table: table.name.clone(),
                    field: field.to_string(),
                })
            })
            .collect::<PanelResult<Vec<_>>>()?;
        if key_columns.is_empty() {
            return Err(PanelError::MissingField {
                table: table.name.clone(),
                field: String::new(),
            });
        }

        let mut rows_by_key: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
        for row in 0..table.len() {
            let key = GroupKey(key_columns.iter().map(|c| c.values[row].clone()).collect());
            rows_by_key.entry(key).or_default().push(row);
        }

        let groups: Vec<(GroupKey, ResultTable)> = rows_by_key
            .into_iter()
            .map(|(key, rows)| {
                let sub = table.take(&rows);
                (key, sub)
            })
            .collect();

        log::debug!(
            "{}: {} rows grouped by {:?} into {} cross-sections",
            table.name,
            table.len(),
            key_fields,
            groups.len()
        );

        Ok(Self {
            key_fields: key_fields.iter().map(|f| f.to_string()).collect(),
            groups,
        })
    }

    /// Number of selectable days.
    pub fn count(&self) -> usize {
        self.groups.len()
    }

    /// Inclusive upper bound of the day slider.
    pub fn max_ordinal(&self) -> usize {
        self.count().saturating_sub(1)
    }

    /// Field names the groups are keyed on.
    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    /// Validate `ordinal` against `[0, count)` and convert it to a position.
    pub fn check_ordinal(&self, ordinal: i64) -> PanelResult<usize> {
        usize::try_from(ordinal)
            .ok()
            .filter(|&pos| pos < self.count())
            .ok_or(PanelError::OutOfRange {
                ordinal,
                count: self.count(),
            })
    }

    /// Key and sub-table at `ordinal`.
    pub fn get(&self, ordinal: i64) -> PanelResult<(&GroupKey, &ResultTable)> {
        let pos = self.check_ordinal(ordinal)?;
        let (key, table) = &self.groups[pos];
        Ok((key, table))
    }

    pub fn key(&self, ordinal: i64) -> PanelResult<&GroupKey> {
        self.get(ordinal).map(|(key, _)| key)
    }

    /// Leading key of every group, in ordinal order.
    pub fn dates(&self) -> Vec<&CellValue> {
        self.iter().map(|(key, _)| key.date()).collect()
    }

    /// Position of the first group whose date equals `date`.
    ///
    /// With two key fields that is the earliest expiry on that date.
    /// Position of the group keyed exactly by `key`.
    pub fn position_of_key(&self, key: &GroupKey) -> Option<usize> {
        self.groups.binary_search_by(|(k, _)| k.cmp(key)).ok()
    }

    pub fn position_of_date(&self, date: &CellValue) -> Option<usize> {
        self.groups.iter().position(|(key, _)| key.date() == date)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(GroupKey, ResultTable)> {
        self.groups.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn table(dates: &[i64], expiries: Option<&[i64]>, kf: &[f64]) -> ResultTable {
        let mut columns = vec![
            Column::new("date", dates.iter().map(|&d| CellValue::Integer(d)).collect()),
            Column::new("K/F", kf.iter().map(|&x| CellValue::Float(x)).collect()),
        ];
        if let Some(ex) = expiries {
            columns.push(Column::new(
                "exdate",
                ex.iter().map(|&d| CellValue::Integer(d)).collect(),
            ));
        }
        ResultTable::new("test", columns).unwrap()
    }

    #[test]
    fn test_groups_by_single_key_in_ascending_order() {
        let t = table(&[2, 1, 2, 1], None, &[1.0, 0.9, 1.1, 0.8]);
        let idx = PanelIndex::build(&t, &["date"]).unwrap();

        assert_eq!(idx.count(), 2);
        assert_eq!(idx.max_ordinal(), 1);
        assert_eq!(idx.key(0).unwrap(), &GroupKey(vec![CellValue::Integer(1)]));

        // original row order is kept within a group
        let (_, day2) = idx.get(1).unwrap();
        assert_eq!(day2.column("K/F").unwrap().to_f64(), vec![1.0, 1.1]);
        assert_eq!(day2.column_names(), vec!["date", "K/F"]);
    }

    #[test]
    fn test_groups_by_date_and_expiry_lexicographically() {
        let t = table(
            &[1, 1, 2, 1],
            Some(&[20, 10, 10, 10]),
            &[1.0, 0.9, 1.1, 0.8],
        );
        let idx = PanelIndex::build(&t, &["date", "exdate"]).unwrap();

        let keys: Vec<String> = idx.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["1 / 10", "1 / 20", "2 / 10"]);
        assert_eq!(idx.get(0).unwrap().1.len(), 2);
        assert_eq!(idx.position_of_date(&CellValue::Integer(1)), Some(0));
        assert_eq!(idx.position_of_date(&CellValue::Integer(2)), Some(2));
        assert_eq!(idx.position_of_date(&CellValue::Integer(3)), None);

        let second = GroupKey(vec![CellValue::Integer(1), CellValue::Integer(20)]);
        assert_eq!(idx.position_of_key(&second), Some(1));
        assert_eq!(idx.position_of_key(&GroupKey(vec![CellValue::Integer(1)])), None);
    }

    #[test]
    fn test_empty_table_fails() {
        let t = table(&[], None, &[]);
        let err = PanelIndex::build(&t, &["date"]).unwrap_err();
        assert_eq!(err, PanelError::EmptyInput { table: "test".into() });
    }

    #[test]
    fn test_missing_key_field_fails() {
        let t = table(&[1, 2], None, &[1.0, 1.0]);
        let err = PanelIndex::build(&t, &["trade_date"]).unwrap_err();
        assert!(matches!(err, PanelError::MissingField { field, .. } if field == "trade_date"));

        let err = PanelIndex::build(&t, &["date", "exdate"]).unwrap_err();
        assert!(matches!(err, PanelError::MissingField { field, .. } if field == "exdate"));

        // no key at all cannot partition anything
        let err = PanelIndex::build(&t, &[]).unwrap_err();
        assert!(matches!(err, PanelError::MissingField { field, .. } if field.is_empty()));
    }

    #[test]
    fn test_ordinal_bounds() {
        let t = table(&[1, 2, 3], None, &[1.0, 1.0, 1.0]);
        let idx = PanelIndex::build(&t, &["date"]).unwrap();

        assert!(idx.get(0).is_ok());
        assert!(idx.get(2).is_ok());
        assert_eq!(
            idx.get(3).unwrap_err(),
            PanelError::OutOfRange { ordinal: 3, count: 3 }
        );
        assert_eq!(
            idx.get(-1).unwrap_err(),
            PanelError::OutOfRange { ordinal: -1, count: 3 }
        );
    }
}
