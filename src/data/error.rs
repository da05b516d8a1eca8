//! Contract violations raised while indexing and selecting cross-sections.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PanelError {
    #[error("{table}: table has no rows")]
    EmptyInput { table: String },

    #[error("{table}: key field '{field}' not found")]
    MissingField { table: String, field: String },

    #[error("{table}: column '{column}' not found")]
    MissingColumn { table: String, column: String },

    #[error("day {ordinal} is out of range (0..{count})")]
    OutOfRange { ordinal: i64, count: usize },

    #[error("unknown method kind '{0}'")]
    UnknownMethodKind(String),

    #[error("{table}: dates do not line up with '{reference}': {detail}")]
    DateSetMismatch {
        table: String,
        reference: String,
        detail: String,
    },

    #[error("{method}: dataset unavailable: {reason}")]
    Unavailable { method: String, reason: String },
}

pub type PanelResult<T> = Result<T, PanelError>;

impl PanelError {
    pub fn date_mismatch(
        table: impl Into<String>,
        reference: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::DateSetMismatch {
            table: table.into(),
            reference: reference.into(),
            detail: detail.into(),
        }
    }
}
