use serde::{Deserialize, Serialize};

use ledgerbridge_core::LineId;

use crate::document::{LineChanges, NewLine};

/// One edit of a correction plan, applied against a draft document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CorrectionOperation {
    Update {
        line_id: LineId,
        changes: LineChanges,
    },
    Delete {
        line_id: LineId,
    },
    /// A line found on the supplier invoice but missing from the draft.
    /// Skipped entirely while `requires_approval` is set.
    Create {
        new_line: NewLine,
        requires_approval: bool,
    },
}

impl CorrectionOperation {
    /// Short label used to prefix per-operation error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Update { line_id, .. } => format!("update line {line_id}"),
            Self::Delete { line_id } => format!("delete line {line_id}"),
            Self::Create { new_line, .. } => format!("create line {:?}", new_line.description),
        }
    }
}
