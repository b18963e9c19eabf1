//! Reconciliation engine: applies a correction plan to a draft document.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ledgerbridge_core::{DocumentId, LineId};

use crate::correction::CorrectionOperation;
use crate::document::{DocumentLine, DocumentTotals, LineChanges, LineDisplayType, NewLine};
use crate::store::{DocumentStore, StoreError};

/// Report of one batch.
///
/// Operations counted here are already durably applied; a non-empty `errors`
/// list only describes the operations that did not land.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub updated_count: usize,
    pub deleted_count: usize,
    pub created_count: usize,
    /// `Create` operations held back because they still need approval.
    pub skipped_for_approval: usize,
    pub created_line_ids: Vec<LineId>,
    /// Totals re-read from the store after the batch.
    pub new_total: DocumentTotals,
    pub errors: Vec<String>,
}

impl ReconciliationResult {
    pub fn applied_count(&self) -> usize {
        self.updated_count + self.deleted_count + self.created_count
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Whole-batch failure. When returned, no totals verification happened and
/// the caller should not trust any partial outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("could not verify totals of document {document_id}: {source}")]
    Verification {
        document_id: DocumentId,
        source: StoreError,
    },
}

#[derive(Debug, Error)]
enum OperationError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("line {line_id} belongs to document {owner}")]
    ForeignLine { line_id: LineId, owner: DocumentId },
}

enum Applied {
    Updated,
    Deleted,
    Created(LineId),
    AwaitingApproval,
}

/// Applies correction batches through a [`DocumentStore`].
///
/// Stateless between batches. Operations run sequentially in the order given,
/// one store round-trip at a time, so later operations observe the effects of
/// earlier ones.
#[derive(Debug, Clone)]
pub struct ReconciliationEngine<S> {
    store: S,
}

impl<S: DocumentStore> ReconciliationEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply `operations` to `document_id`, then re-read the document totals.
    ///
    /// A failing operation is recorded in `errors` and never stops the batch.
    /// Only a failure to read the totals afterwards fails the whole call.
    pub fn apply_corrections(
        &self,
        document_id: DocumentId,
        operations: &[CorrectionOperation],
    ) -> Result<ReconciliationResult, ReconcileError> {
        tracing::info!(
            document_id = %document_id,
            operations = operations.len(),
            "applying corrections"
        );

        let mut result = ReconciliationResult::default();
        for (index, operation) in operations.iter().enumerate() {
            match self.apply_one(document_id, operation) {
                Ok(Applied::Updated) => result.updated_count += 1,
                Ok(Applied::Deleted) => result.deleted_count += 1,
                Ok(Applied::Created(line_id)) => {
                    result.created_count += 1;
                    result.created_line_ids.push(line_id);
                }
                Ok(Applied::AwaitingApproval) => {
                    tracing::debug!(index, "create skipped: approval required");
                    result.skipped_for_approval += 1;
                }
                Err(err) => {
                    let message = format!("{}: {}", operation.describe(), err);
                    tracing::warn!(document_id = %document_id, index, "{message}");
                    result.errors.push(message);
                }
            }
        }

        result.new_total = self
            .store
            .read_document_totals(document_id)
            .map_err(|source| ReconcileError::Verification {
                document_id,
                source,
            })?;

        tracing::info!(
            document_id = %document_id,
            updated = result.updated_count,
            deleted = result.deleted_count,
            created = result.created_count,
            skipped = result.skipped_for_approval,
            errors = result.errors.len(),
            amount_total = result.new_total.amount_total,
            "corrections applied"
        );
        Ok(result)
    }

    fn apply_one(
        &self,
        document_id: DocumentId,
        operation: &CorrectionOperation,
    ) -> Result<Applied, OperationError> {
        match operation {
            CorrectionOperation::Update { line_id, changes } => {
                self.update_line(document_id, *line_id, changes)?;
                Ok(Applied::Updated)
            }
            CorrectionOperation::Delete { line_id } => {
                self.owned_line(document_id, *line_id)?;
                self.store.delete_line(*line_id)?;
                Ok(Applied::Deleted)
            }
            CorrectionOperation::Create {
                requires_approval: true,
                ..
            } => Ok(Applied::AwaitingApproval),
            CorrectionOperation::Create {
                new_line,
                requires_approval: false,
            } => {
                // Created lines are always plain product lines, never layout markers.
                let safeguarded = NewLine {
                    display_type: LineDisplayType::Product,
                    ..new_line.clone()
                };
                let line_id = self.store.create_line(document_id, &safeguarded)?;
                Ok(Applied::Created(line_id))
            }
        }
    }

    fn update_line(
        &self,
        document_id: DocumentId,
        line_id: LineId,
        changes: &LineChanges,
    ) -> Result<(), OperationError> {
        self.owned_line(document_id, line_id)?;
        self.store.write_line(line_id, changes)?;
        Ok(())
    }

    fn owned_line(
        &self,
        document_id: DocumentId,
        line_id: LineId,
    ) -> Result<DocumentLine, OperationError> {
        let line = self.store.read_line(line_id)?;
        if line.document_id != document_id {
            return Err(OperationError::ForeignLine {
                line_id,
                owner: line.document_id,
            });
        }
        Ok(line)
    }
}
