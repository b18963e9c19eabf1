//! Invoicing domain module: reconciliation of draft supplier bills.
//!
//! Applies line-level corrections (derived from AI-extracted invoice data) to a
//! draft accounting document held by the ERP, one operation at a time, and
//! re-reads the document totals afterwards so callers can verify the outcome.

pub mod correction;
pub mod document;
pub mod engine;
pub mod planner;
pub mod store;

pub use correction::CorrectionOperation;
pub use document::{DocumentLine, DocumentTotals, LineChanges, LineDisplayType, NewLine};
pub use engine::{ReconcileError, ReconciliationEngine, ReconciliationResult};
pub use planner::{ExtractedLine, plan_corrections};
pub use store::{DocumentStore, InMemoryDocumentStore, StoreError};
