//! Document store abstraction (the ERP's accounting documents).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use thiserror::Error;

use ledgerbridge_core::{DocumentId, LineId};

use crate::document::{DocumentLine, DocumentTotals, LineChanges, NewLine};

/// Failure reported by the document store for a single call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("line {0} not found")]
    LineNotFound(LineId),

    #[error("document {0} not found")]
    DocumentNotFound(DocumentId),

    /// The store refused the write (validation on its side).
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// Record-level access to accounting documents.
///
/// Every method is one round-trip to the system of record. Consistency
/// between concurrent callers (locking, serialization per document) is the
/// store's concern.
pub trait DocumentStore: Send + Sync {
    fn read_line(&self, line_id: LineId) -> Result<DocumentLine, StoreError>;
    fn write_line(&self, line_id: LineId, changes: &LineChanges) -> Result<(), StoreError>;
    fn delete_line(&self, line_id: LineId) -> Result<(), StoreError>;
    fn create_line(&self, document_id: DocumentId, data: &NewLine) -> Result<LineId, StoreError>;
    fn read_document_totals(&self, document_id: DocumentId) -> Result<DocumentTotals, StoreError>;
}

impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    fn read_line(&self, line_id: LineId) -> Result<DocumentLine, StoreError> {
        (**self).read_line(line_id)
    }

    fn write_line(&self, line_id: LineId, changes: &LineChanges) -> Result<(), StoreError> {
        (**self).write_line(line_id, changes)
    }

    fn delete_line(&self, line_id: LineId) -> Result<(), StoreError> {
        (**self).delete_line(line_id)
    }

    fn create_line(&self, document_id: DocumentId, data: &NewLine) -> Result<LineId, StoreError> {
        (**self).create_line(document_id, data)
    }

    fn read_document_totals(&self, document_id: DocumentId) -> Result<DocumentTotals, StoreError> {
        (**self).read_document_totals(document_id)
    }
}

#[derive(Debug)]
struct StoredDocument {
    /// Tax rate as a fraction (0.22 for 22%).
    tax_rate: f64,
    lines: BTreeMap<LineId, DocumentLine>,
}

#[derive(Debug, Default)]
struct State {
    documents: BTreeMap<DocumentId, StoredDocument>,
    line_owner: BTreeMap<LineId, DocumentId>,
    next_line_id: i64,
}

/// In-memory document store for tests/dev.
///
/// Validates writes the way the ERP does (finite amounts, non-negative
/// quantities, discount within `0..=100`) and recomputes totals from product
/// lines, rounded to cents. Can be switched offline to simulate an
/// unreachable ERP.
#[derive(Debug)]
pub struct InMemoryDocumentStore {
    inner: RwLock<State>,
    available: AtomicBool,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(State {
                next_line_id: 1,
                ..State::default()
            }),
            available: AtomicBool::new(true),
        }
    }

    /// Register an empty document with the given tax rate (fraction).
    pub fn add_document(&self, document_id: DocumentId, tax_rate: f64) -> Result<(), StoreError> {
        let mut state = self.write_state()?;
        state.documents.insert(
            document_id,
            StoredDocument {
                tax_rate,
                lines: BTreeMap::new(),
            },
        );
        Ok(())
    }

    /// Seed a line as-is, including section/note lines.
    pub fn seed_line(&self, document_id: DocumentId, data: &NewLine) -> Result<LineId, StoreError> {
        let mut state = self.write_state()?;
        insert_line(&mut state, document_id, data)
    }

    /// Current lines of a document, in creation order.
    pub fn lines(&self, document_id: DocumentId) -> Result<Vec<DocumentLine>, StoreError> {
        let state = self.read_state()?;
        let document = state
            .documents
            .get(&document_id)
            .ok_or(StoreError::DocumentNotFound(document_id))?;
        Ok(document.lines.values().cloned().collect())
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.ensure_available()?;
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StoreError> {
        self.ensure_available()?;
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

fn insert_line(
    state: &mut State,
    document_id: DocumentId,
    data: &NewLine,
) -> Result<LineId, StoreError> {
    validate_amounts(data.quantity, data.price_unit, data.discount)?;
    if data.description.trim().is_empty() {
        return Err(StoreError::Rejected("description cannot be empty".to_string()));
    }

    let line_id = LineId::new(state.next_line_id);
    let document = state
        .documents
        .get_mut(&document_id)
        .ok_or(StoreError::DocumentNotFound(document_id))?;
    document.lines.insert(
        line_id,
        DocumentLine {
            id: line_id,
            document_id,
            display_type: data.display_type,
            description: data.description.clone(),
            quantity: data.quantity,
            price_unit: data.price_unit,
            discount: data.discount,
        },
    );
    state.line_owner.insert(line_id, document_id);
    state.next_line_id += 1;
    Ok(line_id)
}

fn validate_amounts(quantity: f64, price_unit: f64, discount: f64) -> Result<(), StoreError> {
    if !(quantity.is_finite() && price_unit.is_finite() && discount.is_finite()) {
        return Err(StoreError::Rejected("amounts must be finite numbers".to_string()));
    }
    if quantity < 0.0 {
        return Err(StoreError::Rejected(format!("quantity cannot be negative ({quantity})")));
    }
    if !(0.0..=100.0).contains(&discount) {
        return Err(StoreError::Rejected(format!("discount must be within 0..=100 ({discount})")));
    }
    Ok(())
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

impl DocumentStore for InMemoryDocumentStore {
    fn read_line(&self, line_id: LineId) -> Result<DocumentLine, StoreError> {
        let state = self.read_state()?;
        state
            .line_owner
            .get(&line_id)
            .and_then(|doc| state.documents.get(doc))
            .and_then(|doc| doc.lines.get(&line_id))
            .cloned()
            .ok_or(StoreError::LineNotFound(line_id))
    }

    fn write_line(&self, line_id: LineId, changes: &LineChanges) -> Result<(), StoreError> {
        let mut state = self.write_state()?;
        let document_id = *state
            .line_owner
            .get(&line_id)
            .ok_or(StoreError::LineNotFound(line_id))?;
        let line = state
            .documents
            .get_mut(&document_id)
            .and_then(|doc| doc.lines.get_mut(&line_id))
            .ok_or(StoreError::LineNotFound(line_id))?;

        let updated = changes.applied_to(line);
        validate_amounts(updated.quantity, updated.price_unit, updated.discount)?;
        *line = updated;
        Ok(())
    }

    fn delete_line(&self, line_id: LineId) -> Result<(), StoreError> {
        let mut state = self.write_state()?;
        let document_id = state
            .line_owner
            .remove(&line_id)
            .ok_or(StoreError::LineNotFound(line_id))?;
        if let Some(document) = state.documents.get_mut(&document_id) {
            document.lines.remove(&line_id);
        }
        Ok(())
    }

    fn create_line(&self, document_id: DocumentId, data: &NewLine) -> Result<LineId, StoreError> {
        let mut state = self.write_state()?;
        insert_line(&mut state, document_id, data)
    }

    fn read_document_totals(&self, document_id: DocumentId) -> Result<DocumentTotals, StoreError> {
        let state = self.read_state()?;
        let document = state
            .documents
            .get(&document_id)
            .ok_or(StoreError::DocumentNotFound(document_id))?;

        let untaxed: f64 = document.lines.values().map(DocumentLine::subtotal).sum();
        let amount_untaxed = round_cents(untaxed);
        let amount_tax = round_cents(amount_untaxed * document.tax_rate);
        Ok(DocumentTotals {
            amount_untaxed,
            amount_tax,
            amount_total: round_cents(amount_untaxed + amount_tax),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::LineDisplayType;

    fn store_with_document() -> (InMemoryDocumentStore, DocumentId) {
        let store = InMemoryDocumentStore::new();
        let document_id = DocumentId::new(100);
        store.add_document(document_id, 0.22).unwrap();
        (store, document_id)
    }

    #[test]
    fn totals_follow_product_lines_only() {
        let (store, doc) = store_with_document();
        store.create_line(doc, &NewLine::product("Beans", 2.0, 10.0)).unwrap();
        store
            .seed_line(
                doc,
                &NewLine {
                    display_type: LineDisplayType::LineSection,
                    ..NewLine::product("Section", 1.0, 999.0)
                },
            )
            .unwrap();

        let totals = store.read_document_totals(doc).unwrap();
        assert_eq!(totals.amount_untaxed, 20.0);
        assert_eq!(totals.amount_tax, 4.4);
        assert_eq!(totals.amount_total, 24.4);
    }

    #[test]
    fn write_validates_merged_line() {
        let (store, doc) = store_with_document();
        let line_id = store.create_line(doc, &NewLine::product("Beans", 2.0, 10.0)).unwrap();

        let err = store
            .write_line(
                line_id,
                &LineChanges {
                    quantity: Some(-1.0),
                    ..LineChanges::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert_eq!(store.read_line(line_id).unwrap().quantity, 2.0);
    }

    #[test]
    fn delete_then_read_is_not_found() {
        let (store, doc) = store_with_document();
        let line_id = store.create_line(doc, &NewLine::product("Beans", 2.0, 10.0)).unwrap();
        store.delete_line(line_id).unwrap();
        assert_eq!(store.read_line(line_id).unwrap_err(), StoreError::LineNotFound(line_id));
        assert_eq!(store.delete_line(line_id).unwrap_err(), StoreError::LineNotFound(line_id));
        assert!(store.lines(doc).unwrap().is_empty());
    }

    #[test]
    fn create_on_unknown_document_fails() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .create_line(DocumentId::new(5), &NewLine::product("Beans", 1.0, 1.0))
            .unwrap_err();
        assert_eq!(err, StoreError::DocumentNotFound(DocumentId::new(5)));
    }

    #[test]
    fn offline_store_reports_unavailable() {
        let (store, doc) = store_with_document();
        store.set_available(false);
        assert!(matches!(
            store.read_document_totals(doc).unwrap_err(),
            StoreError::Unavailable(_)
        ));
        store.set_available(true);
        assert!(store.read_document_totals(doc).is_ok());
    }

    #[test]
    fn poisoned_store_refuses_new_documents() {
        let store = InMemoryDocumentStore::new();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.inner.write().unwrap();
            panic!("writer died holding the lock");
        }));

        let err = store.add_document(DocumentId::new(7), 0.22).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(store.lines(DocumentId::new(7)).is_err());
    }
}
