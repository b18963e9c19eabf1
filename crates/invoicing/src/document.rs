use serde::{Deserialize, Serialize};

use ledgerbridge_core::{DocumentId, Entity, LineId};

/// Kind of a document line.
///
/// Only `Product` lines carry amounts; sections and notes are layout markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineDisplayType {
    #[default]
    Product,
    LineSection,
    LineNote,
}

/// A line of a draft accounting document, as read from the ERP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLine {
    pub id: LineId,
    pub document_id: DocumentId,
    pub display_type: LineDisplayType,
    pub description: String,
    pub quantity: f64,
    pub price_unit: f64,
    /// Percentage discount, `0..=100`.
    pub discount: f64,
}

impl DocumentLine {
    /// Untaxed amount of the line; zero for sections and notes.
    pub fn subtotal(&self) -> f64 {
        match self.display_type {
            LineDisplayType::Product => {
                self.quantity * self.price_unit * (1.0 - self.discount / 100.0)
            }
            LineDisplayType::LineSection | LineDisplayType::LineNote => 0.0,
        }
    }
}

impl Entity for DocumentLine {
    type Id = LineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Partial write onto an existing line. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_unit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
}

impl LineChanges {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.quantity.is_none()
            && self.price_unit.is_none()
            && self.discount.is_none()
    }

    /// The line as it would look after this write.
    pub fn applied_to(&self, line: &DocumentLine) -> DocumentLine {
        DocumentLine {
            description: self
                .description
                .clone()
                .unwrap_or_else(|| line.description.clone()),
            quantity: self.quantity.unwrap_or(line.quantity),
            price_unit: self.price_unit.unwrap_or(line.price_unit),
            discount: self.discount.unwrap_or(line.discount),
            ..line.clone()
        }
    }
}

/// Data for a line to be created on a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLine {
    pub description: String,
    pub quantity: f64,
    pub price_unit: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub display_type: LineDisplayType,
}

impl NewLine {
    pub fn product(description: impl Into<String>, quantity: f64, price_unit: f64) -> Self {
        Self {
            description: description.into(),
            quantity,
            price_unit,
            discount: 0.0,
            display_type: LineDisplayType::Product,
        }
    }
}

/// Total fields of a document, as computed by the ERP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub amount_untaxed: f64,
    pub amount_tax: f64,
    pub amount_total: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(display_type: LineDisplayType) -> DocumentLine {
        DocumentLine {
            id: LineId::new(1),
            document_id: DocumentId::new(1),
            display_type,
            description: "Espresso beans 1kg".to_string(),
            quantity: 4.0,
            price_unit: 12.5,
            discount: 10.0,
        }
    }

    #[test]
    fn subtotal_applies_discount_and_ignores_sections() {
        assert!((line(LineDisplayType::Product).subtotal() - 45.0).abs() < 1e-9);
        assert_eq!(line(LineDisplayType::LineSection).subtotal(), 0.0);
        assert_eq!(line(LineDisplayType::LineNote).subtotal(), 0.0);
    }

    #[test]
    fn changes_only_touch_set_fields() {
        let original = line(LineDisplayType::Product);
        let changes = LineChanges {
            price_unit: Some(13.0),
            ..LineChanges::default()
        };
        assert!(!changes.is_empty());

        let updated = changes.applied_to(&original);
        assert_eq!(updated.price_unit, 13.0);
        assert_eq!(updated.quantity, original.quantity);
        assert_eq!(updated.description, original.description);
        assert_eq!(updated.id, original.id);
    }

    #[test]
    fn new_line_defaults_to_product() {
        let parsed: NewLine =
            serde_json::from_str(r#"{"description":"Sugar","quantity":1,"price_unit":2.5}"#)
                .unwrap();
        assert_eq!(parsed, NewLine::product("Sugar", 1.0, 2.5));
    }
}
