//! Reference correction planner.
//!
//! Compares the line items read off a supplier invoice with the product lines
//! of the draft document and produces the edits that make the draft match.
//! Lines are paired by description (case and spacing ignored); a line whose
//! description changed therefore shows up as a delete plus a create, and the
//! create stays behind approval until someone confirms the extracted line.
//! Section and note lines are never touched.

use serde::{Deserialize, Serialize};

use crate::correction::CorrectionOperation;
use crate::document::{DocumentLine, LineChanges, LineDisplayType, NewLine};

/// Differences smaller than this are treated as rounding noise.
pub const AMOUNT_TOLERANCE: f64 = 0.005;

/// A line item as returned by the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedLine {
    pub description: String,
    pub quantity: f64,
    pub price_unit: f64,
    #[serde(default)]
    pub discount: f64,
    /// Set once a person has confirmed the line; unconfirmed lines are only
    /// ever proposed for creation behind approval.
    #[serde(default)]
    pub approved: bool,
}

impl ExtractedLine {
    fn to_new_line(&self) -> NewLine {
        NewLine {
            description: self.description.trim().to_string(),
            quantity: self.quantity,
            price_unit: self.price_unit,
            discount: self.discount,
            display_type: LineDisplayType::Product,
        }
    }
}

/// Plan the corrections turning `draft_lines` into `extracted`.
///
/// Emits updates for paired lines first (in extracted order), then deletes
/// for draft lines nobody claimed, then creates for unpaired extracted lines.
pub fn plan_corrections(
    extracted: &[ExtractedLine],
    draft_lines: &[DocumentLine],
) -> Vec<CorrectionOperation> {
    let mut unclaimed: Vec<&DocumentLine> = draft_lines
        .iter()
        .filter(|l| l.display_type == LineDisplayType::Product)
        .collect();

    let mut updates = Vec::new();
    let mut creates = Vec::new();

    for source in extracted {
        let key = description_key(&source.description);
        let paired = unclaimed
            .iter()
            .position(|line| description_key(&line.description) == key);

        match paired {
            Some(index) => {
                let line = unclaimed.remove(index);
                let changes = diff_amounts(source, line);
                if !changes.is_empty() {
                    updates.push(CorrectionOperation::Update {
                        line_id: line.id,
                        changes,
                    });
                }
            }
            None => creates.push(CorrectionOperation::Create {
                new_line: source.to_new_line(),
                requires_approval: !source.approved,
            }),
        }
    }

    let deletes = unclaimed
        .into_iter()
        .map(|line| CorrectionOperation::Delete { line_id: line.id });

    updates.into_iter().chain(deletes).chain(creates).collect()
}

fn description_key(description: &str) -> String {
    description
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn diff_amounts(source: &ExtractedLine, line: &DocumentLine) -> LineChanges {
    LineChanges {
        description: None,
        quantity: differs(source.quantity, line.quantity).then_some(source.quantity),
        price_unit: differs(source.price_unit, line.price_unit).then_some(source.price_unit),
        discount: differs(source.discount, line.discount).then_some(source.discount),
    }
}

fn differs(a: f64, b: f64) -> bool {
    (a - b).abs() >= AMOUNT_TOLERANCE
}
