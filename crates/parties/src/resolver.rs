//! Supplier resolution: from an extracted name/VAT pair to a partner record.

use serde::{Deserialize, Serialize};

use ledgerbridge_core::PartnerId;

use crate::config::ResolverConfig;
use crate::matcher::{MatchCandidate, score_partner};
use crate::normalize::{normalize_name, normalize_vat};
use crate::partner::{PartnerRecord, PartnerRegistry, RegistryError};

/// Minimum name score that counts as resolved.
pub const CONFIDENT_MATCH_THRESHOLD: f64 = 0.8;

/// Outcome of resolving one supplier.
///
/// Ambiguity is data, not an error: callers must decide what to show an
/// operator for each state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ResolutionVerdict {
    /// The VAT number identifies exactly one partner.
    ExactVatMatch { partner_id: PartnerId },
    /// No VAT hit, but exactly one partner holds the top name score (>= 0.8).
    ConfidentNameMatch { partner_id: PartnerId, score: f64 },
    /// Several partners share the VAT number or the top name score.
    AmbiguousMatch { candidate_ids: Vec<PartnerId> },
    /// Nothing scored >= 0.8. `weak_candidates` holds partners in the weak
    /// band, best first, as hints for manual entry.
    NoMatch { weak_candidates: Vec<MatchCandidate> },
}

impl ResolutionVerdict {
    /// The resolved partner, if the verdict is a confident one.
    pub fn partner_id(&self) -> Option<PartnerId> {
        match self {
            Self::ExactVatMatch { partner_id } | Self::ConfidentNameMatch { partner_id, .. } => {
                Some(*partner_id)
            }
            Self::AmbiguousMatch { .. } | Self::NoMatch { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.partner_id().is_some()
    }
}

/// Resolve with the default [`ResolverConfig`].
pub fn resolve_supplier(
    candidate_name: &str,
    candidate_vat: &str,
    partners: &[PartnerRecord],
) -> ResolutionVerdict {
    resolve_supplier_with(candidate_name, candidate_vat, partners, &ResolverConfig::default())
}

/// Resolve an extracted supplier against a registry snapshot.
///
/// The VAT tier is checked first and short-circuits name matching. Never
/// fails: malformed input normalizes to empty and simply does not match.
pub fn resolve_supplier_with(
    candidate_name: &str,
    candidate_vat: &str,
    partners: &[PartnerRecord],
    config: &ResolverConfig,
) -> ResolutionVerdict {
    let vat = normalize_vat(candidate_vat);
    if !vat.is_empty() {
        let mut hits: Vec<PartnerId> = partners
            .iter()
            .filter(|p| p.normalized_vat() == vat)
            .map(|p| p.id)
            .collect();
        hits.sort();
        hits.dedup();

        match hits.as_slice() {
            [] => {}
            [partner_id] => {
                tracing::debug!(%vat, partner_id = %partner_id, "supplier resolved by VAT");
                return ResolutionVerdict::ExactVatMatch {
                    partner_id: *partner_id,
                };
            }
            _ => {
                tracing::warn!(
                    %vat,
                    collisions = hits.len(),
                    "VAT number shared by several partners"
                );
                return ResolutionVerdict::AmbiguousMatch { candidate_ids: hits };
            }
        }
    }

    let name = normalize_name(candidate_name);
    let mut candidates: Vec<MatchCandidate> = partners
        .iter()
        .map(|p| score_partner(&name, p))
        .filter(|c| c.score > 0.0)
        .collect();
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.partner_id.cmp(&b.partner_id))
    });

    let top_score = candidates.first().map(|c| c.score).unwrap_or(0.0);
    if top_score >= CONFIDENT_MATCH_THRESHOLD {
        let mut tied: Vec<PartnerId> = candidates
            .iter()
            .take_while(|c| c.score == top_score)
            .map(|c| c.partner_id)
            .collect();
        tied.dedup();

        if let [partner_id] = tied.as_slice() {
            tracing::debug!(
                %name,
                partner_id = %partner_id,
                score = top_score,
                "supplier resolved by name"
            );
            return ResolutionVerdict::ConfidentNameMatch {
                partner_id: *partner_id,
                score: top_score,
            };
        }
        tracing::warn!(
            %name,
            tied = tied.len(),
            score = top_score,
            "supplier name matches several partners"
        );
        return ResolutionVerdict::AmbiguousMatch { candidate_ids: tied };
    }

    let weak_candidates: Vec<MatchCandidate> = candidates
        .into_iter()
        .filter(|c| c.score >= config.weak_threshold)
        .collect();
    tracing::debug!(%name, weak = weak_candidates.len(), "supplier not resolved");
    ResolutionVerdict::NoMatch { weak_candidates }
}

/// Resolves suppliers against a live [`PartnerRegistry`].
///
/// Holds no state between calls besides its configuration: each call reads a
/// fresh snapshot, so it is safe to share across request handlers.
#[derive(Debug, Clone)]
pub struct SupplierResolver<R> {
    registry: R,
    config: ResolverConfig,
}

impl<R: PartnerRegistry> SupplierResolver<R> {
    pub fn new(registry: R) -> Self {
        Self::with_config(registry, ResolverConfig::default())
    }

    pub fn with_config(registry: R, config: ResolverConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve against a snapshot taken now. Only the snapshot read can fail.
    pub fn resolve(
        &self,
        candidate_name: &str,
        candidate_vat: &str,
    ) -> Result<ResolutionVerdict, RegistryError> {
        let partners = self.registry.snapshot()?;
        let verdict = resolve_supplier_with(candidate_name, candidate_vat, &partners, &self.config);
        tracing::info!(
            partners = partners.len(),
            resolved = verdict.is_resolved(),
            "supplier resolution finished"
        );
        Ok(verdict)
    }
}
