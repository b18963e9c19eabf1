//! Name similarity scoring.
//!
//! Scores come in three tiers: exact equality after normalization, containment
//! of one normalized name in the other, and otherwise the share of keywords the
//! two names have in common. The first two tiers are fixed so that legal-suffix
//! noise can never make a confident match lose to a partial overlap.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use ledgerbridge_core::PartnerId;

use crate::normalize::{NormalizedName, normalize_name};
use crate::partner::PartnerRecord;

/// Score of two names that are equal after normalization.
pub const EXACT_NAME_SCORE: f64 = 1.0;

/// Score of two names where one normalized form contains the other.
pub const CONTAINMENT_SCORE: f64 = 0.85;

/// Words shorter than this never count towards keyword overlap.
const MIN_WORD_CHARS: usize = 3;

/// Which scoring tier produced a candidate's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBasis {
    ExactVat,
    ExactName,
    Containment,
    WordOverlap,
}

/// A scored partner for one resolution request. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub partner_id: PartnerId,
    /// Similarity in `[0, 1]`.
    pub score: f64,
    pub basis: MatchBasis,
}

/// Similarity of two raw legal names in `[0, 1]`. Commutative.
///
/// Returns `0` whenever either name normalizes to nothing.
pub fn fuzzy_match_score(name_a: &str, name_b: &str) -> f64 {
    score_normalized(&normalize_name(name_a), &normalize_name(name_b)).0
}

/// Score a partner's name against an already-normalized candidate name.
pub fn score_partner(candidate: &NormalizedName, partner: &PartnerRecord) -> MatchCandidate {
    let (score, basis) = score_normalized(candidate, &partner.normalized_name());
    MatchCandidate {
        partner_id: partner.id,
        score,
        basis,
    }
}

pub(crate) fn score_normalized(a: &NormalizedName, b: &NormalizedName) -> (f64, MatchBasis) {
    if a.is_empty() || b.is_empty() {
        return (0.0, MatchBasis::WordOverlap);
    }
    if a == b {
        return (EXACT_NAME_SCORE, MatchBasis::ExactName);
    }
    if a.as_str().contains(b.as_str()) || b.as_str().contains(a.as_str()) {
        return (CONTAINMENT_SCORE, MatchBasis::Containment);
    }
    (keyword_overlap(a, b), MatchBasis::WordOverlap)
}

fn keyword_overlap(a: &NormalizedName, b: &NormalizedName) -> f64 {
    let words_a = significant_words(a);
    let words_b = significant_words(b);
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let common = words_a.intersection(&words_b).count();
    common as f64 / words_a.len().max(words_b.len()) as f64
}

fn significant_words(name: &NormalizedName) -> BTreeSet<&str> {
    name.keywords()
        .filter(|w| w.chars().count() >= MIN_WORD_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn legal_suffix_variants_score_exact() {
        assert_eq!(fuzzy_match_score("BAGNOLI GROUP S.R.L.", "Bagnoli Group Srl"), 1.0);
    }

    #[test]
    fn containment_scores_fixed_tier() {
        assert_eq!(
            fuzzy_match_score("La bottega del caffè GmbH", "Bottega del caffè"),
            CONTAINMENT_SCORE
        );
    }

    #[test]
    fn partial_overlap_is_ratio_of_shared_keywords() {
        // keywords: {trasporti, rossi, milano} vs {trasporti, rossi, torino}
        let score = fuzzy_match_score("Trasporti Rossi Milano", "Trasporti Rossi Torino Srl");
        assert!((score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn short_words_and_stop_words_do_not_count() {
        // Only "ferro" survives on both sides.
        let score = fuzzy_match_score("Ferro e Co della Valle", "Ferro Battuto di Co");
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_names_score_zero() {
        assert_eq!(fuzzy_match_score("Bagnoli Group", ""), 0.0);
        assert_eq!(fuzzy_match_score("", ""), 0.0);
        assert_eq!(fuzzy_match_score("S.r.l.", "Bagnoli Group"), 0.0);
    }

    #[test]
    fn disjoint_names_score_zero() {
        assert_eq!(fuzzy_match_score("Alfa Romeo", "Bianchi Biciclette"), 0.0);
    }

    #[test]
    fn score_partner_reports_basis() {
        let partner = PartnerRecord::new(PartnerId::new(9), "Bagnoli Group Srl", None);
        let exact = score_partner(&normalize_name("BAGNOLI GROUP S.R.L."), &partner);
        assert_eq!(exact.partner_id, PartnerId::new(9));
        assert_eq!(exact.basis, MatchBasis::ExactName);

        let contained = score_partner(&normalize_name("Bagnoli"), &partner);
        assert_eq!(contained.basis, MatchBasis::Containment);
        assert_eq!(contained.score, CONTAINMENT_SCORE);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the score does not depend on argument order.
        #[test]
        fn score_is_commutative(a in "[A-Za-z .,&\\-]{0,40}", b in "[A-Za-z .,&\\-]{0,40}") {
            prop_assert_eq!(fuzzy_match_score(&a, &b), fuzzy_match_score(&b, &a));
        }

        /// Property: scores stay within [0, 1] and a name always matches itself
        /// unless it normalizes to nothing.
        #[test]
        fn score_is_bounded(a in "[A-Za-z .,&\\-]{0,40}", b in "[A-Za-z .,&\\-]{0,40}") {
            let score = fuzzy_match_score(&a, &b);
            prop_assert!((0.0..=1.0).contains(&score));

            let own = fuzzy_match_score(&a, &a);
            if normalize_name(&a).is_empty() {
                prop_assert_eq!(own, 0.0);
            } else {
                prop_assert_eq!(own, 1.0);
            }
        }
    }
}
