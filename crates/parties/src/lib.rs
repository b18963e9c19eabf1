//! Parties domain module: supplier identification.
//!
//! Resolves a noisy supplier name/VAT pair (as read off a supplier invoice) to
//! a partner record in the ERP registry. Everything here is deterministic and
//! free of IO apart from the registry snapshot read in [`SupplierResolver`].

pub mod config;
pub mod matcher;
pub mod normalize;
pub mod partner;
pub mod resolver;

pub use config::ResolverConfig;
pub use matcher::{
    CONTAINMENT_SCORE, EXACT_NAME_SCORE, MatchBasis, MatchCandidate, fuzzy_match_score,
    score_partner,
};
pub use normalize::{NormalizedName, NormalizedVat, extract_keywords, normalize_name, normalize_vat};
pub use partner::{InMemoryPartnerRegistry, PartnerRecord, PartnerRegistry, RegistryError};
pub use resolver::{
    CONFIDENT_MATCH_THRESHOLD, ResolutionVerdict, SupplierResolver, resolve_supplier,
    resolve_supplier_with,
};
