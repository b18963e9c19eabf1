//! Canonical comparable forms of legal names and VAT numbers.
//!
//! Both normalizers are total (empty input yields an empty value) and
//! idempotent: normalizing an already-normalized value returns it unchanged.

use serde::{Deserialize, Serialize};

use ledgerbridge_core::ValueObject;

/// Legal-entity forms dropped from names, compared after stripping punctuation
/// from a whole token (so `S.R.L.` and `srl,` both match `srl`).
const LEGAL_FORMS: &[&str] = &[
    "srl", "spa", "sas", "snc", "gmbh", "ltd", "llc", "inc", "corp", "sa",
];

const NAME_PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~',
    '(', ')',
];

/// Italian articles and prepositions ignored by keyword scoring.
const STOP_WORDS: &[&str] = &[
    "il", "lo", "la", "i", "gli", "le", "un", "uno", "una", "del", "della", "dello", "degli",
    "delle", "di", "da", "in", "con", "su", "per", "tra", "fra",
];

/// Swiss UID numbers carry the tax-scheme name after the digits, in the
/// language of the issuing canton.
const VAT_SCHEME_SUFFIXES: &[&str] = &["MWST", "TVA", "IVA"];

/// Lowercased legal name without legal-entity forms or punctuation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedName(String);

impl NormalizedName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Words of the name, in order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ').filter(|w| !w.is_empty())
    }

    /// Words of the name that carry meaning for scoring (stop words removed).
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.words().filter(|w| !STOP_WORDS.contains(w))
    }
}

impl ValueObject for NormalizedName {}

impl AsRef<str> for NormalizedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Uppercased VAT number without country prefix, separators or scheme suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedVat(String);

impl NormalizedVat {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ValueObject for NormalizedVat {}

impl AsRef<str> for NormalizedVat {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for NormalizedVat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a VAT number so that registrations written in different styles
/// compare equal (`IT00895100709`, `00895100709`, `CHE-105.968.205 MWST`).
///
/// Country prefixes are stripped before separators are removed, so a prefix
/// glued to the digits by a dash (`CHE-105...`) is still recognized. The pass
/// is repeated until nothing changes, which keeps the function idempotent even
/// for input like `ITIT...` or `I T...`.
pub fn normalize_vat(raw: &str) -> NormalizedVat {
    let mut current = raw.trim().to_uppercase();
    loop {
        let next = vat_pass(&current);
        if next == current {
            return NormalizedVat(current);
        }
        current = next;
    }
}

fn vat_pass(value: &str) -> String {
    let mut rest = value;
    if let Some(stripped) = rest.strip_prefix("IT") {
        rest = stripped;
    }
    if let Some(stripped) = rest
        .strip_prefix("CHE-")
        .or_else(|| rest.strip_prefix("CHE"))
    {
        rest = stripped;
    }

    let compact: String = rest
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '.')
        .collect();

    let without_scheme = VAT_SCHEME_SUFFIXES
        .iter()
        .find_map(|suffix| compact.strip_suffix(suffix))
        .unwrap_or(&compact);

    without_scheme.trim().to_string()
}

/// Normalize a legal name: lowercase, legal-entity forms removed as whole
/// words, punctuation turned into spaces, whitespace collapsed.
///
/// `"BAGNOLI GROUP S.R.L."` and `"Bagnoli Group Srl"` both become
/// `"bagnoli group"`, while `"Casa Sarda"` keeps its `sa`-containing words.
pub fn normalize_name(raw: &str) -> NormalizedName {
    let lowered = raw.trim().to_lowercase();

    let without_forms = lowered
        .split_whitespace()
        .filter(|token| !is_legal_form(token))
        .collect::<Vec<_>>()
        .join(" ");

    let spaced: String = without_forms
        .chars()
        .map(|c| if NAME_PUNCTUATION.contains(&c) { ' ' } else { c })
        .collect();

    // Splitting on punctuation can expose a form that was glued to a word
    // (`rossi-srl`), so forms are dropped once more on the final words.
    let mut words = spaced
        .split_whitespace()
        .filter(|word| !is_legal_form(word))
        .collect::<Vec<_>>();
    drop_spelled_out_form(&mut words);

    NormalizedName(words.join(" "))
}

/// Drop a legal form spelled letter by letter at the end of the name
/// (`s r l` from `S. R. L.`), longest match first, until none is left.
fn drop_spelled_out_form(words: &mut Vec<&str>) {
    loop {
        let run = words
            .iter()
            .rev()
            .take_while(|w| w.chars().count() == 1)
            .count();
        let spelled = (1..=run).rev().find(|&len| {
            let tail = words[words.len() - len..].concat();
            LEGAL_FORMS.contains(&tail.as_str())
        });

        match spelled {
            Some(len) => words.truncate(words.len() - len),
            None => return,
        }
    }
}

fn is_legal_form(token: &str) -> bool {
    let bare: String = token
        .chars()
        .filter(|c| !NAME_PUNCTUATION.contains(c))
        .collect();
    LEGAL_FORMS.contains(&bare.as_str())
}

/// Normalized name with articles and prepositions removed.
pub fn extract_keywords(name: &str) -> String {
    normalize_name(name).keywords().collect::<Vec<_>>().join(" ")
}
