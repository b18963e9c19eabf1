//! Strongly-typed identifiers for ERP records.
//!
//! The ERP addresses every record by a positive integer id. These newtypes keep
//! partner, document and line ids from being mixed up at call sites.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a partner (supplier/customer) record in the registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartnerId(i64);

/// Identifier of an accounting document (e.g. a draft supplier bill).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(i64);

/// Identifier of a single line on an accounting document.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(i64);

macro_rules! impl_record_id_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(raw))
            }
        }
    };
}

impl_record_id_newtype!(PartnerId, "PartnerId");
impl_record_id_newtype!(DocumentId, "DocumentId");
impl_record_id_newtype!(LineId, "LineId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_from_strings() {
        assert_eq!("42".parse::<PartnerId>().unwrap(), PartnerId::new(42));
        assert_eq!(" 7 ".parse::<LineId>().unwrap().get(), 7);
    }

    #[test]
    fn parse_failure_is_invalid_id() {
        let err = "abc".parse::<DocumentId>().unwrap_err();
        match err {
            DomainError::InvalidId(msg) => assert!(msg.starts_with("DocumentId")),
            _ => panic!("Expected InvalidId error"),
        }
    }

    #[test]
    fn ids_serialize_as_bare_integers() {
        let json = serde_json::to_string(&LineId::new(15)).unwrap();
        assert_eq!(json, "15");
        let back: PartnerId = serde_json::from_str("3").unwrap();
        assert_eq!(back, PartnerId::new(3));
    }
}
