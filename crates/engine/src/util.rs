//! Internal helpers for validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Normalized lookup key for a name: NFKC, lowercased, inner whitespace
/// collapsed to single spaces.
pub(crate) fn name_key(value: &str) -> String {
    let normalized: String = value.trim().nfkc().collect();
    normalized
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_key_folds_case_and_whitespace() {
        assert_eq!(name_key("  Food &  Drink "), "food & drink");
        assert_eq!(name_key("SALARY"), "salary");
        assert_eq!(name_key("Café"), "café");
    }

    #[test]
    fn parse_uuid_labels_errors() {
        let err = parse_uuid("nope", "wallet").unwrap_err();
        assert_eq!(err, EngineError::InvalidId("invalid wallet id".to_string()));
    }
}
