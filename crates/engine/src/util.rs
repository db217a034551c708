//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every operation enforces the same rules.

use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine};

/// Trim a required text field, rejecting blank input.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Identity key of an item name: trimmed, NFKC-normalized and lowercased.
///
/// Two names with the same key denote the same logical item.
pub(crate) fn item_name_key(name: &str) -> ResultEngine<String> {
    let trimmed = normalize_required_text(name, "item name")?;
    Ok(trimmed.nfkc().collect::<String>().to_lowercase())
}

/// Case-insensitive key used to match categories.
pub(crate) fn category_key(category: &str) -> ResultEngine<String> {
    let trimmed = normalize_required_text(category, "category")?;
    Ok(trimmed.nfkc().collect::<String>().to_lowercase())
}

pub(crate) fn require_positive_quantity(quantity: i64) -> ResultEngine<()> {
    if quantity <= 0 {
        return Err(EngineError::Validation(format!(
            "quantity must be > 0, got {quantity}"
        )));
    }
    Ok(())
}

pub(crate) fn require_email(value: &str) -> ResultEngine<String> {
    let email = normalize_required_text(value, "email")?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(EngineError::Validation(format!("invalid email: {email}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_key_ignores_case_and_surrounding_whitespace() {
        assert_eq!(item_name_key("Bolt").unwrap(), "bolt");
        assert_eq!(item_name_key("  bolt ").unwrap(), "bolt");
        assert_eq!(item_name_key("BOLT").unwrap(), "bolt");
    }

    #[test]
    fn item_key_folds_compatibility_forms() {
        // Fullwidth letters fold to ASCII under NFKC.
        assert_eq!(item_name_key("Ｂｏｌｔ").unwrap(), "bolt");
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(matches!(
            item_name_key("   "),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn quantity_must_be_positive() {
        assert!(require_positive_quantity(1).is_ok());
        assert!(require_positive_quantity(0).is_err());
        assert!(require_positive_quantity(-4).is_err());
    }

    #[test]
    fn email_needs_local_part_and_domain() {
        assert!(require_email("ann@example.com").is_ok());
        assert!(require_email("ann").is_err());
        assert!(require_email("@example.com").is_err());
    }
}
