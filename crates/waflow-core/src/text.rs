// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone normalization and message templating.

/// Country code prepended to bare national numbers.
pub const DEFAULT_COUNTRY_CODE: &str = "91";

/// Placeholder replaced with the recipient's name.
pub const NAME_PLACEHOLDER: &str = "{Name}";

/// Normalize a recipient phone number for the gateway.
///
/// A bare 10-digit number gets the `91` country code. Anything else, including
/// numbers that already carry a country code, passes through after trimming
/// whitespace and a leading `+`.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if trimmed.len() == 10 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{DEFAULT_COUNTRY_CODE}{trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Substitute `{Name}` with the recipient's name, when one is known.
pub fn render_body(template: &str, name: Option<&str>) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => template.replace(NAME_PLACEHOLDER, name),
        None => template.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ten_digit_number_gets_country_code() {
        assert_eq!(normalize_phone("9876543210"), "919876543210");
        assert_eq!(normalize_phone(" 9876543210 "), "919876543210");
    }

    #[test]
    fn prefixed_number_is_unchanged() {
        assert_eq!(normalize_phone("919876543210"), "919876543210");
        assert_eq!(normalize_phone("+919876543210"), "919876543210");
        assert_eq!(normalize_phone("14155550123"), "14155550123");
    }

    #[test]
    fn name_placeholder_is_replaced() {
        assert_eq!(render_body("Hey *{Name}* 👋", Some("Ravi")), "Hey *Ravi* 👋");
        assert_eq!(render_body("Hey {Name}", None), "Hey {Name}");
        assert_eq!(render_body("Hey {Name}", Some("  ")), "Hey {Name}");
        assert_eq!(render_body("No token", Some("Ravi")), "No token");
    }

    proptest! {
        #[test]
        fn any_ten_digit_number_becomes_twelve_digits(n in 1_000_000_000u64..10_000_000_000u64) {
            let raw = n.to_string();
            let normalized = normalize_phone(&raw);
            prop_assert_eq!(normalized.len(), 12);
            prop_assert!(normalized.starts_with("91"));
            prop_assert!(normalized.ends_with(&raw));
        }

        #[test]
        fn twelve_digit_numbers_pass_through(n in 910_000_000_000u64..920_000_000_000u64) {
            let raw = n.to_string();
            prop_assert_eq!(normalize_phone(&raw), raw);
        }
    }
}
