//! Helper functions and utilities
//!
//! This module contains normalization and identifier helpers shared by the
//! registration and check-in services.

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

/// Short code alphabet. I, L, O, 0 and 1 are left out so codes read back
/// unambiguously over the phone or from a printed badge.
pub const SHORT_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Short code length
pub const SHORT_CODE_LENGTH: usize = 6;

/// Suffix length used for quick manual lookups
pub const SHORT_CODE_SUFFIX_LENGTH: usize = 4;

/// Generate a new UUID v4
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a random short code
pub fn generate_short_code() -> String {
    let mut rng = rand::thread_rng();
    (0..SHORT_CODE_LENGTH)
        .map(|_| SHORT_CODE_ALPHABET[rng.gen_range(0..SHORT_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Last four characters of a short code
pub fn short_code_suffix(short_code: &str) -> String {
    let chars: Vec<char> = short_code.chars().collect();
    let start = chars.len().saturating_sub(SHORT_CODE_SUFFIX_LENGTH);
    chars[start..].iter().collect()
}

/// Check that a string only uses the short code alphabet
pub fn is_short_code_charset(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| SHORT_CODE_ALPHABET.contains(&b))
}

/// Registration identifier for a conference year and short code
pub fn registration_id(year: i32, short_code: &str) -> String {
    format!("REG-{}-{}", year, short_code)
}

/// Format an invoice number, `INV-YYYY-NNNN`
pub fn format_invoice_number(year: i32, sequence: i64) -> String {
    format!("INV-{}-{:04}", year, sequence)
}

/// Normalize an email address for storage and comparison
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalize a phone number.
///
/// Keeps digits and a leading `+`. Local mobile numbers of the form
/// `09XXXXXXXXX` are rewritten to `+639XXXXXXXXX`.
pub fn normalize_phone(phone: &str) -> String {
    let trimmed = phone.trim();
    let has_plus = trimmed.starts_with('+');
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if !has_plus && digits.len() == 11 && digits.starts_with("09") {
        return format!("+63{}", &digits[1..]);
    }

    if has_plus {
        format!("+{}", digits)
    } else {
        digits
    }
}

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Validate phone number format (basic validation on the normalized form)
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.trim_start_matches('+');
    digits.len() >= 10 && digits.len() <= 15 && digits.chars().all(|c| c.is_ascii_digit())
}

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_code_suffix() {
        assert_eq!(short_code_suffix("A3K7MN"), "K7MN");
        assert_eq!(short_code_suffix("MN"), "MN");
    }

    #[test]
    fn test_generate_short_code_uses_alphabet() {
        for _ in 0..100 {
            let code = generate_short_code();
            assert_eq!(code.len(), SHORT_CODE_LENGTH);
            assert!(is_short_code_charset(&code));
            assert!(!code.contains('O') && !code.contains('0') && !code.contains('I'));
        }
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("0917 123 4567"), "+639171234567");
        assert_eq!(normalize_phone("+63 917-123-4567"), "+639171234567");
        assert_eq!(normalize_phone("(02) 8123 4567"), "0281234567");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Juan.Cruz@Example.COM "), "juan.cruz@example.com");
        assert!(is_valid_email("juan@example.com"));
        assert!(!is_valid_email("juan@example"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn test_invoice_number_format() {
        assert_eq!(format_invoice_number(2026, 7), "INV-2026-0007");
        assert_eq!(format_invoice_number(2026, 12345), "INV-2026-12345");
    }

    proptest! {
        #[test]
        fn prop_suffix_is_last_four(code in "[A-HJKMNP-Z2-9]{6}") {
            prop_assert!(is_short_code_charset(&code));
            let suffix = short_code_suffix(&code);
            prop_assert_eq!(suffix.len(), SHORT_CODE_SUFFIX_LENGTH);
            prop_assert_eq!(suffix.as_str(), &code[2..]);
        }

        #[test]
        fn prop_generated_codes_keep_suffix_invariant(_round in 0u32..64) {
            let code = generate_short_code();
            prop_assert!(is_short_code_charset(&code));
            prop_assert_eq!(code.len(), SHORT_CODE_LENGTH);
            prop_assert_eq!(short_code_suffix(&code), code[SHORT_CODE_LENGTH - SHORT_CODE_SUFFIX_LENGTH..].to_string());
        }
    }
}
