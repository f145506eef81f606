//! Phone number utilities

use once_cell::sync::Lazy;
use regex::Regex;

// Chinese mobile phone number regex
static CHINA_MOBILE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^1[3-9]\d{9}$").unwrap());

// International phone number regex (E.164 format)
static INTERNATIONAL_PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9]\d{1,14}$").unwrap());

/// Normalize a phone number by removing common formatting characters
pub fn normalize_phone_number(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// Check if a phone number is valid (Chinese mobile without country code)
pub fn is_valid_chinese_mobile(phone: &str) -> bool {
    let normalized = normalize_phone_number(phone);
    CHINA_MOBILE_REGEX.is_match(&normalized)
}

/// Check if a phone number is valid (international E.164 format)
pub fn is_valid_e164(phone: &str) -> bool {
    let normalized = normalize_phone_number(phone);
    INTERNATIONAL_PHONE_REGEX.is_match(&normalized)
}

/// Mask a phone number for display and logging (e.g., +86138****5678)
pub fn mask_phone_number(phone: &str) -> String {
    let normalized = normalize_phone_number(phone);
    if normalized.len() >= 8 {
        format!(
            "{}****{}",
            &normalized[0..normalized.len() - 8],
            &normalized[normalized.len() - 4..]
        )
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone_number() {
        assert_eq!(normalize_phone_number("138-1234-5678"), "13812345678");
        assert_eq!(normalize_phone_number("+86 138 1234 5678"), "+8613812345678");
        assert_eq!(normalize_phone_number("(989) 123-4567"), "9891234567");
    }

    #[test]
    fn test_is_valid_chinese_mobile() {
        assert!(is_valid_chinese_mobile("13812345678"));
        assert!(is_valid_chinese_mobile("15912345678"));
        assert!(!is_valid_chinese_mobile("12812345678")); // invalid prefix
        assert!(!is_valid_chinese_mobile("1381234567")); // too short
    }

    #[test]
    fn test_is_valid_e164() {
        assert!(is_valid_e164("+8613812345678"));
        assert!(is_valid_e164("+989123456789"));
        assert!(is_valid_e164("+14155552671"));
        assert!(!is_valid_e164("13812345678")); // missing +
        assert!(!is_valid_e164("+0123456789")); // invalid country code
    }

    #[test]
    fn test_mask_phone_number() {
        assert_eq!(mask_phone_number("+8613812345678"), "+86138****5678");
        assert_eq!(mask_phone_number("+989123456789"), "+9891****6789");
        assert_eq!(mask_phone_number("1234"), "****");
    }
}
