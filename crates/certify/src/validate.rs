//! Roster field validation
//!
//! Cheap heuristic firewalls against spreadsheet junk (form defaults,
//! placeholder rows), not a name grammar or an RFC-5322 validator. Both
//! predicates are pure, deterministic, and total over any string input.

use regex::Regex;
use std::sync::OnceLock;

/// Placeholder words that show up as form defaults in exported rosters.
/// A name containing any of these as a token is junk.
const NAME_DENYLIST: [&str; 8] = ["correct", "yes", "no", "test", "none", "n/a", "123", "nil"];

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").expect("email pattern is valid"))
}

/// Check whether a roster name looks like a real full name.
///
/// Rejects names containing denylisted placeholder words, single-token
/// names, and anything containing an ASCII digit.
pub fn is_valid_name(name: &str) -> bool {
    let lowered = name.trim().to_lowercase();
    if lowered
        .split_whitespace()
        .any(|token| NAME_DENYLIST.contains(&token))
    {
        return false;
    }
    if lowered.split_whitespace().count() < 2 {
        return false;
    }
    if name.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    true
}

/// Check whether an email is structurally plausible (`local@domain.tld`).
///
/// Intentionally permissive: this catches obviously malformed entries, it
/// does not guarantee deliverability.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("Jane Doe"));
        assert!(is_valid_name("Mary Jane Watson"));
        assert!(is_valid_name("  Bob Smith  "));
    }

    #[test]
    fn test_denylisted_names() {
        assert!(!is_valid_name("Test User"));
        assert!(!is_valid_name("test"));
        assert!(!is_valid_name("N/A"));
        assert!(!is_valid_name("None"));
        assert!(!is_valid_name("123"));
        assert!(!is_valid_name("nil"));
        assert!(!is_valid_name("  Yes  "));
    }

    #[test]
    fn test_single_token_rejected() {
        assert!(!is_valid_name("John"));
        assert!(!is_valid_name("Madonna"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("   "));
    }

    #[test]
    fn test_digits_rejected() {
        assert!(!is_valid_name("Jane Doe2"));
        assert!(!is_valid_name("4ane Doe"));
        assert!(!is_valid_name("Jane Doe 3rd"));
    }

    #[test]
    fn test_unicode_names() {
        assert!(is_valid_name("José García"));
        assert!(is_valid_name("李 明"));
    }

    #[test]
    fn test_very_long_name_is_handled() {
        let long = format!("{} {}", "A".repeat(10_000), "B".repeat(10_000));
        assert!(is_valid_name(&long));
    }

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("a.b@example.com"));
        assert!(is_valid_email("jane@x.com"));
        assert!(is_valid_email("first-last@sub.domain.org"));
        assert!(is_valid_email("  padded@example.com  "));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("spaces in@example.com"));
    }
}
