use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use sha2::{Digest, Sha256};

mod patterns {
    // Literal patterns, checked by the tests below
    #![allow(clippy::unwrap_used)]

    use lazy_static::lazy_static;
    use regex::Regex;

    lazy_static! {
        pub(super) static ref CARD_NUMBER_REGEX: Regex = Regex::new(r"\b(?:\d[ -]?){12,18}\d\b").unwrap();
        pub(super) static ref EMAIL_REGEX: Regex = Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
        pub(super) static ref PHONE_REGEX: Regex = Regex::new(r"\b(?:\+1[-.\s]?)?\(?([0-9]{3})\)?[-.\s]?([0-9]{3})[-.\s]?([0-9]{4})\b").unwrap();
        pub(super) static ref ROUTING_NUMBER_REGEX: Regex = Regex::new(r"\b\d{9}\b").unwrap();
    }
}

use patterns::{CARD_NUMBER_REGEX, EMAIL_REGEX, PHONE_REGEX, ROUTING_NUMBER_REGEX};

/// PII redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_card_numbers: bool,
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_routing_numbers: bool,
    /// Replace values with a short stable hash so the same patient can be
    /// correlated across log lines without exposing the value
    pub hash_for_correlation: bool,
    pub custom_patterns: Vec<(Regex, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_card_numbers: true,
            redact_emails: true,
            redact_phones: true,
            redact_routing_numbers: true,
            hash_for_correlation: true,
            custom_patterns: Vec::new(),
        }
    }
}

impl RedactionConfig {
    /// A configuration that leaves every message untouched
    pub fn disabled() -> Self {
        Self {
            redact_card_numbers: false,
            redact_emails: false,
            redact_phones: false,
            redact_routing_numbers: false,
            hash_for_correlation: false,
            custom_patterns: Vec::new(),
        }
    }

    pub fn with_custom_pattern(mut self, pattern: Regex, replacement: impl Into<String>) -> Self {
        self.custom_patterns.push((pattern, replacement.into()));
        self
    }
}

/// PII redactor for log messages
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        // Card numbers first so the phone pattern never eats part of a PAN
        if self.config.redact_card_numbers {
            result = self.redact_card_numbers(&result);
        }

        if self.config.redact_emails {
            result = self.redact_emails(&result);
        }

        if self.config.redact_phones {
            result = self.redact_phones(&result);
        }

        if self.config.redact_routing_numbers {
            result = self.redact_routing_numbers(&result);
        }

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }

    fn redact_card_numbers(&self, text: &str) -> String {
        CARD_NUMBER_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                let digits: String = caps[0].chars().filter(char::is_ascii_digit).collect();
                if self.config.hash_for_correlation {
                    format!("CARD[{}]", self.hash_value(&digits))
                } else {
                    let last4 = digits.get(digits.len().saturating_sub(4)..).unwrap_or("");
                    format!("****-****-****-{last4}")
                }
            })
            .to_string()
    }

    fn redact_emails(&self, text: &str) -> String {
        EMAIL_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                let email = &caps[0];
                if self.config.hash_for_correlation {
                    format!("EMAIL[{}]", self.hash_value(email))
                } else {
                    match email.split_once('@') {
                        Some((local, domain)) => format!(
                            "{}***@{}***",
                            local.chars().next().unwrap_or('*'),
                            domain.chars().next().unwrap_or('*')
                        ),
                        None => "***@***".to_string(),
                    }
                }
            })
            .to_string()
    }

    fn redact_phones(&self, text: &str) -> String {
        PHONE_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("PHONE[{}]", self.hash_value(&caps[0]))
                } else {
                    "(***) ***-****".to_string()
                }
            })
            .to_string()
    }

    fn redact_routing_numbers(&self, text: &str) -> String {
        ROUTING_NUMBER_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("ROUTING[{}]", self.hash_value(&caps[0]))
                } else {
                    "*********".to_string()
                }
            })
            .to_string()
    }

    fn hash_value(&self, value: &str) -> String {
        let digest = Sha256::digest(value.as_bytes());
        // First 8 bytes keep the tag short while staying collision-resistant enough for logs
        general_purpose::STANDARD_NO_PAD.encode(digest.get(..8).unwrap_or_default())
    }
}

impl Default for PiiRedactor {
    fn default() -> Self {
        Self::new(RedactionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn masking_redactor() -> PiiRedactor {
        PiiRedactor::new(RedactionConfig {
            hash_for_correlation: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_email_redaction() {
        let redacted = masking_redactor().redact("Patient jane.doe@example.com updated");
        assert!(redacted.contains("j***@e***"));
        assert!(!redacted.contains("jane.doe"));
    }

    #[test]
    fn test_phone_redaction() {
        let redacted = masking_redactor().redact("Call back at (555) 123-4567");
        assert!(redacted.contains("(***) ***-****"));
        assert!(!redacted.contains("4567"));
    }

    #[test]
    fn test_card_number_keeps_last_four() {
        let redacted = masking_redactor().redact("Card 4111 1111 1111 1234 on file");
        assert_eq!(redacted, "Card ****-****-****-1234 on file");
    }

    #[test]
    fn test_routing_number_redaction() {
        let redacted = masking_redactor().redact("Routing 021000021 for Chase");
        assert_eq!(redacted, "Routing ********* for Chase");
    }

    #[test]
    fn test_hashing_is_stable_for_correlation() {
        let redactor = PiiRedactor::default();
        let first = redactor.redact("jane.doe@example.com");
        let second = redactor.redact("jane.doe@example.com");
        assert_eq!(first, second);
        assert!(first.starts_with("EMAIL["));
    }

    #[test]
    fn test_custom_pattern() {
        let config = RedactionConfig::disabled()
            .with_custom_pattern(Regex::new(r"\bMRN\d+").unwrap(), "MRN[REDACTED]");
        let redacted = PiiRedactor::new(config).redact("Chart MRN123456 opened");
        assert_eq!(redacted, "Chart MRN[REDACTED] opened");
    }

    #[test]
    fn test_disabled_leaves_text_untouched() {
        let text = "jane.doe@example.com (555) 123-4567";
        assert_eq!(PiiRedactor::new(RedactionConfig::disabled()).redact(text), text);
    }
}
