//! Availability detection over WHOIS records.
//!
//! WHOIS has no universal "is this domain free" field, so the verdict comes
//! from a chain of detectors tried in priority order. The first detector that
//! produces a signal wins. When none does, the domain is treated as
//! registered.
//!
//! That default is a known bias: a registry answering "free" in wording that
//! no signature recognises is reported as taken. Extend the signature list
//! through configuration rather than special-casing registries here.

use crate::error::DomainCheckError;
use crate::protocols::whois::WhoisRecord;
use crate::types::CheckConfig;
use regex::{RegexSet, RegexSetBuilder};
use tracing::debug;

/// Case-insensitive patterns whose presence means the domain is unregistered.
pub const DEFAULT_AVAILABILITY_SIGNATURES: &[&str] = &[
    "no match for",
    "no match",
    "not found",
    "no data found",
    "no entries found",
    r"status:\s*available",
    r"status:\s*free",
    "no object found",
    "object does not exist",
    "no matching record",
    "no such domain",
    "has not been registered",
    "not registered",
];

/// Structured status values that mean the domain is unregistered.
pub const DEFAULT_AVAILABLE_STATUSES: &[&str] = &["available", "free", "no object found"];

/// EPP and registry status codes that only ever appear on registered names.
///
/// Generic lifecycle words (`active`, `inactive`, `connect`) are not listed,
/// so an availability signature outranks them.
const REGISTERED_STATUSES: &[&str] = &[
    "ok",
    "registered",
    "addperiod",
    "autorenewperiod",
    "renewperiod",
    "transferperiod",
    "redemptionperiod",
    "pendingcreate",
    "pendingdelete",
    "pendingrenew",
    "pendingrestore",
    "pendingtransfer",
    "pendingupdate",
    "clienthold",
    "clientdeleteprohibited",
    "clientrenewprohibited",
    "clienttransferprohibited",
    "clientupdateprohibited",
    "serverhold",
    "serverdeleteprohibited",
    "serverrenewprohibited",
    "servertransferprohibited",
    "serverupdateprohibited",
];

/// Field names carrying a domain's status in key/value WHOIS output.
const STATUS_FIELDS: &[&str] = &["status", "domain status", "state"];

/// A strategy that may infer availability from a WHOIS record.
///
/// Returns `Some(true)` for available, `Some(false)` for registered, and
/// `None` when the record carries no signal this detector understands.
pub trait AvailabilityDetector: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn detect(&self, record: &WhoisRecord) -> Option<bool>;
}

/// Reads the parsed `status` / `domain status` fields of a record.
pub struct StructuredStatusDetector {
    available: Vec<String>,
}

impl StructuredStatusDetector {
    pub fn new<I, S>(available_statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            available: available_statuses
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    fn is_available_status(&self, value: &str, code: &str) -> bool {
        self.available.iter().any(|s| s == value || s == code)
    }
}

impl AvailabilityDetector for StructuredStatusDetector {
    fn name(&self) -> &'static str {
        "structured-status"
    }

    fn detect(&self, record: &WhoisRecord) -> Option<bool> {
        let mut registered = false;

        for field in STATUS_FIELDS {
            for value in record.field_values(field) {
                let value = value.trim().to_lowercase();
                // "clientTransferProhibited https://icann.org/epp#..." -> first token
                let code = value.split_whitespace().next().unwrap_or_default();

                if self.is_available_status(&value, code) {
                    return Some(true);
                }
                if REGISTERED_STATUSES.contains(&code) {
                    registered = true;
                }
            }
        }

        registered.then_some(false)
    }
}

/// Tests the raw response text against case-insensitive signature patterns.
pub struct SignatureDetector {
    patterns: RegexSet,
}

impl SignatureDetector {
    /// Compile the signature list.
    ///
    /// # Errors
    ///
    /// Returns [`DomainCheckError::ConfigError`] if a pattern is not a valid
    /// regular expression.
    pub fn new<I, S>(signatures: I) -> Result<Self, DomainCheckError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = RegexSetBuilder::new(signatures)
            .case_insensitive(true)
            .build()?;
        Ok(Self { patterns })
    }

    /// Number of compiled signatures.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl AvailabilityDetector for SignatureDetector {
    fn name(&self) -> &'static str {
        "signature"
    }

    fn detect(&self, record: &WhoisRecord) -> Option<bool> {
        self.patterns.is_match(&record.raw).then_some(true)
    }
}

/// Ordered chain of detectors producing the final WHOIS verdict.
pub struct WhoisClassifier {
    detectors: Vec<Box<dyn AvailabilityDetector>>,
}

impl WhoisClassifier {
    /// Build a classifier from an explicit detector chain.
    pub fn new(detectors: Vec<Box<dyn AvailabilityDetector>>) -> Self {
        Self { detectors }
    }

    /// Structured status detector first, signature detector as fallback.
    pub fn from_config(config: &CheckConfig) -> Result<Self, DomainCheckError> {
        Ok(Self::new(vec![
            Box::new(StructuredStatusDetector::new(&config.available_statuses)),
            Box::new(SignatureDetector::new(&config.availability_signatures)?),
        ]))
    }

    /// `true` when the record says the domain is free.
    pub fn classify(&self, record: &WhoisRecord) -> bool {
        for detector in &self.detectors {
            if let Some(available) = detector.detect(record) {
                debug!(
                    server = %record.server,
                    detector = detector.name(),
                    available,
                    "WHOIS record classified"
                );
                return available;
            }
        }

        debug!(server = %record.server, "No availability signal, assuming registered");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(raw: &str) -> WhoisRecord {
        WhoisRecord::parse("whois.test", raw)
    }

    fn classifier() -> WhoisClassifier {
        WhoisClassifier::from_config(&CheckConfig::default()).unwrap()
    }

    #[test]
    fn test_no_match_for_is_available_in_any_case() {
        let classifier = classifier();
        assert!(classifier.classify(&record("No match for \"CLEARLY-UNREGISTERED.COM\".\r\n")));
        assert!(classifier.classify(&record("NO MATCH FOR example.net")));
        assert!(classifier.classify(&record("no match for example.org")));
    }

    #[test]
    fn test_status_available_is_available() {
        let classifier = classifier();
        assert!(classifier.classify(&record("Domain: example.io\nStatus: AVAILABLE\n")));
        assert!(classifier.classify(&record("status:\tavailable")));
    }

    #[test]
    fn test_missing_signatures_means_registered() {
        let classifier = classifier();
        let raw = "Domain Name: GOOGLE.COM\r\nRegistrar: MarkMonitor Inc.\r\nCreation Date: 1997-09-15T04:00:00Z\r\n";
        assert!(!classifier.classify(&record(raw)));
        assert!(!classifier.classify(&record("Welcome to our WHOIS service")));
        assert!(!classifier.classify(&record("Domain: example.de\nStatus: connect\n")));
    }

    #[test]
    fn test_structured_status_takes_precedence() {
        let classifier = classifier();
        // Registered status code wins over stray signature text elsewhere.
        let raw = "Domain Name: example.com\nDomain Status: clientTransferProhibited https://icann.org/epp#clientTransferProhibited\nRemarks: abuse contact not found\n";
        assert!(!classifier.classify(&record(raw)));
    }

    #[test]
    fn test_no_match_for_beats_generic_status_word() {
        let classifier = classifier();
        let raw = "No match for \"FOO.COM\".\r\nStatus: inactive\r\n";
        assert!(classifier.classify(&record(raw)));

        let raw = "NOT FOUND\nState: active\n";
        assert!(classifier.classify(&record(raw)));
    }

    #[test]
    fn test_structured_detector_without_status_is_silent() {
        let detector = StructuredStatusDetector::new(DEFAULT_AVAILABLE_STATUSES);
        assert_eq!(detector.detect(&record("No match for example.com")), None);
        assert_eq!(detector.detect(&record("Status: free")), Some(true));
        assert_eq!(detector.detect(&record("Status: ok")), Some(false));
        assert_eq!(detector.detect(&record("Status: connect")), None);
        assert_eq!(detector.detect(&record("status: ACTIVE")), None);
        assert_eq!(
            detector.detect(&record("Domain Status: No Object Found")),
            Some(true)
        );
    }

    #[test]
    fn test_custom_signatures_are_data() {
        let config = CheckConfig::default().with_signatures(vec!["is up for grabs".to_string()]);
        let classifier = WhoisClassifier::from_config(&config).unwrap();
        assert!(classifier.classify(&record("example.zz IS UP FOR GRABS")));
        assert!(!classifier.classify(&record("No match for example.zz")));
    }

    #[test]
    fn test_invalid_signature_is_config_error() {
        let err = SignatureDetector::new(["(unclosed"]).err().unwrap();
        assert!(matches!(err, DomainCheckError::ConfigError { .. }));
    }

    #[test]
    fn test_empty_chain_defaults_to_registered() {
        let classifier = WhoisClassifier::new(Vec::new());
        assert!(!classifier.classify(&record("No match for example.com")));
    }
}
