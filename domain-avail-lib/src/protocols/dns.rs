//! DNS existence pre-check.
//!
//! An IPv4 address record is conclusive proof that a name is registered, so a
//! hit lets the orchestrator skip WHOIS entirely. A miss proves nothing: the
//! name may be registered without an A record. Every failure, including
//! timeouts and SERVFAIL, therefore defers to WHOIS instead of erroring.

use crate::error::DomainCheckError;
use crate::types::DomainQuery;
use async_trait::async_trait;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use std::time::Duration;
use tracing::{debug, warn};

/// What the address lookup found.
#[derive(Debug, Clone, PartialEq)]
pub enum DnsProbe {
    /// One or more A records
    Found(usize),
    /// NXDOMAIN or no A records
    NotFound,
    /// Any other resolution failure
    Failed(DomainCheckError),
}

impl DnsProbe {
    /// Whether the probe proves the domain is registered.
    pub fn has_record(&self) -> bool {
        matches!(self, DnsProbe::Found(n) if *n > 0)
    }
}

/// Resolves IPv4 address records for a domain.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    async fn probe(&self, domain: &DomainQuery) -> DnsProbe;
}

/// [`AddressResolver`] backed by hickory's Tokio resolver.
pub struct HickoryDnsChecker {
    resolver: TokioResolver,
    timeout: Duration,
}

impl HickoryDnsChecker {
    /// Build a resolver from the system configuration.
    ///
    /// Falls back to hickory's default upstreams when the system
    /// configuration cannot be read. Each query makes a single attempt.
    pub fn new(timeout: Duration) -> Self {
        let mut builder = TokioResolver::builder_tokio().unwrap_or_else(|e| {
            warn!(error = %e, "System resolver configuration unavailable, using defaults");
            TokioResolver::builder_with_config(
                ResolverConfig::default(),
                TokioConnectionProvider::default(),
            )
        });

        let options = builder.options_mut();
        options.timeout = timeout;
        options.attempts = 1;

        Self {
            resolver: builder.build(),
            timeout,
        }
    }
}

#[async_trait]
impl AddressResolver for HickoryDnsChecker {
    async fn probe(&self, domain: &DomainQuery) -> DnsProbe {
        let lookup =
            tokio::time::timeout(self.timeout, self.resolver.ipv4_lookup(domain.as_str())).await;

        let probe = match lookup {
            Ok(Ok(records)) => DnsProbe::Found(records.iter().count()),
            Ok(Err(e)) if e.is_no_records_found() || e.is_nx_domain() => DnsProbe::NotFound,
            Ok(Err(e)) => DnsProbe::Failed(DomainCheckError::dns(domain.as_str(), e.to_string())),
            Err(_) => DnsProbe::Failed(DomainCheckError::timeout("DNS lookup", self.timeout)),
        };

        debug!(domain = %domain, ?probe, "DNS pre-check finished");
        probe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validate_domain;

    #[test]
    fn test_has_record() {
        assert!(DnsProbe::Found(2).has_record());
        assert!(!DnsProbe::Found(0).has_record());
        assert!(!DnsProbe::NotFound.has_record());
        assert!(!DnsProbe::Failed(DomainCheckError::dns("a.com", "SERVFAIL")).has_record());
    }

    #[tokio::test]
    async fn test_reserved_invalid_tld_is_not_found() {
        // RFC 2606 reserves .invalid, so no resolver answers with records.
        let checker = HickoryDnsChecker::new(Duration::from_secs(2));
        let domain = validate_domain("nothing-here.invalid").unwrap();
        assert!(!checker.probe(&domain).await.has_record());
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_lookup_example_com() {
        let checker = HickoryDnsChecker::new(Duration::from_secs(3));
        let domain = validate_domain("example.com").unwrap();
        assert!(checker.probe(&domain).await.has_record());
    }
}
