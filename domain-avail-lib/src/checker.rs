//! Main domain checker implementation.
//!
//! `DomainChecker` is the resolution orchestrator: it runs the DNS pre-check
//! and the WHOIS classifier for each domain, one concurrent task per domain,
//! and turns every per-domain failure into an unknown outcome so a batch
//! always completes.

use crate::concurrent::ConcurrentProcessor;
use crate::error::DomainCheckError;
use crate::protocols::{
    AddressResolver, DnsProbe, HickoryDnsChecker, WhoisClassifier, WhoisClient, WhoisSource,
};
use crate::types::{CheckConfig, CheckMethod, DomainQuery, LookupOutcome, ResultBatch};
use crate::utils::parse_domains_param;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Coordinates availability lookups for batches of domains.
///
/// Cloning is cheap; clones share collaborators and configuration.
///
/// # Example
///
/// ```rust,no_run
/// use domain_avail_lib::{CheckConfig, DomainChecker};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = DomainChecker::with_config(CheckConfig::default())?;
///     let results = checker.check_param(Some("example.com;example.org")).await?;
///     println!("{}", serde_json::to_string(&results)?);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DomainChecker {
    /// Configuration settings for this checker instance
    config: Arc<CheckConfig>,
    /// DNS existence pre-check
    dns: Arc<dyn AddressResolver>,
    /// Source of WHOIS records
    whois: Arc<dyn WhoisSource>,
    /// Detector chain turning a record into a verdict
    classifier: Arc<WhoisClassifier>,
    /// Fan-out/fan-in runner
    processor: ConcurrentProcessor,
}

impl DomainChecker {
    /// Create a checker with default configuration.
    pub fn new() -> Result<Self, DomainCheckError> {
        Self::with_config(CheckConfig::default())
    }

    /// Create a checker using the production DNS resolver and WHOIS client.
    ///
    /// # Errors
    ///
    /// Returns [`DomainCheckError::ConfigError`] if an availability signature
    /// is not a valid regular expression.
    pub fn with_config(config: CheckConfig) -> Result<Self, DomainCheckError> {
        let dns = Arc::new(HickoryDnsChecker::new(config.dns_timeout));
        let whois = Arc::new(WhoisClient::from_config(&config));
        Self::with_components(config, dns, whois)
    }

    /// Create a checker around explicit collaborators.
    pub fn with_components(
        config: CheckConfig,
        dns: Arc<dyn AddressResolver>,
        whois: Arc<dyn WhoisSource>,
    ) -> Result<Self, DomainCheckError> {
        let classifier = WhoisClassifier::from_config(&config)?;
        let processor = ConcurrentProcessor::new(config.max_concurrency);

        debug!(
            dns_precheck = config.dns_precheck,
            follow = config.follow,
            signatures = config.availability_signatures.len(),
            max_concurrency = ?config.max_concurrency,
            "Domain checker ready"
        );

        Ok(Self {
            config: Arc::new(config),
            dns,
            whois,
            classifier: Arc::new(classifier),
            processor,
        })
    }

    /// Validate the raw `domains` parameter and check every domain in it.
    ///
    /// # Errors
    ///
    /// Only input errors are returned; lookup failures are reported inside
    /// the batch.
    pub async fn check_param(&self, raw: Option<&str>) -> Result<ResultBatch, DomainCheckError> {
        let domains = parse_domains_param(raw)?;
        Ok(self.check_domains(&domains).await)
    }

    /// Check validated domains concurrently.
    ///
    /// Returns one outcome per input, in input order.
    pub async fn check_domains(&self, domains: &[DomainQuery]) -> ResultBatch {
        let started = Instant::now();

        let outcomes = self
            .processor
            .run(
                domains,
                |domain| {
                    let checker = self.clone();
                    async move { checker.check_domain(&domain).await }
                },
                |domain, err| {
                    error!(domain = %domain, error = %err, "Lookup task aborted");
                    LookupOutcome::unknown(domain)
                },
            )
            .await;

        let available = outcomes
            .iter()
            .filter(|o| o.available == Some(true))
            .count();
        let unknown = outcomes.iter().filter(|o| o.available.is_none()).count();
        info!(
            domains = outcomes.len(),
            available,
            registered = outcomes.len() - available - unknown,
            unknown,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch resolved"
        );

        outcomes
    }

    /// Check one domain. Never fails: errors become an unknown outcome.
    pub async fn check_domain(&self, domain: &DomainQuery) -> LookupOutcome {
        let started = Instant::now();
        let timeout = self.config.lookup_timeout;

        let result = tokio::time::timeout(timeout, self.resolve(domain))
            .await
            .unwrap_or_else(|_| Err(DomainCheckError::timeout("domain lookup", timeout)));

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(domain = %domain, error = %e, "Lookup failed");
                LookupOutcome::unknown(domain)
            }
        };

        outcome.with_duration(started.elapsed())
    }

    /// The per-domain algorithm: DNS short-circuit, then WHOIS.
    async fn resolve(&self, domain: &DomainQuery) -> Result<LookupOutcome, DomainCheckError> {
        if self.config.dns_precheck {
            match self.dns.probe(domain).await {
                probe if probe.has_record() => {
                    return Ok(LookupOutcome::resolved(domain, false, CheckMethod::Dns));
                }
                DnsProbe::Failed(e) => {
                    debug!(domain = %domain, error = %e, "DNS pre-check inconclusive");
                }
                _ => {}
            }
        }

        let record = self.whois.lookup(domain).await?;
        let available = self.classifier.classify(&record);
        Ok(LookupOutcome::resolved(domain, available, CheckMethod::Whois))
    }

    /// Get the configuration for this checker.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }
}
