//! WHOIS protocol implementation for domain availability checking.
//!
//! Queries go straight to port 43 over TCP: the domain followed by CRLF, then
//! the server's answer is read until it closes the connection. A response may
//! name a more specific server (a registrar, or the registry when the first
//! hop was IANA); at most one such referral is followed.

use crate::error::DomainCheckError;
use crate::protocols::registry::{resolve_whois_server, IANA_WHOIS_SERVER};
use crate::types::{CheckConfig, DomainQuery};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Standard WHOIS port.
pub const WHOIS_PORT: u16 = 43;

/// Responses larger than this are truncated.
const MAX_RESPONSE_BYTES: u64 = 1024 * 1024;

lazy_static::lazy_static! {
    static ref REFERRAL_RE: Regex = Regex::new(
        r"(?im)^[ \t]*(refer|whois|registrar whois server|whois server|referralserver)[ \t]*:[ \t]*(?:r?whois://)?([a-z0-9._-]+)(?::(\d+))?[ \t\r]*$"
    )
    .expect("referral pattern is valid");
}

const RATE_LIMIT_PATTERNS: &[&str] = &[
    "rate limit exceeded",
    "too many requests",
    "try again later",
    "quota exceeded",
    "limit exceeded",
    "rate-limited",
    "throttled",
];

/// Host (and optional port) of a WHOIS server a record refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Referral {
    pub host: String,
    pub port: Option<u16>,
}

/// One WHOIS exchange: who answered, what they said, and the parsed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct WhoisRecord {
    /// Server that produced this record
    pub server: String,

    /// Full response text
    pub raw: String,

    /// `key: value` lines in response order, keys lowercased
    pub fields: Vec<(String, String)>,

    /// More specific server this record points to, if any
    pub referral: Option<Referral>,
}

impl WhoisRecord {
    /// Parse raw response text received from `server`.
    pub fn parse(server: &str, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let fields = parse_fields(&raw);
        let referral = parse_referral(&raw);

        Self {
            server: server.to_string(),
            raw,
            fields,
            referral,
        }
    }

    /// All values of a field, matched case-insensitively.
    pub fn field_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

fn parse_fields(raw: &str) -> Vec<(String, String)> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with('%') && !line.starts_with('#') && !line.starts_with(">>>"))
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_lowercase(), value.trim().to_string()))
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .collect()
}

/// Find the server a response refers to.
///
/// `refer:` is IANA's canonical field and wins when present; otherwise the
/// first recognised referral line is used. `http(s)://` referrals are ignored.
fn parse_referral(raw: &str) -> Option<Referral> {
    let mut first = None;

    for caps in REFERRAL_RE.captures_iter(raw) {
        let host = caps[2].trim_end_matches('.').to_lowercase();
        if host.is_empty() {
            continue;
        }
        let referral = Referral {
            host,
            port: caps.get(3).and_then(|p| p.as_str().parse().ok()),
        };

        if caps[1].eq_ignore_ascii_case("refer") {
            return Some(referral);
        }
        if first.is_none() {
            first = Some(referral);
        }
    }

    first
}

/// Source of WHOIS records for a domain.
///
/// The production implementation is [`WhoisClient`]; tests substitute fakes.
#[async_trait]
pub trait WhoisSource: Send + Sync {
    /// Fetch the record to classify for `domain`, referral already followed.
    async fn lookup(&self, domain: &DomainQuery) -> Result<WhoisRecord, DomainCheckError>;
}

/// WHOIS client speaking the port-43 text protocol over Tokio TCP.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    /// Timeout for the whole exchange, referral included
    timeout: Duration,
    /// Port used when a server is not given an explicit one
    port: u16,
    /// Referral hops to follow (0 or 1)
    follow: u8,
    /// Per-TLD server overrides
    servers: HashMap<String, String>,
    /// Server asked for TLDs with no known registry server
    root_server: String,
}

impl WhoisClient {
    /// Create a new WHOIS client with default settings.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            port: WHOIS_PORT,
            follow: 1,
            servers: HashMap::new(),
            root_server: IANA_WHOIS_SERVER.to_string(),
        }
    }

    /// Create a new WHOIS client with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::new()
        }
    }

    /// Create a client from the engine configuration.
    pub fn from_config(config: &CheckConfig) -> Self {
        Self {
            timeout: config.whois_timeout,
            port: config.whois_port,
            follow: config.follow.min(1),
            servers: config.whois_servers.clone(),
            root_server: IANA_WHOIS_SERVER.to_string(),
        }
    }

    /// Ask `host` instead of IANA for TLDs with no known registry server.
    pub fn with_root_server<H: Into<String>>(mut self, host: H) -> Self {
        self.root_server = host.into();
        self
    }

    /// Server that receives the first query for a TLD.
    pub fn server_for(&self, tld: &str) -> String {
        match resolve_whois_server(tld, &self.servers) {
            server if server == IANA_WHOIS_SERVER => self.root_server.clone(),
            server => server,
        }
    }

    /// Query the TLD's server and follow at most one referral.
    ///
    /// # Errors
    ///
    /// Returns `DomainCheckError` if:
    /// - A server cannot be reached or the connection fails mid-read
    /// - A response is empty or reports rate limiting
    /// - The TLD has no registry WHOIS server to ask
    /// - The exchange exceeds the configured timeout
    pub async fn check_domain(
        &self,
        domain: &DomainQuery,
    ) -> Result<WhoisRecord, DomainCheckError> {
        tokio::time::timeout(self.timeout, self.lookup_with_referral(domain))
            .await
            .map_err(|_| DomainCheckError::timeout("WHOIS query", self.timeout))?
    }

    async fn lookup_with_referral(
        &self,
        domain: &DomainQuery,
    ) -> Result<WhoisRecord, DomainCheckError> {
        let server = self.server_for(&domain.tld());
        let from_root = server.eq_ignore_ascii_case(&self.root_server);
        let record = self.query(domain.as_str(), &server, self.port).await?;

        let referral = record
            .referral
            .clone()
            .filter(|r| self.follow > 0 && !is_same_server(&record.server, self.port, r));

        match referral {
            Some(referral) => {
                let port = referral.port.unwrap_or(self.port);
                debug!(
                    domain = %domain,
                    from = %record.server,
                    to = %referral.host,
                    port,
                    "Following WHOIS referral"
                );
                self.query(domain.as_str(), &referral.host, port).await
            }
            // The root only describes the TLD, never the domain.
            None if from_root => Err(DomainCheckError::whois(
                domain.as_str(),
                "Unsupported TLD: no registry WHOIS server",
            )),
            None => Ok(record),
        }
    }

    /// Single WHOIS exchange with one server.
    async fn query(
        &self,
        domain: &str,
        host: &str,
        port: u16,
    ) -> Result<WhoisRecord, DomainCheckError> {
        let mut stream = TcpStream::connect((host, port)).await.map_err(|e| {
            DomainCheckError::network_with_source(
                format!("Failed to connect to WHOIS server {}:{}", host, port),
                e.to_string(),
            )
        })?;

        stream.write_all(query_line(host, domain).as_bytes()).await?;

        let mut buf = Vec::new();
        (&mut stream)
            .take(MAX_RESPONSE_BYTES)
            .read_to_end(&mut buf)
            .await?;

        let raw = String::from_utf8_lossy(&buf).into_owned();
        debug!(
            domain,
            server = host,
            bytes = buf.len(),
            "WHOIS response received"
        );

        check_response(domain, host, &raw)?;
        Ok(WhoisRecord::parse(host, raw))
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WhoisSource for WhoisClient {
    async fn lookup(&self, domain: &DomainQuery) -> Result<WhoisRecord, DomainCheckError> {
        self.check_domain(domain).await
    }
}

/// Line sent to the server. DENIC needs its own query syntax.
fn query_line(host: &str, domain: &str) -> String {
    if host.eq_ignore_ascii_case("whois.denic.de") {
        format!("-T dn,ace {}\r\n", domain)
    } else {
        format!("{}\r\n", domain)
    }
}

fn is_same_server(host: &str, port: u16, referral: &Referral) -> bool {
    referral.host.eq_ignore_ascii_case(host) && referral.port.unwrap_or(port) == port
}

/// Reject responses that carry no usable registration data.
fn check_response(domain: &str, host: &str, raw: &str) -> Result<(), DomainCheckError> {
    if raw.trim().is_empty() {
        return Err(DomainCheckError::whois(
            domain,
            format!("Empty response from {}", host),
        ));
    }

    let lower = raw.to_lowercase();

    if RATE_LIMIT_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Err(DomainCheckError::rate_limited(
            host,
            "WHOIS server refused the query",
        ));
    }

    Ok(())
}
