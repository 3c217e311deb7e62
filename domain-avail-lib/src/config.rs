//! Configuration file parsing and management.
//!
//! Settings are layered, lowest precedence first: built-in defaults, TOML
//! files, `DA_*` environment variables, then whatever the binary applies from
//! its command line. Each layer only overrides the values it sets.

use crate::error::DomainCheckError;
use crate::protocols::detect::SignatureDetector;
use crate::types::CheckConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Port the service listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 57777;

/// Address the service binds to unless configured otherwise.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Where the HTTP service listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Listening address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerSection>,

    /// Lookup strategy and timeouts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup: Option<LookupSection>,

    /// WHOIS transport and classification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois: Option<WhoisSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ServerSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LookupSection {
    /// Run the DNS pre-check before WHOIS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_precheck: Option<bool>,

    /// WHOIS referral hops to follow (0 or 1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow: Option<u8>,

    /// Per-domain lookup timeout (e.g. "30s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// DNS pre-check timeout (e.g. "3s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_timeout: Option<String>,

    /// WHOIS exchange timeout (e.g. "10s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_timeout: Option<String>,

    /// Bound on in-flight lookups per batch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WhoisSection {
    /// TCP port for WHOIS queries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Replaces the built-in availability signatures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<String>>,

    /// Appended to the active signature list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_signatures: Option<Vec<String>>,

    /// Replaces the structured status values meaning "available"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_statuses: Option<Vec<String>>,

    /// Per-TLD server overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<HashMap<String, String>>,
}

impl FileConfig {
    /// Apply the values this file sets on top of existing settings.
    pub fn apply(
        &self,
        server: &mut ServerConfig,
        check: &mut CheckConfig,
    ) -> Result<(), DomainCheckError> {
        if let Some(section) = &self.server {
            if let Some(host) = &section.host {
                server.host = host.clone();
            }
            if let Some(port) = section.port {
                server.port = port;
            }
        }

        if let Some(section) = &self.lookup {
            if let Some(enabled) = section.dns_precheck {
                check.dns_precheck = enabled;
            }
            if let Some(follow) = section.follow {
                check.follow = follow;
            }
            if let Some(timeout) = &section.timeout {
                check.lookup_timeout = require_duration("lookup.timeout", timeout)?;
            }
            if let Some(timeout) = &section.dns_timeout {
                check.dns_timeout = require_duration("lookup.dns_timeout", timeout)?;
            }
            if let Some(timeout) = &section.whois_timeout {
                check.whois_timeout = require_duration("lookup.whois_timeout", timeout)?;
            }
            if let Some(limit) = section.max_concurrency {
                check.max_concurrency = Some(limit);
            }
        }

        if let Some(section) = &self.whois {
            if let Some(port) = section.port {
                check.whois_port = port;
            }
            if let Some(signatures) = &section.signatures {
                check.availability_signatures = signatures.clone();
            }
            if let Some(extra) = &section.extra_signatures {
                check.availability_signatures.extend(extra.iter().cloned());
            }
            if let Some(statuses) = &section.available_statuses {
                check.available_statuses = statuses.clone();
            }
            if let Some(servers) = &section.servers {
                for (tld, host) in servers {
                    check
                        .whois_servers
                        .insert(tld.to_lowercase(), host.clone());
                }
            }
        }

        Ok(())
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Base name used for discovered files (`<name>.toml`, `.<name>.toml`)
    app_name: &'static str,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new() -> Self {
        Self {
            app_name: "domain-avail",
        }
    }

    /// Load an explicit file if given, otherwise discover and merge.
    pub fn load(&self, explicit: Option<&Path>) -> Result<FileConfig, DomainCheckError> {
        match explicit {
            Some(path) => self.load_file(path),
            None => self.discover_and_load(),
        }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DomainCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DomainCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            DomainCheckError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;
        debug!(path = %path.display(), "Loaded configuration file");

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config, then the home directory, then the working directory; later
    /// files override earlier ones. Files that fail to load are skipped with
    /// a warning.
    pub fn discover_and_load(&self) -> Result<FileConfig, DomainCheckError> {
        let mut merged_config = FileConfig::default();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    info!(path = %path.display(), "Using configuration file");
                    merged_config = self.merge_configs(merged_config, config);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Ignoring configuration file"),
            }
        }

        Ok(merged_config)
    }

    /// Configuration file in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = [
            format!("./{}.toml", self.app_name),
            format!("./.{}.toml", self.app_name),
        ];

        candidates
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Configuration file in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let candidates = [
            format!(".{}.toml", self.app_name),
            format!("{}.toml", self.app_name),
        ];

        candidates
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join(self.app_name).join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations. Values from `higher` take precedence.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            server: match (lower.server, higher.server) {
                (Some(lower), Some(higher)) => Some(ServerSection {
                    host: higher.host.or(lower.host),
                    port: higher.port.or(lower.port),
                }),
                (lower, higher) => higher.or(lower),
            },
            lookup: match (lower.lookup, higher.lookup) {
                (Some(lower), Some(higher)) => Some(LookupSection {
                    dns_precheck: higher.dns_precheck.or(lower.dns_precheck),
                    follow: higher.follow.or(lower.follow),
                    timeout: higher.timeout.or(lower.timeout),
                    dns_timeout: higher.dns_timeout.or(lower.dns_timeout),
                    whois_timeout: higher.whois_timeout.or(lower.whois_timeout),
                    max_concurrency: higher.max_concurrency.or(lower.max_concurrency),
                }),
                (lower, higher) => higher.or(lower),
            },
            whois: match (lower.whois, higher.whois) {
                (Some(lower), Some(higher)) => Some(WhoisSection {
                    port: higher.port.or(lower.port),
                    signatures: higher.signatures.or(lower.signatures),
                    extra_signatures: merge_lists(lower.extra_signatures, higher.extra_signatures),
                    available_statuses: higher.available_statuses.or(lower.available_statuses),
                    servers: match (lower.servers, higher.servers) {
                        (Some(mut lower_servers), Some(higher_servers)) => {
                            lower_servers.extend(higher_servers);
                            Some(lower_servers)
                        }
                        (lower_servers, higher_servers) => higher_servers.or(lower_servers),
                    },
                }),
                (lower, higher) => higher.or(lower),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), DomainCheckError> {
        if let Some(server) = &config.server {
            if server.port == Some(0) {
                return Err(DomainCheckError::config("server.port must be non-zero"));
            }
        }

        if let Some(lookup) = &config.lookup {
            if matches!(lookup.follow, Some(f) if f > 1) {
                return Err(DomainCheckError::config(
                    "lookup.follow must be 0 or 1: only one WHOIS referral is ever followed",
                ));
            }
            if lookup.max_concurrency == Some(0) {
                return Err(DomainCheckError::config(
                    "lookup.max_concurrency must be at least 1",
                ));
            }
            for (name, value) in [
                ("lookup.timeout", &lookup.timeout),
                ("lookup.dns_timeout", &lookup.dns_timeout),
                ("lookup.whois_timeout", &lookup.whois_timeout),
            ] {
                if let Some(value) = value {
                    require_duration(name, value)?;
                }
            }
        }

        if let Some(whois) = &config.whois {
            if whois.port == Some(0) {
                return Err(DomainCheckError::config("whois.port must be non-zero"));
            }
            if let Some(signatures) = &whois.signatures {
                if signatures.is_empty() {
                    return Err(DomainCheckError::config(
                        "whois.signatures cannot be empty",
                    ));
                }
                SignatureDetector::new(signatures)?;
            }
            if let Some(extra) = &whois.extra_signatures {
                SignatureDetector::new(extra)?;
            }
            if let Some(servers) = &whois.servers {
                for (tld, host) in servers {
                    if tld.is_empty() || tld.contains('.') || host.trim().is_empty() {
                        return Err(DomainCheckError::config(format!(
                            "Invalid WHOIS server override '{}' = '{}'",
                            tld, host
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_lists(lower: Option<Vec<String>>, higher: Option<Vec<String>>) -> Option<Vec<String>> {
    match (lower, higher) {
        (Some(mut lower), Some(higher)) => {
            lower.extend(higher);
            Some(lower)
        }
        (lower, higher) => higher.or(lower),
    }
}

/// Environment variable configuration (`DA_*`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dns_precheck: Option<bool>,
    pub follow: Option<u8>,
    pub timeout: Option<Duration>,
    pub dns_timeout: Option<Duration>,
    pub whois_timeout: Option<Duration>,
    pub max_concurrency: Option<usize>,
    pub config: Option<PathBuf>,
}

impl EnvConfig {
    /// Parse settings through an arbitrary variable lookup.
    ///
    /// Invalid values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env_config = EnvConfig::default();

        if let Some(host) = lookup("DA_HOST").filter(|h| !h.trim().is_empty()) {
            env_config.host = Some(host.trim().to_string());
        }

        env_config.port = parse_env(&lookup, "DA_PORT", "a port number 1-65535", |v| {
            v.parse::<u16>().ok().filter(|p| *p > 0)
        });
        env_config.dns_precheck = parse_env(&lookup, "DA_DNS_PRECHECK", "true/false", parse_bool);
        env_config.follow = parse_env(&lookup, "DA_FOLLOW", "0 or 1", |v| {
            v.parse::<u8>().ok().filter(|f| *f <= 1)
        });
        env_config.timeout = parse_env(
            &lookup,
            "DA_TIMEOUT",
            "a duration like '30s'",
            parse_duration_string,
        );
        env_config.dns_timeout = parse_env(
            &lookup,
            "DA_DNS_TIMEOUT",
            "a duration like '3s'",
            parse_duration_string,
        );
        env_config.whois_timeout = parse_env(
            &lookup,
            "DA_WHOIS_TIMEOUT",
            "a duration like '10s'",
            parse_duration_string,
        );
        env_config.max_concurrency =
            parse_env(&lookup, "DA_MAX_CONCURRENCY", "a positive integer", |v| {
                v.parse::<usize>().ok().filter(|n| *n > 0)
            });

        if let Some(path) = lookup("DA_CONFIG").filter(|p| !p.trim().is_empty()) {
            env_config.config = Some(PathBuf::from(path));
        }

        env_config
    }

    /// Apply the variables that are set on top of existing settings.
    pub fn apply(&self, server: &mut ServerConfig, check: &mut CheckConfig) {
        if let Some(host) = &self.host {
            server.host = host.clone();
        }
        if let Some(port) = self.port {
            server.port = port;
        }
        if let Some(enabled) = self.dns_precheck {
            check.dns_precheck = enabled;
        }
        if let Some(follow) = self.follow {
            check.follow = follow;
        }
        if let Some(timeout) = self.timeout {
            check.lookup_timeout = timeout;
        }
        if let Some(timeout) = self.dns_timeout {
            check.dns_timeout = timeout;
        }
        if let Some(timeout) = self.whois_timeout {
            check.whois_timeout = timeout;
        }
        if let Some(limit) = self.max_concurrency {
            check.max_concurrency = Some(limit);
        }
    }
}

/// Load configuration from the process environment.
pub fn load_env_config() -> EnvConfig {
    EnvConfig::from_lookup(|name| env::var(name).ok())
}

fn parse_env<T, F, P>(lookup: &F, name: &str, expected: &str, parse: P) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    let raw = lookup(name)?;
    match parse(raw.trim()) {
        Some(value) => {
            debug!(variable = name, value = %raw, "Using environment override");
            Some(value)
        }
        None => {
            warn!(variable = name, value = %raw, "Invalid value, expected {}", expected);
            None
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a duration string like "500ms", "5s", "2m". A bare number is seconds.
///
/// Zero durations are rejected.
pub fn parse_duration_string(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    let duration = if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        value.parse::<u64>().ok().map(Duration::from_secs)
    }?;

    (!duration.is_zero()).then_some(duration)
}

fn require_duration(name: &str, value: &str) -> Result<Duration, DomainCheckError> {
    parse_duration_string(value).ok_or_else(|| {
        DomainCheckError::config(format!(
            "Invalid duration '{}' for {}. Use a format like '500ms', '5s', '2m'",
            value, name
        ))
    })
}
