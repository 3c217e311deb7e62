//! Error handling for domain availability lookups.
//!
//! Errors fall into two classes. Input errors (missing parameter, malformed
//! domain token) are detected before any I/O and abort the whole request.
//! Lookup errors (DNS, WHOIS, timeouts) are scoped to a single domain and are
//! converted into an unknown outcome by the orchestrator, never surfaced to
//! the caller as a failure.

use std::fmt;
use std::time::Duration;

/// Main error type for domain availability operations.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainCheckError {
    /// A required request parameter was absent or empty
    MissingParameter {
        name: String,
    },

    /// A domain token failed syntax validation
    InvalidDomain {
        domain: String,
        reason: String,
    },

    /// DNS resolution failed for a reason other than "name not found"
    DnsError {
        domain: String,
        message: String,
    },

    /// WHOIS protocol or response errors
    WhoisError {
        domain: String,
        message: String,
    },

    /// Network-related errors (connection refused, reset, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// Timeout errors when operations take too long
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// A WHOIS server refused the query because of rate limiting
    RateLimited {
        service: String,
        message: String,
    },

    /// Configuration errors (invalid settings, bad patterns, etc.)
    ConfigError {
        message: String,
    },

    /// File I/O errors when reading configuration
    FileError {
        path: String,
        message: String,
    },
}

impl DomainCheckError {
    /// Create a new missing parameter error.
    pub fn missing_parameter<N: Into<String>>(name: N) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new DNS error.
    pub fn dns<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::DnsError {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new WHOIS error.
    pub fn whois<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::WhoisError {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new rate limit error.
    pub fn rate_limited<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::RateLimited {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error belongs to the input class.
    ///
    /// Input errors are fatal to a request and map to a client error;
    /// everything else is a per-domain lookup failure.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter { .. } | Self::InvalidDomain { .. }
        )
    }
}

impl fmt::Display for DomainCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // The two input variants are rendered verbatim as the 400 body.
            Self::MissingParameter { name } => {
                write!(f, "{} parameter is required", name)
            }
            Self::InvalidDomain { domain, .. } => {
                write!(f, "\"{}\" is not a valid domain", domain)
            }
            Self::DnsError { domain, message } => {
                write!(f, "DNS error for '{}': {}", domain, message)
            }
            Self::WhoisError { domain, message } => {
                write!(f, "WHOIS error for '{}': {}", domain, message)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::RateLimited { service, message } => {
                write!(f, "Rate limited by {}: {}", service, message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for DomainCheckError {}

impl From<std::io::Error> for DomainCheckError {
    fn from(err: std::io::Error) -> Self {
        Self::network_with_source("I/O failure", err.to_string())
    }
}

impl From<regex::Error> for DomainCheckError {
    fn from(err: regex::Error) -> Self {
        Self::ConfigError {
            message: format!("Invalid availability signature: {}", err),
        }
    }
}
