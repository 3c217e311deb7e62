//! Input parsing and domain syntax validation.
//!
//! Everything here is pure: no I/O happens until the whole `domains`
//! parameter has been accepted.

use crate::error::DomainCheckError;
use crate::types::DomainQuery;
use url::Url;

/// Name of the request parameter carrying the domain list.
pub const DOMAINS_PARAM: &str = "domains";

/// Separator between domains in the request parameter.
pub const DOMAIN_SEPARATOR: char = ';';

/// Validate a single, already split domain token.
///
/// A token is accepted when, after trimming, `https://<token>` parses as a
/// URL and the token contains at least one dot. The first check rejects
/// embedded whitespace, scheme separators and characters that are illegal in
/// a URL authority. The second rejects single-label names like `localhost`.
///
/// # Errors
///
/// Returns [`DomainCheckError::InvalidDomain`] naming the trimmed token.
pub fn validate_domain(token: &str) -> Result<DomainQuery, DomainCheckError> {
    let trimmed = token.trim();

    if Url::parse(&format!("https://{}", trimmed)).is_err() {
        return Err(DomainCheckError::invalid_domain(
            trimmed,
            "Does not form a valid URL authority",
        ));
    }

    if !trimmed.contains('.') {
        return Err(DomainCheckError::invalid_domain(
            trimmed,
            "Domain name must contain at least one dot",
        ));
    }

    Ok(DomainQuery::new_unchecked(trimmed.to_string()))
}

/// Split and validate the raw `domains` parameter.
///
/// Validation is fail-fast: the first invalid token aborts parsing and the
/// remaining tokens are never looked at. Order and duplicates are preserved.
///
/// # Errors
///
/// - [`DomainCheckError::MissingParameter`] when the parameter is absent or empty
/// - [`DomainCheckError::InvalidDomain`] for the first token that fails validation
pub fn parse_domains_param(raw: Option<&str>) -> Result<Vec<DomainQuery>, DomainCheckError> {
    let raw = match raw {
        Some(value) if !value.is_empty() => value,
        _ => return Err(DomainCheckError::missing_parameter(DOMAINS_PARAM)),
    };

    raw.split(DOMAIN_SEPARATOR).map(validate_domain).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(queries: &[DomainQuery]) -> Vec<&str> {
        queries.iter().map(DomainQuery::as_str).collect()
    }

    #[test]
    fn test_validate_domain() {
        assert!(validate_domain("example.com").is_ok());
        assert!(validate_domain("sub.example.co.uk").is_ok());
        assert!(validate_domain("xn--bcher-kva.example").is_ok());
        assert!(validate_domain("  padded.org  ").is_ok());

        assert!(validate_domain("localhost").is_err());
        assert!(validate_domain("not a domain").is_err());
        assert!(validate_domain("").is_err());
        assert!(validate_domain("exa mple.com").is_err());
        assert!(validate_domain("bad<host>.com").is_err());
    }

    #[test]
    fn test_validate_domain_trims() {
        let query = validate_domain("  example.com\t").unwrap();
        assert_eq!(query.as_str(), "example.com");
    }

    #[test]
    fn test_invalid_token_is_named_trimmed() {
        let err = validate_domain("  not a domain ").unwrap_err();
        assert_eq!(
            err,
            DomainCheckError::invalid_domain("not a domain", "Does not form a valid URL authority")
        );
    }

    #[test]
    fn test_parse_missing_parameter() {
        assert_eq!(
            parse_domains_param(None).unwrap_err(),
            DomainCheckError::missing_parameter("domains")
        );
        assert_eq!(
            parse_domains_param(Some("")).unwrap_err(),
            DomainCheckError::missing_parameter("domains")
        );
    }

    #[test]
    fn test_parse_preserves_order_and_duplicates() {
        let queries = parse_domains_param(Some("b.org; a.com ;b.org")).unwrap();
        assert_eq!(tokens(&queries), vec!["b.org", "a.com", "b.org"]);
    }

    #[test]
    fn test_parse_fails_fast_on_first_invalid() {
        let err = parse_domains_param(Some("example.com;not a domain;localhost")).unwrap_err();
        assert_eq!(err.to_string(), "\"not a domain\" is not a valid domain");

        let err = parse_domains_param(Some("localhost;not a domain")).unwrap_err();
        assert_eq!(err.to_string(), "\"localhost\" is not a valid domain");
    }

    #[test]
    fn test_parse_rejects_empty_piece() {
        let err = parse_domains_param(Some("example.com;")).unwrap_err();
        assert_eq!(err.to_string(), "\"\" is not a valid domain");
    }

    #[test]
    fn test_parse_rejection_is_idempotent() {
        let first = parse_domains_param(Some("ok.com;exa mple.com")).unwrap_err();
        let second = parse_domains_param(Some("ok.com;exa mple.com")).unwrap_err();
        assert_eq!(first, second);
        assert!(first.is_input_error());
    }
}
