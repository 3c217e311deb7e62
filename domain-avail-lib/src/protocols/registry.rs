//! WHOIS server selection per TLD.
//!
//! A small built-in table covers the registries that see most traffic. Any
//! other TLD starts at IANA, whose `refer:` line names the registry server and
//! is then followed as the single referral hop.

use std::collections::HashMap;

/// IANA's WHOIS server, used when no registry server is known for a TLD.
pub const IANA_WHOIS_SERVER: &str = "whois.iana.org";

lazy_static::lazy_static! {
    static ref WHOIS_SERVERS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        // Generic TLDs
        m.insert("com", "whois.verisign-grs.com");
        m.insert("net", "whois.verisign-grs.com");
        m.insert("org", "whois.pir.org");
        m.insert("info", "whois.nic.info");
        m.insert("biz", "whois.nic.biz");
        m.insert("xyz", "whois.nic.xyz");
        m.insert("io", "whois.nic.io");
        m.insert("ai", "whois.nic.ai");
        m.insert("co", "whois.nic.co");
        m.insert("me", "whois.nic.me");
        m.insert("app", "whois.nic.google");
        m.insert("dev", "whois.nic.google");
        m.insert("page", "whois.nic.google");

        // Country code TLDs
        m.insert("us", "whois.nic.us");
        m.insert("uk", "whois.nic.uk");
        m.insert("de", "whois.denic.de");
        m.insert("fr", "whois.nic.fr");
        m.insert("nl", "whois.domain-registry.nl");
        m.insert("eu", "whois.eu");
        m.insert("ca", "whois.cira.ca");
        m.insert("au", "whois.auda.org.au");
        m.insert("jp", "whois.jprs.jp");
        m.insert("cn", "whois.cnnic.cn");
        m.insert("ru", "whois.tcinet.ru");
        m
    };
}

/// Built-in registry WHOIS server for a TLD, if any.
pub fn builtin_whois_server(tld: &str) -> Option<&'static str> {
    WHOIS_SERVERS.get(tld.to_lowercase().as_str()).copied()
}

/// Server to query first for a TLD.
///
/// Precedence: configured override, built-in table, IANA.
pub fn resolve_whois_server(tld: &str, overrides: &HashMap<String, String>) -> String {
    let tld = tld.to_lowercase();

    if let Some(server) = overrides.get(&tld) {
        return server.clone();
    }

    builtin_whois_server(&tld)
        .unwrap_or(IANA_WHOIS_SERVER)
        .to_string()
}
