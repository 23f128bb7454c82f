//! Text rendering of status and domain listings.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::certbot::CertificateInfo;
use crate::nginx::DomainEntry;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub auto_renew: bool,
    pub scan_interval: u64,
    pub certificates: Vec<CertificateInfo>,
    /// Hosts that would be provisioned by the next scan
    pub domains_lacking_tls: BTreeSet<String>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SSL Bot status report")?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(
            f,
            "Auto-renew: {}, scan interval: {}s",
            if self.auto_renew { "enabled" } else { "disabled" },
            self.scan_interval
        )?;
        writeln!(f)?;

        if self.certificates.is_empty() {
            writeln!(f, "No certificates found")?;
        }
        for certificate in &self.certificates {
            let domains = if certificate.domains.is_empty() {
                NOT_AVAILABLE.to_string()
            } else {
                certificate.domains.join(" ")
            };
            writeln!(f, "Certificate: {}", certificate.name)?;
            writeln!(f, "  Domains: {domains}")?;
            writeln!(
                f,
                "  Expires: {}",
                certificate.expiry.as_deref().unwrap_or(NOT_AVAILABLE)
            )?;
            writeln!(
                f,
                "  Path:    {}",
                certificate.path.as_deref().unwrap_or(NOT_AVAILABLE)
            )?;
            writeln!(f, "{}", "-".repeat(30))?;
        }

        if !self.domains_lacking_tls.is_empty() {
            let domains: Vec<&str> = self.domains_lacking_tls.iter().map(String::as_str).collect();
            writeln!(f)?;
            writeln!(f, "Domains without TLS: {}", domains.join(", "))?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DomainListing(pub Vec<DomainEntry>);

impl fmt::Display for DomainListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configured domains:")?;
        for entry in &self.0 {
            let state = if entry.enabled { "enabled" } else { "disabled" };
            writeln!(f, "  - {} ({state})", entry.domain)?;
        }
        Ok(())
    }
}
