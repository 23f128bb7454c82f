use crate::config::AppConfig;
use crate::nginx::VirtualHostRecord;

/// Who certificates are registered to and which hosts are never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningPolicy {
    pub contact_address: String,
    /// A host is excluded when its name *contains* any of these
    pub excluded_domain_substrings: Vec<String>,
}

impl ProvisioningPolicy {
    pub fn new(contact_address: impl Into<String>, excluded: Vec<String>) -> Self {
        Self {
            contact_address: contact_address.into(),
            excluded_domain_substrings: excluded,
        }
    }
}

impl From<&AppConfig> for ProvisioningPolicy {
    fn from(config: &AppConfig) -> Self {
        Self::new(config.email.clone(), config.exclude_domains.clone())
    }
}

/// Why a host does or does not get a certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<'a> {
    AlreadySecured,
    Excluded { domain: &'a str, pattern: &'a str },
    Provision,
}

pub fn decide<'a>(record: &'a VirtualHostRecord, policy: &'a ProvisioningPolicy) -> Decision<'a> {
    if record.has_existing_tls() {
        return Decision::AlreadySecured;
    }

    for domain in record.server_names() {
        if let Some(pattern) = policy
            .excluded_domain_substrings
            .iter()
            .find(|pattern| domain.contains(pattern.as_str()))
        {
            return Decision::Excluded {
                domain: domain.as_str(),
                pattern: pattern.as_str(),
            };
        }
    }

    Decision::Provision
}

pub fn needs_provisioning(record: &VirtualHostRecord, policy: &ProvisioningPolicy) -> bool {
    decide(record, policy) == Decision::Provision
}
