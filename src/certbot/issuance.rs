use serde::Serialize;
use tracing::{error, info};

use super::policy::ProvisioningPolicy;
use crate::nginx::VirtualHostRecord;
use crate::process::{CommandOutput, CommandRunner, Invocation, ProcessError};

// Install through the nginx plugin, never prompt, accept the subscriber agreement
const INSTALL_FLAGS: &[&str] = &["--nginx", "--non-interactive", "--agree-tos"];
// Redirect HTTP to HTTPS and send Strict-Transport-Security
const HARDENING_FLAGS: &[&str] = &["--redirect", "--hsts"];

/// Everything certbot needs to secure one virtual host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuanceRequest {
    domains: Vec<String>,
    contact_address: String,
}

impl IssuanceRequest {
    /// Certbot names the certificate after this one
    pub fn primary_domain(&self) -> &str {
        &self.domains[0]
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn contact_address(&self) -> &str {
        &self.contact_address
    }

    /// certbot arguments, without the binary
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = INSTALL_FLAGS.iter().map(|f| f.to_string()).collect();
        args.push("--email".to_string());
        args.push(self.contact_address.clone());
        args.extend(HARDENING_FLAGS.iter().map(|f| f.to_string()));
        for domain in &self.domains {
            args.push("-d".to_string());
            args.push(domain.clone());
        }
        args
    }

    pub fn invocation(&self, certbot_binary: &str) -> Invocation {
        Invocation::new(certbot_binary).args(self.to_args())
    }
}

pub fn build_issuance_request(
    record: &VirtualHostRecord,
    policy: &ProvisioningPolicy,
) -> IssuanceRequest {
    IssuanceRequest {
        domains: record.server_names().to_vec(),
        contact_address: policy.contact_address.clone(),
    }
}

/// Result of one certbot run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuanceOutcome {
    pub primary_domain: String,
    pub success: bool,
    pub diagnostic: String,
}

/// Zero exit status is success; anything else (including failing to start
/// certbot at all) is a failure carrying the captured error text.
pub fn interpret_issuance(
    request: &IssuanceRequest,
    result: Result<CommandOutput, ProcessError>,
) -> IssuanceOutcome {
    let (success, diagnostic) = match result {
        Ok(output) => (output.success(), output.diagnostic().to_string()),
        Err(e) => (false, e.to_string()),
    };

    IssuanceOutcome {
        primary_domain: request.primary_domain().to_string(),
        success,
        diagnostic,
    }
}

/// Submits issuance requests to certbot
pub struct Issuer<R> {
    runner: R,
    binary: String,
}

impl<R: CommandRunner> Issuer<R> {
    pub fn new(binary: impl Into<String>, runner: R) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    pub fn issue(&self, request: &IssuanceRequest) -> IssuanceOutcome {
        info!(
            "Requesting certificate for {}",
            request.domains().join(", ")
        );

        let result = self.runner.run(&request.invocation(&self.binary));
        let outcome = interpret_issuance(request, result);

        if outcome.success {
            info!("Certificate issued for {}", outcome.primary_domain);
        } else {
            error!(
                "Certificate request for {} failed: {}",
                outcome.primary_domain, outcome.diagnostic
            );
        }

        outcome
    }
}
