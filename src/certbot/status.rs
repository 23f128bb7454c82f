use serde::Serialize;

use crate::process::{CommandRunner, Invocation, ProcessError};

/// One entry from `certbot certificates`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CertificateInfo {
    pub name: String,
    pub domains: Vec<String>,
    pub expiry: Option<String>,
    pub path: Option<String>,
}

/// Parse the human-readable listing printed by `certbot certificates`.
///
/// A value is everything after its field label, so expiry timestamps keep
/// their colons.
pub fn parse_certificates(output: &str) -> Vec<CertificateInfo> {
    let mut certificates: Vec<CertificateInfo> = Vec::new();

    for line in output.lines().map(str::trim) {
        if let Some(name) = line.strip_prefix("Certificate Name:") {
            certificates.push(CertificateInfo {
                name: name.trim().to_string(),
                ..CertificateInfo::default()
            });
            continue;
        }

        // Anything before the first certificate is preamble
        let Some(current) = certificates.last_mut() else {
            continue;
        };

        if let Some(domains) = line.strip_prefix("Domains:") {
            current.domains = domains.split_whitespace().map(str::to_string).collect();
        } else if let Some(expiry) = line.strip_prefix("Expiry Date:") {
            current.expiry = Some(expiry.trim().to_string());
        } else if let Some(path) = line.strip_prefix("Certificate Path:") {
            current.path = Some(path.trim().to_string());
        }
    }

    certificates
}

pub fn list_certificates<R: CommandRunner>(
    runner: &R,
    certbot_binary: &str,
) -> Result<Vec<CertificateInfo>, ProcessError> {
    let output = runner.run_checked(&Invocation::new(certbot_binary).arg("certificates"))?;
    Ok(parse_certificates(&output.stdout))
}
