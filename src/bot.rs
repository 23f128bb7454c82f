//! The operations behind each command line mode.

use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, error, info};

use crate::certbot::{
    build_issuance_request, decide, list_certificates, needs_provisioning, renew_certificates,
    Decision, Issuer, ProvisioningPolicy, RenewalOutcome,
};
use crate::config::AppConfig;
use crate::nginx::sites::{self, SiteError};
use crate::nginx::{discover_config_files, read_records, scan, DomainEntry, NginxController};
use crate::process::CommandRunner;
use crate::report::StatusReport;

pub struct SslBot<R> {
    config: AppConfig,
    policy: ProvisioningPolicy,
    runner: R,
}

impl<R: CommandRunner> SslBot<R> {
    pub fn new(config: AppConfig, runner: R) -> Self {
        let policy = ProvisioningPolicy::from(&config);
        Self {
            config,
            policy,
            runner,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn policy(&self) -> &ProvisioningPolicy {
        &self.policy
    }

    fn nginx(&self) -> NginxController<&R> {
        NginxController::new(&self.config.nginx, &self.runner)
    }

    fn config_dir(&self) -> &Path {
        &self.config.nginx.config_dir
    }

    /// Request certificates for every host without TLS. Returns how many
    /// requests succeeded.
    ///
    /// Files are read one at a time, right before their hosts are handled,
    /// so a site certbot has just secured is seen as secured when it shows
    /// up again through `sites-enabled`.
    pub fn scan_and_apply(&self) -> usize {
        info!("Scanning nginx configuration in {}", self.config_dir().display());

        let issuer = Issuer::new(self.config.certbot.binary.as_str(), &self.runner);
        let mut applied = 0;

        for path in discover_config_files(self.config_dir()) {
            for record in read_records(&path) {
                match decide(&record, &self.policy) {
                    Decision::AlreadySecured => {
                        debug!("{} already has TLS", record.primary_domain());
                    }
                    Decision::Excluded { domain, pattern } => {
                        info!(
                            "Skipping {}: {} matches excluded pattern '{}'",
                            record.primary_domain(),
                            domain,
                            pattern
                        );
                    }
                    Decision::Provision => {
                        info!(
                            "Found host without TLS in {}: {}",
                            record.source_file().display(),
                            record.server_names().join(", ")
                        );
                        let request = build_issuance_request(&record, &self.policy);
                        if issuer.issue(&request).success {
                            applied += 1;
                        }
                    }
                }
            }
        }

        info!("Scan finished, secured {} host(s)", applied);
        applied
    }

    pub fn renew(&self) -> RenewalOutcome {
        let outcome = renew_certificates(&self.runner, &self.config.certbot.binary, &self.nginx());
        match &outcome {
            RenewalOutcome::Renewed => info!("Certificate renewal complete"),
            RenewalOutcome::Failed { stage, diagnostic } => {
                error!("Certificate renewal stopped at {}: {}", stage, diagnostic)
            }
        }
        outcome
    }

    /// Every host name that the next scan would request a certificate for
    pub fn domains_lacking_tls(&self) -> BTreeSet<String> {
        scan(self.config_dir())
            .iter()
            .filter(|record| needs_provisioning(record, &self.policy))
            .flat_map(|record| record.server_names().iter().cloned())
            .collect()
    }

    pub fn status(&self) -> StatusReport {
        let certificates = match list_certificates(&self.runner, &self.config.certbot.binary) {
            Ok(certificates) => certificates,
            Err(e) => {
                error!("Failed to read certificate status: {}", e);
                Vec::new()
            }
        };

        StatusReport {
            auto_renew: self.config.auto_renew,
            scan_interval: self.config.scan_interval,
            certificates,
            domains_lacking_tls: self.domains_lacking_tls(),
        }
    }

    /// Create a site for `domain`, reload nginx, then run a scan so the new
    /// site gets its certificate. Returns the number of hosts the scan secured.
    pub fn add_domain(&self, domain: &str, webroot: Option<&Path>) -> Result<usize, SiteError> {
        sites::validate_domain(domain)?;

        let webroot = webroot
            .map(Path::to_path_buf)
            .unwrap_or_else(|| sites::default_webroot(&self.config.nginx.web_root_base, domain));
        info!("Setting up {} -> {}", domain, webroot.display());

        sites::create_web_directory(&self.runner, &webroot, domain, &self.config.nginx.web_user)?;
        sites::write_site_config(self.config_dir(), domain, &webroot)?;
        self.nginx().reload()?;
        info!("Domain {} is live over HTTP", domain);

        Ok(self.scan_and_apply())
    }

    pub fn list_domains(&self) -> Vec<DomainEntry> {
        sites::list_domains(self.config_dir())
    }
}
