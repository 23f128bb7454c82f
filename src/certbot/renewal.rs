use std::fmt;
use tracing::{error, info};

use crate::nginx::NginxController;
use crate::process::{CommandRunner, Invocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalStage {
    DryRun,
    Renew,
    Reload,
}

impl fmt::Display for RenewalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenewalStage::DryRun => "dry run",
            RenewalStage::Renew => "renewal",
            RenewalStage::Reload => "nginx reload",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewalOutcome {
    Renewed,
    Failed {
        stage: RenewalStage,
        diagnostic: String,
    },
}

impl RenewalOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RenewalOutcome::Renewed)
    }
}

/// Renew every certificate certbot manages.
///
/// Runs a dry run first, then the real renewal, then reloads nginx. The first
/// stage that fails stops the pipeline.
pub fn renew_certificates<R, C>(
    runner: &R,
    certbot_binary: &str,
    nginx: &NginxController<C>,
) -> RenewalOutcome
where
    R: CommandRunner,
    C: CommandRunner,
{
    info!("Starting certificate renewal");

    let dry_run = Invocation::new(certbot_binary).args(["renew", "--dry-run"]);
    if let Err(e) = runner.run_checked(&dry_run) {
        error!("Renewal dry run failed, skipping the real renewal: {}", e);
        return RenewalOutcome::Failed {
            stage: RenewalStage::DryRun,
            diagnostic: e.diagnostic(),
        };
    }

    let renew = Invocation::new(certbot_binary).args(["renew", "--quiet"]);
    if let Err(e) = runner.run_checked(&renew) {
        error!("Certificate renewal failed: {}", e);
        return RenewalOutcome::Failed {
            stage: RenewalStage::Renew,
            diagnostic: e.diagnostic(),
        };
    }
    info!("Certificates renewed");

    if let Err(e) = nginx.reload() {
        return RenewalOutcome::Failed {
            stage: RenewalStage::Reload,
            diagnostic: e.diagnostic(),
        };
    }

    RenewalOutcome::Renewed
}
