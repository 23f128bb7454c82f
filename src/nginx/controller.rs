use tracing::{error, info};

use crate::config::NginxConfig;
use crate::process::{CommandRunner, Invocation, ProcessError};

/// Tests and reloads the running nginx
pub struct NginxController<R> {
    runner: R,
    binary: String,
    service_manager: String,
    service_name: String,
}

impl<R: CommandRunner> NginxController<R> {
    pub fn new(config: &NginxConfig, runner: R) -> Self {
        Self {
            runner,
            binary: config.binary.clone(),
            service_manager: config.service_manager.clone(),
            service_name: config.service_name.clone(),
        }
    }

    /// `nginx -t`
    pub fn test_config(&self) -> Result<(), ProcessError> {
        self.runner
            .run_checked(&Invocation::new(&self.binary).arg("-t"))
            .map(|_| ())
    }

    /// Reload nginx, refusing to do so when the configuration self-test fails.
    pub fn reload(&self) -> Result<(), ProcessError> {
        if let Err(e) = self.test_config() {
            error!("nginx configuration test failed, not reloading: {}", e);
            return Err(e);
        }

        let reload = Invocation::new(&self.service_manager)
            .arg("reload")
            .arg(&self.service_name);
        if let Err(e) = self.runner.run_checked(&reload) {
            error!("nginx reload failed: {}", e);
            return Err(e);
        }

        info!("nginx reloaded");
        Ok(())
    }
}
