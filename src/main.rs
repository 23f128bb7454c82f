use clap::{CommandFactory, Parser};
use std::process::ExitCode;
use tracing::error;

use ssl_bot::cli::{Cli, Operation};
use ssl_bot::logging::LogContext;
use ssl_bot::process::SystemRunner;
use ssl_bot::report::DomainListing;
use ssl_bot::{AppConfig, SslBot};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(operation) = cli.operation() else {
        if let Err(e) = Cli::command().print_help() {
            eprintln!("{e}");
        }
        return ExitCode::SUCCESS;
    };

    // Logging lives for the whole run
    let _logging = LogContext::install(&cli.log_settings());

    let config = AppConfig::load_or_default(&cli.config);
    let bot = SslBot::new(config, SystemRunner);

    match run(&bot, operation, cli.json) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run one operation; `Ok(false)` means it ran but reported failure.
fn run(bot: &SslBot<SystemRunner>, operation: Operation, json: bool) -> anyhow::Result<bool> {
    match operation {
        Operation::ScanAndApply => {
            let applied = bot.scan_and_apply();
            println!("Secured {applied} host(s)");
            Ok(true)
        }
        Operation::Renew => Ok(bot.renew().is_success()),
        Operation::Status => {
            let report = bot.status();
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
            Ok(true)
        }
        Operation::AddDomain { domain, webroot } => {
            match bot.add_domain(&domain, webroot.as_deref()) {
                Ok(secured) => {
                    println!("Set up {domain}; secured {secured} host(s)");
                    Ok(true)
                }
                Err(e) => {
                    error!("Failed to set up {}: {}", domain, e);
                    Ok(false)
                }
            }
        }
        Operation::ListDomains => {
            let listing = DomainListing(bot.list_domains());
            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print!("{listing}");
            }
            Ok(true)
        }
        Operation::ShowConfig => {
            print!("{}", bot.config().to_yaml()?);
            Ok(true)
        }
    }
}
