mod args;
mod clients;
mod config;
mod domain;
mod error;
mod http;
mod ip;
mod updater;

use clap::CommandFactory;
use std::process::ExitCode;
use updater::Outcome;

/// User-Agent header value for HTTP requests
pub const USER_AGENT: &str = concat!("ddns/", env!("CARGO_PKG_VERSION"));

fn init_logger(verbose: bool, debug: bool, quiet: bool) {
    let log_level = if quiet {
        log::LevelFilter::Error
    } else if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Dependencies stay at warn unless more output is requested
    let dependency_level = if verbose || debug {
        log_level
    } else {
        log_level.min(log::LevelFilter::Warn)
    };

    env_logger::builder()
        .filter(None, dependency_level)
        .filter_module(env!("CARGO_CRATE_NAME"), log_level)
        .parse_default_env()
        .init();
}

fn run(args: &args::Args) -> error::Result<Outcome> {
    // Load and merge configuration
    let config = config::Config::load(args)?;

    // Display help if nothing names a provider
    if config.provider.is_none() {
        args::Args::command().print_help()?;
    }
    config.validate()?;

    let provider = config.provider.as_deref().unwrap_or_default();
    let domain = config.domain().unwrap_or_default();

    log::info!("Starting {} DNS updater for {}...", provider, domain);

    // Credentials are checked here, before any network call
    let client = clients::create_client(provider, &config)?;
    log::info!("Using provider: {}", client.provider_name());

    let suffixes = domain::load_suffix_list(config.suffix_list.as_deref())?;

    updater::run(
        client.as_ref(),
        domain,
        &config.ip_source(),
        &ip::SystemResolver,
        suffixes.as_ref(),
    )
}

fn main() -> ExitCode {
    let args = args::Args::new();

    init_logger(args.verbose, args.debug, args.quiet);

    match run(&args) {
        Ok(Outcome::Updated(ip)) => {
            log::info!("IP address: {}", ip);
            ExitCode::SUCCESS
        }
        Ok(Outcome::Unchanged(ip)) => {
            log::info!("IP address: {} (unchanged)", ip);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
