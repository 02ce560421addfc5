use clap::Parser;

mod cli;
mod config;
mod error;
mod models;
mod probe;
mod services;

use cli::CommandArgs;
use config::ProbeConfig;
use probe::{HealthProbe, EXIT_FAILED};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // 日志写到 stderr，stdout 只输出状态码
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CommandArgs::parse();
    let config = match ProbeConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {:#}", e);
            std::process::exit(EXIT_FAILED);
        }
    };

    log::debug!(
        "Probing '{}' via {:?} ({}), object {}",
        config.target,
        config.lister,
        config.list_command_line(),
        config.object_name
    );

    let probe = HealthProbe::from_config(&config);
    let mut stdout = std::io::stdout().lock();
    let code = probe.report(&mut stdout).await;
    drop(stdout);

    std::process::exit(code);
}
