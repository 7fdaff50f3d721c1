use agent_config::{Config, LoadOutcome};
use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

fn main() -> Result<()> {
    // RUST_LOG wins over the configured log level when set.
    let env_filter = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match agent_config::load(std::env::args_os().skip(1))? {
        LoadOutcome::Ready(config) => config,
        LoadOutcome::Exit { code, message } => {
            println!("{}", message.trim_end());
            std::process::exit(code);
        }
    };

    if !env_filter {
        handle.reload(EnvFilter::new(config.server.log_level.as_ref()))?;
    }

    config.log_deprecations();
    log_summary(&config);

    print!("{}", serde_yaml::to_string(&*config)?);
    Ok(())
}

fn log_summary(config: &Config) {
    info!(
        http_listen_port = config.server.http_listen_port,
        grpc_listen_port = config.server.grpc_listen_port,
        metrics_instances = config.metrics.configs.len(),
        logs_instances = config.logs.as_ref().map_or(0, |l| l.configs.len()),
        traces_instances = config.traces.configs.len(),
        integrations_enabled = config.integrations.any_enabled(),
        "configuration resolved"
    );

    if config.reload_port != 0 {
        info!(
            address = %config.reload_address,
            port = config.reload_port,
            "reload endpoint enabled"
        );
    }
}
