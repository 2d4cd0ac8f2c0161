use anyhow::{Result, anyhow};
use memcached_webhook::{WebhookServer, cli, config::Config, tracing::setup_tracing};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;

    // Starting from rustls 0.22, each application must set its default crypto provider.
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Cannot install the default crypto provider"))?;

    info!(
        cert_file = %config.tls_config.cert_file.display(),
        key_file = %config.tls_config.key_file.display(),
        "starting memcached webhook"
    );

    let server = WebhookServer::new_from_config(config);
    if let Err(error) = server.run().await {
        error!(error = %error, "webhook server exited");
        process::exit(1);
    }

    Ok(())
}
