use axum::Router;
use memcached_webhook::{
    WebhookServer,
    config::{Config, TlsConfig},
};
use std::{net::SocketAddr, path::PathBuf};

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 3443)),
        tls_config: TlsConfig {
            cert_file: PathBuf::from("/etc/certs/tls.crt"),
            key_file: PathBuf::from("/etc/certs/tls.key"),
        },
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

pub(crate) fn app(config: Config) -> Router {
    WebhookServer::new_from_config(config).router()
}
