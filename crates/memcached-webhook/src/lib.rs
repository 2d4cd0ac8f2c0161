mod api;
mod certs;
pub mod cli;
pub mod config;
pub mod decision;
pub mod memcached;
pub mod tracing;

use admission_review::Scheme;
use anyhow::Result;
use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::HeaderMap,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{admission_handler, readiness_handler};
use crate::api::state::ApiServerState;
use crate::config::{Config, TlsConfig};
use crate::decision::AdmissionPhase;
use crate::memcached::Memcached;

/// Upper bound for AdmissionReview bodies. An UPDATE review carries both the
/// new and the old object, each one up to the size etcd accepts.
pub const MAX_ADMISSION_REVIEW_BODY_SIZE: usize = 8 * 1024 * 1024;

pub struct WebhookServer {
    router: Router,
    tls_config: TlsConfig,
    addr: SocketAddr,
}

impl WebhookServer {
    pub fn new_from_config(config: Config) -> Self {
        let state = Arc::new(ApiServerState { scheme: scheme() });

        WebhookServer {
            router: router(state),
            tls_config: config.tls_config,
            addr: config.addr,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve the webhook over HTTPS until the listener fails.
    /// Fails right away when the TLS material cannot be loaded.
    pub async fn run(self) -> Result<()> {
        let rustls_config =
            certs::create_tls_config_and_watch_certificate_changes(self.tls_config).await?;

        ::tracing::info!(address = %self.addr, "started HTTPS server");
        axum_server::bind_rustls(self.addr, rustls_config)
            .serve(self.router.into_make_service())
            .await?;

        Ok(())
    }
}

/// The kinds known by the webhook: the AdmissionReview envelopes and the
/// Memcached resource embedded inside of them.
pub fn scheme() -> Scheme {
    Scheme::default().register::<Memcached>()
}

fn router(state: Arc<ApiServerState>) -> Router {
    let mut router = Router::new().route("/readiness", get(readiness_handler));

    for phase in AdmissionPhase::ALL {
        router = router.route(
            phase.path(),
            post(
                move |state: State<Arc<ApiServerState>>, headers: HeaderMap, body: Bytes| {
                    admission_handler(phase, state, headers, body)
                },
            ),
        );
    }

    router
        .layer(DefaultBodyLimit::max(MAX_ADMISSION_REVIEW_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
