// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, sync::Arc};

use identity_gateway::{
    api::{router, HttpOptions},
    auth::{
        AuthGateway, CacheSweeper, HttpIdentityUpstream, IdentityCache, IdentityValidator,
        TrustedNetworks,
    },
    config::GatewayConfig,
    logging::init_tracing,
    state::AppState,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    info!(site_domain = %config.site_domain, "Identity provider and directory site");
    if config.allow_insecure_tls {
        warn!("ALLOW_INSECURE_TLS is enabled: upstream certificates are NOT verified");
    }

    let trusted = TrustedNetworks::from_entries(&config.trusted_ips);
    if trusted.is_empty() {
        info!("No trusted networks configured - all requests require authentication");
    } else {
        info!(
            count = trusted.len(),
            entries = ?config.trusted_ips,
            "Trusted networks configured"
        );
    }

    let upstream = HttpIdentityUpstream::new(
        config.site_domain.as_str(),
        config.upstream_timeout,
        config.allow_insecure_tls,
    )
    .expect("Failed to create HTTP client");

    let cache = Arc::new(IdentityCache::new(config.cache_ttl));
    let validator = IdentityValidator::new(Arc::new(upstream), cache.clone());
    let state = AppState::new(AuthGateway::new(trusted, validator));

    let shutdown = CancellationToken::new();
    let sweeper = CacheSweeper::new(cache)
        .with_interval(config.sweep_interval)
        .spawn(shutdown.clone());

    let app = router(state, &HttpOptions::from(&config));

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .expect("Failed to parse bind address");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");

    info!(%addr, "Identity gateway listening (docs at /docs)");

    tokio::spawn(wait_for_signal(shutdown.clone()));

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.clone().cancelled_owned())
    .await
    .expect("HTTP server failed");

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        warn!(error = %e, "Identity cache sweeper ended abnormally");
    }
    info!("Server stopped");
}

async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down server...");
    shutdown.cancel();
}
