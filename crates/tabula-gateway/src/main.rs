// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tabula gateway: `/api/rows` and friends in front of NocoDB.

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{anyhow, Context, Result};
use axum::Router;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use clap::Parser;
use tabula_app_core::config::{ConfigService, ConfigStore};
use tabula_app_core::settings::{GatewaySettings, SETTINGS_KEY};
use tabula_config_fs::FsConfigStore;
use tabula_gateway::{demo, router, AppState};
use tabula_store::{NocoClient, RetryPolicy};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tabula row gateway")]
struct Args {
    /// TCP listener (e.g. 0.0.0.0:8787). Overrides settings and TABULA_LISTEN.
    #[arg(long)]
    listen: Option<SocketAddr>,
    /// NocoDB base URL. Overrides settings and NOCODB_URL.
    #[arg(long)]
    backend_url: Option<String>,
    /// Per-call backend timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Extra attempts for backend reads.
    #[arg(long)]
    retries: Option<u32>,
    /// Serve an empty in-memory schema instead of NocoDB.
    #[arg(long)]
    memory: bool,
    /// TLS certificate (PEM). If provided, key must also be provided.
    #[arg(long)]
    tls_cert: Option<PathBuf>,
    /// TLS private key (PEM). If provided, cert must also be provided.
    #[arg(long)]
    tls_key: Option<PathBuf>,
}

impl Args {
    fn apply(&self, settings: &mut GatewaySettings) {
        if let Some(listen) = self.listen {
            settings.listen = listen;
        }
        if let Some(url) = &self.backend_url {
            settings.backend_url.clone_from(url);
        }
        if let Some(ms) = self.timeout_ms {
            settings.request_timeout_ms = ms;
        }
        if let Some(retries) = self.retries {
            settings.max_retries = retries;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let settings = load_settings(&args)?;
    let app = if args.memory {
        info!("serving in-memory demo schema");
        router(AppState::new(demo::demo_store()).with_default_limit(settings.default_page_limit))
    } else {
        if settings.api_token.is_none() {
            warn!("NOCODB_API_TOKEN is not set; backend calls will be unauthenticated");
        }
        let policy = RetryPolicy {
            timeout: settings.request_timeout(),
            max_retries: settings.max_retries,
            backoff: settings.retry_backoff(),
        };
        info!(backend = %settings.backend_url, ?policy, "proxying NocoDB");
        let client = NocoClient::new(settings.backend_url.clone(), settings.api_token.clone(), policy);
        router(AppState::new(client).with_default_limit(settings.default_page_limit))
    };

    serve(app, settings.listen, args.tls_cert, args.tls_key).await
}

fn load_settings(args: &Args) -> Result<GatewaySettings> {
    let mut settings = match FsConfigStore::new() {
        Ok(store) => {
            info!(dir = %store.base().display(), "loading gateway settings");
            stored_settings(store)?
        }
        Err(err) => {
            warn!(?err, "FsConfigStore init failed; using default settings");
            GatewaySettings::default()
        }
    };
    settings.apply_env().context("apply environment overrides")?;
    args.apply(&mut settings);
    Ok(settings)
}

// Saved settings, or the defaults written out on first run.
fn stored_settings<S: ConfigStore>(store: S) -> Result<GatewaySettings> {
    ConfigService::new(store)
        .load_or_init(SETTINGS_KEY)
        .context("load gateway settings")
}

async fn serve(
    app: Router,
    listen: SocketAddr,
    tls_cert: Option<PathBuf>,
    tls_key: Option<PathBuf>,
) -> Result<()> {
    let handle = Handle::new();
    // graceful shutdown on Ctrl+C
    let shutdown = handle.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(?err, "ctrl-c handler unavailable; shutdown needs a signal");
            return;
        }
        info!("shutting down");
        shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    match (tls_cert, tls_key) {
        (Some(cert), Some(key)) => {
            // Another component may have installed a provider already.
            let _ = rustls::crypto::ring::default_provider().install_default();
            let tls_config = RustlsConfig::from_pem_file(cert, key)
                .await
                .context("load tls config")?;
            info!("gateway listening (TLS) on {listen}");
            axum_server::bind_rustls(listen, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        (None, None) => {
            info!("gateway listening on {listen}");
            axum_server::bind(listen)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        _ => {
            return Err(anyhow!(
                "must provide both --tls-cert and --tls-key or neither"
            ))
        }
    }
    Ok(())
}
