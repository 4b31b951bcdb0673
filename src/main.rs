//! arxiv-relay - Entry point for the digest relay

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arxiv_relay::config::Settings;
use arxiv_relay::providers::email::{ImapConfig, ImapCredentials, ImapProvider, MailboxProvider};
use arxiv_relay::services::{RelayReport, RelayService};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    let _guard = init_logging(settings.log_file.as_deref())?;

    tracing::info!("Starting arxiv-relay");

    let settings = Arc::new(settings);
    let mut provider = ImapProvider::new(
        ImapConfig::from_settings(&settings.server),
        ImapCredentials {
            username: settings.username.clone(),
            password: settings.password.clone(),
        },
    );
    let service = RelayService::new(Arc::clone(&settings));

    let Some(interval) = settings.relay.poll_interval() else {
        relay_pass(&service, &mut provider).await?;
        return Ok(());
    };

    tracing::info!(interval_secs = interval.as_secs(), "Polling for digests");
    loop {
        if let Err(e) = relay_pass(&service, &mut provider).await {
            tracing::error!("Relay pass failed: {:#}", e);
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                return Ok(());
            }
        }
    }
}

/// Logs in, relays every pending digest, and logs out again.
async fn relay_pass(service: &RelayService, provider: &mut ImapProvider) -> Result<RelayReport> {
    provider
        .authenticate()
        .await
        .context("failed to log in to the mailbox")?;

    let result = service.run_once(provider).await;

    if let Err(e) = provider.logout().await {
        tracing::warn!(error = %e, "Logout failed");
    }
    result.context("relay pass failed")
}

/// Logs to stderr, and additionally to `log_file` when set.
fn init_logging(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("LOG_FILE {} has no file name", path.display()))?;
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}
