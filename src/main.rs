use anyhow::{Context, Result};
use hookcrab::{Config, DynTxtStore, InMemoryTxtStore, Supervisor};
use is_terminal::IsTerminal;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let config = config_init(std::env::args().nth(1))?;
    tracing::info!(
        "starting hookcrab (TXT only): DNS {}, hook API {}",
        config.dns_addrs,
        config.hook_addrs
    );

    let txt_store: DynTxtStore = Arc::new(InMemoryTxtStore::new());
    let supervisor = Supervisor::start(&config, txt_store).await?;
    supervisor.run_until(shutdown_signal()).await?;

    tracing::info!("goodbye");
    Ok(())
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_ansi(std::io::stdout().is_terminal()))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hookcrab=info".into()),
        )
        .init();
}

fn config_init(config_file: Option<String>) -> Result<Config> {
    match config_file {
        None => {
            tracing::debug!("no config file given, using defaults");
            Ok(Config::default())
        }
        Some(config_file) => {
            let config = Config::try_from_file(&config_file)
                .with_context(|| format!("loading config from {config_file}"))?;
            tracing::debug!("loaded config from {config_file}");
            Ok(config)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("unable to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("unable to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("quitting from Ctrl-C"),
        () = terminate => tracing::info!("quitting from SIGTERM"),
    }
}
