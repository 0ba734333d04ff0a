use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use staffbot::config::Settings;
use staffbot::profile::RuntimeProfile;
use staffbot::store::RecordStore;
use staffbot::{server, StaffBot};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let settings = Settings::parse();
    let profile = RuntimeProfile::detect();

    println!("--- [StaffBot HR Assistant] ---");
    println!("Detected Cores: {}", profile.logical_cores);
    println!("Worker Threads: {}", profile.worker_threads);
    println!("Roster: {}", settings.data.display());
    println!("Response Mode: {}", if settings.openai_api_key.as_deref().is_some_and(|k| !k.trim().is_empty()) { "Generative (with template fallback)" } else { "Template" });
    println!("-------------------------------");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
    .worker_threads(profile.worker_threads)
    .enable_all()
    .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async_main(settings))
}

async fn async_main(settings: Settings) -> ExitCode {
    tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,staffbot=info")))
    .with_target(false)
    .with_level(true)
    .init();

    let addr: SocketAddr = match settings.addr.parse() {
        Ok(a) => a,
        Err(e) => {
            error!(addr = %settings.addr, error = %e, "invalid listen address");
            return ExitCode::FAILURE;
        }
    };
    if settings.top_k == 0 {
        error!("--top-k must be positive");
        return ExitCode::FAILURE;
    }

    let store = match RecordStore::load(&settings.data) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to load roster");
            return ExitCode::FAILURE;
        }
    };

    let composer = match settings.composer() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to configure text generation");
            return ExitCode::FAILURE;
        }
    };

    let encoder = match settings.encoder() {
        Ok(e) => e,
        Err(e) => {
            error!(error = %e, "failed to configure embedding model");
            return ExitCode::FAILURE;
        }
    };

    info!("building employee index");
    let bot = match StaffBot::build(store, encoder, composer).await {
        Ok(b) => Arc::new(b),
        Err(e) => {
            error!(error = %e, "failed to build employee index");
            return ExitCode::FAILURE;
        }
    };
    info!(?bot, "ready");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        info!("shutting down");
    };

    if let Err(e) = server::run(bot, settings.top_k, addr, shutdown).await {
        error!(%addr, error = %e, "cannot bind HTTP listener");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
