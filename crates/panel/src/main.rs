mod config;
mod error;
mod mqtt;
mod web;

use std::{env, sync::Arc};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::ExecutorKind;
use irrigation_engine::{clock, CommandExecutor, LocalExecutor, Session};
use mqtt::MqttExecutor;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // The local offset is only readable before the runtime spawns threads.
    let offset = clock::capture_local_offset();
    info!(%offset, "local time offset");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?
        .block_on(run())
}

async fn run() -> Result<()> {
    // ── Config file (zones, status, executor) ───────────────────────
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = config::load(&config_path)?;

    // ── Executor ────────────────────────────────────────────────────
    let executor: Box<dyn CommandExecutor> = match cfg.executor {
        ExecutorKind::Local => Box::new(LocalExecutor::new()),
        ExecutorKind::Mqtt => {
            let (exec, link) = MqttExecutor::connect(&cfg.mqtt);
            tokio::spawn(link.run());
            info!(host = %cfg.mqtt.host, port = cfg.mqtt.port, "mqtt executor ready");
            Box::new(exec)
        }
    };

    // ── Session ─────────────────────────────────────────────────────
    let state = cfg.initial_state();
    info!(
        zones = state.zones.len(),
        tick_ms = cfg.tick_ms,
        executor = ?cfg.executor,
        "controller starting"
    );

    let mut session = Session::new(state, executor).with_tick(cfg.tick());
    if let Some(seed) = cfg.seed {
        session = session.with_seed(seed);
    }
    let session = Arc::new(session);

    // ── Web server ──────────────────────────────────────────────────
    let web_session = Arc::clone(&session);
    let port = cfg.web.port;
    let server = tokio::spawn(web::serve(web_session, port));

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for ctrl-c")?;
            info!("shutdown requested");
        }
        res = server => {
            session.shutdown().await;
            return res.context("web server task failed")?;
        }
    }

    session.shutdown().await;
    Ok(())
}
