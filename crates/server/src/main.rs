use std::future::{Future, IntoFuture};

use anyhow::Error as AnyhowError;
use db::DbErr;
use server::{DeploymentImpl, http};
use thiserror::Error;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, prelude::*};

const GRACEFUL_SHUTDOWN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
const JOB_GC_INTERVAL: std::time::Duration = std::time::Duration::from_secs(30 * 60);
const DEFAULT_DATABASE_URL: &str = "sqlite://work_assignments.sqlite?mode=rwc";

#[derive(Debug, Error)]
pub enum OpsServerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

fn spawn_background<F>(task: F) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(task)
}

#[tokio::main]
async fn main() -> Result<(), OpsServerError> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,server={level},services={level},db={level},utils={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string).expect("Failed to create tracing filter");
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let deployment = DeploymentImpl::new(&database_url).await?;

    // Finished bulk jobs are held for polling; sweep the stale ones on
    // a fixed cadence.
    let job_queue = deployment.job_queue().clone();
    spawn_background(async move {
        let mut interval = tokio::time::interval(JOB_GC_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            job_queue.cleanup_old_jobs();
        }
    });

    let app_router = http::router(deployment);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.trim().parse::<u16>().ok())
        .unwrap_or(3001);
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    let actual_port = listener.local_addr()?.port();
    tracing::info!("Server running on http://{host}:{actual_port}");

    let shutdown_rx = spawn_shutdown_watcher();

    let server = axum::serve(listener, app_router)
        .with_graceful_shutdown(wait_for_watch_true(shutdown_rx.clone()))
        .into_future();
    tokio::pin!(server);

    let serve_result = tokio::select! {
        res = &mut server => res,
        _ = shutdown_deadline(shutdown_rx.clone()) => {
            tracing::warn!(
                "Graceful shutdown timed out after {:?}, exiting immediately",
                GRACEFUL_SHUTDOWN_TIMEOUT
            );
            std::process::exit(130);
        }
    };
    serve_result?;
    tracing::info!("Server shut down cleanly");
    Ok(())
}

fn spawn_shutdown_watcher() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Shutdown signal received, finishing in-flight requests");
        let _ = tx.send(true);
        wait_for_signal().await;
        tracing::warn!("Second shutdown signal, exiting immediately");
        std::process::exit(130);
    });
    rx
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn wait_for_watch_true(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}

async fn shutdown_deadline(rx: watch::Receiver<bool>) {
    wait_for_watch_true(rx).await;
    tokio::time::sleep(GRACEFUL_SHUTDOWN_TIMEOUT).await;
}
