use anyhow::Context;
use tracing::{info, warn};
use trim_pipeline::{FfmpegCopy, Trimmer};
use trim_server::config::Config;
use trim_server::{AppState, logging, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    logging::init_tracing(&config.log_filter);

    // A missing tool is a startup fault, not a per-request error.
    let (copier, version) = FfmpegCopy::detect(&config.ffmpeg)
        .await
        .with_context(|| format!("{} is required but could not be run", config.ffmpeg.display()))?;
    info!(program = %copier.program().display(), %version, "bounded copy tool found");

    let trimmer = Trimmer::new(copier, config.pipeline());
    let pipeline = trimmer.config();
    info!(
        temp_dir = %pipeline.temp_dir.display(),
        timeout = ?pipeline.timeout,
        accepted = ?pipeline.accepted_types,
        "pipeline configured"
    );

    let app = router(AppState::new(trimmer), config.max_upload_bytes);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    info!("trim server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let term = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let term = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = term => {},
    }

    warn!("shutdown signal received");
}
