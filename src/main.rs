use anyhow::Result;
use ppth_exporter::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    tracing::info!("{} {} starting", version::NAME, version::VERSION);

    let app_config = config::AppConfig::load()?;

    let tautulli_repo = if app_config.tautulli_enabled() {
        Some(Arc::new(tautulli_repo::TautulliRepo::new(
            &app_config.tautulli_url,
            &app_config.tautulli_api_key,
        )?))
    } else {
        tracing::info!("TAUTULLI_API_KEY not set; Plex activity metrics disabled");
        None
    };

    let sysinfo_repo = Arc::new(sysinfo_repo::SysinfoRepo::new());

    let docker_repo = if app_config.enable_docker_metrics {
        match docker_repo::DockerRepo::connect() {
            Ok(repo) => Some(Arc::new(repo)),
            Err(e) => {
                tracing::warn!(error = %e, "Docker unavailable; container metrics disabled");
                None
            }
        }
    } else {
        tracing::info!("ENABLE_DOCKER_METRICS is false; container metrics disabled");
        None
    };

    let app = routes::app(tautulli_repo, sysinfo_repo, docker_repo);
    let addr = format!("{}:{}", app_config.bind_address, app_config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Serving metrics on http://{}/metrics", addr);

    let in_container = std::path::Path::new("/.dockerenv").exists()
        || std::env::var("CONTAINER").as_deref() == Ok("1");

    if in_container {
        // In Docker: run server until error or SIGTERM (no signal handler; avoids immediate exit)
        axum::serve(listener, app).await?;
    } else {
        tokio::select! {
            result = axum::serve(listener, app) => {
                result?;
            }
            _ = async {
                #[cfg(unix)]
                {
                    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                        Ok(s) => s,
                        Err(_) => {
                            let _ = tokio::signal::ctrl_c().await;
                            return;
                        }
                    };
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = sigterm.recv() => {}
                    }
                }
                #[cfg(not(unix))]
                {
                    tokio::signal::ctrl_c().await
                }
            } => {
                tracing::info!("Received shutdown signal");
            }
        }
    }

    Ok(())
}
