use price_tracker::app_state::AppState;
use price_tracker::auth::Sessions;
use price_tracker::configuration::get_configuration;
use price_tracker::create_app;
use price_tracker::errors::Error;
use price_tracker::tracker;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SESSION_SWEEP_EVERY: Duration = Duration::from_secs(15 * 60);

fn bind_address(host: &str, port: u16) -> Result<SocketAddr, Error> {
    let host = IpAddr::from_str(host)?;
    Ok(SocketAddr::from((host, port)))
}

fn spawn_refresher(state: AppState, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = tracker::refresh_all(&state).await {
                error!("refresh sweep failed: {e}");
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("price_tracker=info,tower_http=info")),
        )
        .init();

    let configuration = get_configuration()?;
    let addr = bind_address(
        &configuration.application.host,
        configuration.application.port,
    )?;
    let app_state = AppState::init(&configuration).await?;
    Sessions::spawn_sweeper(app_state.sessions.clone(), SESSION_SWEEP_EVERY);
    if let Some(secs) = configuration.refresh_interval_secs.filter(|secs| *secs > 0) {
        info!(every_secs = secs, "starting periodic refresher");
        spawn_refresher(app_state.clone(), Duration::from_secs(secs));
    }

    let app = create_app(app_state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
