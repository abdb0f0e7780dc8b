use crate::config::ConfigError;
use crate::store::error::StoreError;
use crate::weather::error::WeatherError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Blocking task failed")]
    Task(#[from] tokio::task::JoinError),

    #[error("Failed to bind dashboard listener on {0}")]
    Bind(std::net::SocketAddr, #[source] std::io::Error),

    #[error("Dashboard server stopped unexpectedly")]
    Serve(#[source] std::io::Error),
}
