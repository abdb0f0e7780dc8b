mod classify;
mod collector;
mod config;
mod dashboard;
mod error;
mod store;
mod types;
mod utils;
mod weather;

pub use classify::*;
pub use collector::*;
pub use config::*;
pub use error::TrackerError;

pub use types::anomaly::*;
pub use types::city::*;

pub use store::dataset::*;
pub use store::error::StoreError;

pub use weather::client::*;
pub use weather::error::WeatherError;
pub use weather::retry::*;

pub use dashboard::cache::DatasetCache;
pub use dashboard::filter::*;
pub use dashboard::render::{render_page, DashboardView};
pub use dashboard::server::{router, serve, serve_on, AnomaliesResponse, AppState};
pub use dashboard::summary::*;
