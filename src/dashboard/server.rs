//! HTTP surface of the dashboard.

use crate::config::TrackerConfig;
use crate::dashboard::cache::{DatasetCache, Records};
use crate::dashboard::filter::{filter_records, FilterOptions, Selection};
use crate::dashboard::render::{render_page, DashboardView};
use crate::dashboard::summary::{summarize, table_rows, type_counts, Summary, TypeCount};
use crate::error::TrackerError;
use crate::store::dataset::AnomalyStore;
use crate::types::anomaly::AnomalyRecord;
use axum::extract::{RawQuery, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Shared state of all handlers.
pub struct AppState {
    config: TrackerConfig,
    store: AnomalyStore,
    cache: Mutex<DatasetCache>,
}

impl AppState {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            store: AnomalyStore::from_config(&config),
            cache: Mutex::new(DatasetCache::new(config.cache_ttl)),
            config,
        }
    }

    /// Cached records, reloading the file once the cache has expired.
    ///
    /// A dataset that cannot be read is served as empty.
    pub async fn records(&self, now: DateTime<Utc>) -> Records {
        let mut cache = self.cache.lock().await;
        if let Some(records) = cache.lookup(now) {
            return records;
        }

        let store = self.store.clone();
        let loaded = match tokio::task::spawn_blocking(move || store.read_all()).await {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => {
                warn!("Could not read anomaly dataset, showing it as empty: {}", e);
                Vec::new()
            }
            Err(e) => {
                error!("Dataset load task failed: {}", e);
                Vec::new()
            }
        };
        info!(
            "Loaded {} records from {}",
            loaded.len(),
            self.store.path().display()
        );
        cache.insert(loaded, now)
    }

    async fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.cache.lock().await.loaded_at()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/anomalies", get(anomalies))
        .route("/health", get(health))
        .with_state(state)
}

/// Binds the configured address and serves until the process stops.
pub async fn serve(config: TrackerConfig) -> Result<(), TrackerError> {
    let addr = config.listen_addr;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| TrackerError::Bind(addr, e))?;
    info!("Dashboard listening on http://{}", addr);
    serve_on(listener, Arc::new(AppState::new(config))).await
}

pub async fn serve_on(listener: TcpListener, state: Arc<AppState>) -> Result<(), TrackerError> {
    axum::serve(listener, router(state))
        .await
        .map_err(TrackerError::Serve)
}

async fn index(State(state): State<Arc<AppState>>, RawQuery(query): RawQuery) -> Html<String> {
    let records = state.records(Utc::now()).await;
    let view = DashboardView::build(&records, state.config.city_names(), query.as_deref());
    Html(render_page(&view))
}

/// Filtered records and their aggregates as JSON.
#[derive(Debug, Serialize)]
pub struct AnomaliesResponse {
    pub cities: Vec<String>,
    pub types: Vec<String>,
    pub summary: Summary,
    pub type_counts: Vec<TypeCount>,
    /// Newest first.
    pub records: Vec<AnomalyRecord>,
}

async fn anomalies(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Json<AnomaliesResponse> {
    let records = state.records(Utc::now()).await;
    let options = FilterOptions::from_records(&records, state.config.city_names());
    let selection = Selection::from_query(query.as_deref(), &options);
    let filtered = filter_records(&records, &selection);

    Json(AnomaliesResponse {
        cities: selection.cities.into_iter().collect(),
        types: selection.types.into_iter().collect(),
        summary: summarize(&filtered),
        type_counts: type_counts(&filtered),
        records: table_rows(&filtered).into_iter().cloned().collect(),
    })
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "data_file": state.store.path().display().to_string(),
        "loaded_at": state.loaded_at().await,
    }))
}
