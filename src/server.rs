use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode, Uri},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use crate::config::ScraperConfig;
use crate::fallback;
use crate::models::{Event, EventFeed};
use crate::orchestrator::EventScraper;
use crate::utils;

/// Produces the event list for one request. Runs on a blocking thread.
pub trait EventSource: Send + Sync + 'static {
    fn events(&self, force_refresh: bool) -> Vec<Event>;
}

/// Runs the full orchestrator per request.
pub struct LiveSource {
    config: ScraperConfig,
}

impl LiveSource {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }
}

impl EventSource for LiveSource {
    fn events(&self, force_refresh: bool) -> Vec<Event> {
        match EventScraper::from_config(self.config.clone()) {
            Ok(mut scraper) => scraper.get_events(force_refresh),
            Err(err) => {
                warn!("http client unavailable: {err}");
                fallback::fallback_events(utils::now_local(), &self.config.page_url)
            }
        }
    }
}

pub struct ServeState {
    source: Arc<dyn EventSource>,
    static_root: PathBuf,
    force_refresh: bool,
    turn: AsyncMutex<()>,
}

impl ServeState {
    pub fn new(
        source: impl EventSource,
        static_root: impl Into<PathBuf>,
        force_refresh: bool,
    ) -> Self {
        Self {
            source: Arc::new(source),
            static_root: static_root.into(),
            force_refresh,
            turn: AsyncMutex::new(()),
        }
    }
}

pub fn app(state: ServeState) -> Router {
    Router::new()
        .route("/events", get(events_handler))
        .route("/events.json", get(events_handler))
        .fallback(static_handler)
        .layer(middleware::map_response(with_cors))
        .with_state(Arc::new(state))
}

pub async fn serve(config: ScraperConfig, force_refresh: bool) -> Result<()> {
    let port = config.serve_port;
    let state = ServeState::new(
        LiveSource::new(config.clone()),
        config.serve_root.clone(),
        force_refresh,
    );
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("unable to bind port {port}"))?;
    info!("serving events API at http://localhost:{port}/events");
    info!("press Ctrl+C to stop");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("shutting down server");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("unable to listen for ctrl-c: {err}");
    }
}

async fn events_handler(State(state): State<Arc<ServeState>>) -> Response {
    // One orchestrator run at a time; the cache file has a single writer.
    let _turn = state.turn.lock().await;
    let source = Arc::clone(&state.source);
    let force_refresh = state.force_refresh;
    let events = match tokio::task::spawn_blocking(move || source.events(force_refresh)).await {
        Ok(events) => events,
        Err(err) => return server_error(anyhow::anyhow!(err.to_string())),
    };
    Json(EventFeed {
        last_updated: utils::iso(utils::now_local()),
        total_count: events.len(),
        events,
    })
    .into_response()
}

async fn static_handler(State(state): State<Arc<ServeState>>, uri: Uri) -> Response {
    let path = match resolve_static(&state.static_root, uri.path()) {
        Some(path) => path,
        None => return not_found(),
    };
    let path = if path.is_dir() {
        path.join("index.html")
    } else {
        path
    };
    match tokio::fs::read(&path).await {
        Ok(body) => ([(header::CONTENT_TYPE, content_type(&path))], body).into_response(),
        Err(_) => not_found(),
    }
}

/// Maps a request path under `root`, refusing anything that climbs out.
fn resolve_static(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(resolved)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

async fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
    response
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Html("File not found".to_string())).into_response()
}

fn server_error(err: anyhow::Error) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!("Server error: {}", err)),
    )
        .into_response()
}
