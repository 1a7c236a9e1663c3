use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Clone)]
enum Route {
    Body(Vec<u8>),
    Status(StatusCode),
    Slow(Duration, Vec<u8>),
}

#[derive(Clone, Default)]
struct ServerState {
    routes: Arc<RwLock<HashMap<String, Route>>>,
    user_agents: Arc<RwLock<Vec<String>>>,
}

/// Local HTTP server standing in for remote feed hosts.
/// Feeds live at `/feeds/<name>`; unknown names answer 404.
pub struct FeedServer {
    base_url: String,
    state: ServerState,
}

impl FeedServer {
    pub async fn start() -> Result<Self> {
        let state = ServerState::default();
        let app = Router::new()
            .route("/feeds/:name", get(serve_feed))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            state,
        })
    }

    pub fn url(&self, name: &str) -> String {
        format!("{}/feeds/{}", self.base_url, name)
    }

    pub fn serve(&self, name: &str, body: Vec<u8>) {
        self.state
            .routes
            .write()
            .insert(name.to_string(), Route::Body(body));
    }

    pub fn fail(&self, name: &str, status: StatusCode) {
        self.state
            .routes
            .write()
            .insert(name.to_string(), Route::Status(status));
    }

    pub fn serve_slowly(&self, name: &str, delay: Duration, body: Vec<u8>) {
        self.state
            .routes
            .write()
            .insert(name.to_string(), Route::Slow(delay, body));
    }

    /// User-Agent header of every request received so far
    pub fn user_agents(&self) -> Vec<String> {
        self.state.user_agents.read().clone()
    }
}

async fn serve_feed(
    State(state): State<ServerState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(agent) = headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok()) {
        state.user_agents.write().push(agent.to_string());
    }

    let route = state.routes.read().get(&name).cloned();
    match route {
        Some(Route::Body(body)) => rss_response(body),
        Some(Route::Status(status)) => status.into_response(),
        Some(Route::Slow(delay, body)) => {
            tokio::time::sleep(delay).await;
            rss_response(body)
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn rss_response(body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/rss+xml")],
        body,
    )
        .into_response()
}
