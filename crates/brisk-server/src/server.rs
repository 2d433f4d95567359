//! Static dev server with live reload.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Request, State,
    },
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;

use crate::reload::{client_script, ReloadHub, ReloadMessage, CLIENT_PATH, RELOAD_PATH};

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Directory served at `/`
    pub serve_dir: PathBuf,

    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Open browser on start
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            serve_dir: PathBuf::from("build"),
            host: "localhost".to_string(),
            port: 9000,
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("Dev server is already running on {0}")]
    AlreadyRunning(SocketAddr),

    #[error("File watch error: {0}")]
    Watch(String),
}

/// Shared handler state.
struct ServerState {
    hub: ReloadHub,
    shutdown: watch::Receiver<bool>,
}

struct Running {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Development server. Either stopped or running; `start` and `stop` move
/// between the two.
pub struct DevServer {
    config: DevServerConfig,
    hub: ReloadHub,
    running: Option<Running>,
}

impl DevServer {
    pub fn new(config: DevServerConfig) -> Self {
        Self {
            config,
            hub: ReloadHub::new(),
            running: None,
        }
    }

    pub fn config(&self) -> &DevServerConfig {
        &self.config
    }

    /// Broadcast hub for reload messages. Usable whether or not the server
    /// is running.
    pub fn hub(&self) -> &ReloadHub {
        &self.hub
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.addr)
    }

    /// Bind and start serving in the background.
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if let Some(running) = &self.running {
            return Err(ServerError::AlreadyRunning(running.addr));
        }

        let display_addr = format!("{}:{}", self.config.host, self.config.port);
        let bind_error = |source| ServerError::Bind {
            addr: display_addr.clone(),
            source,
        };

        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port))
            .await
            .map_err(bind_error)?;
        let addr = listener.local_addr().map_err(bind_error)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = Arc::new(ServerState {
            hub: self.hub.clone(),
            shutdown: shutdown_rx.clone(),
        });
        let app = router(self.config.serve_dir.clone(), state);

        let mut stop = shutdown_rx;
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop.changed().await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!("Dev server failed: {}", e);
            }
        });

        let url = format!("http://{}:{}", self.config.host, addr.port());
        tracing::info!("Serving {} at {}", self.config.serve_dir.display(), url);

        if self.config.open {
            if let Err(e) = open::that(&url) {
                tracing::warn!("Could not open browser: {}", e);
            }
        }

        self.running = Some(Running {
            addr,
            shutdown: shutdown_tx,
            task,
        });
        Ok(addr)
    }

    /// Shut down gracefully, closing reload sockets, and wait until the port
    /// is released. No-op when stopped.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        let _ = running.shutdown.send(true);
        if let Err(e) = running.task.await {
            tracing::warn!("Dev server task ended abnormally: {}", e);
        }
        tracing::info!("Dev server on {} stopped", running.addr);
    }
}

fn router(serve_dir: PathBuf, state: Arc<ServerState>) -> Router {
    Router::new()
        .route(RELOAD_PATH, get(ws_handler))
        .route(CLIENT_PATH, get(client_handler))
        .fallback_service(ServeDir::new(serve_dir))
        .layer(middleware::from_fn(inject_client))
        .with_state(state)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Forward hub messages to one browser until it leaves or the server stops.
async fn handle_ws(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut rx = state.hub.subscribe();
    let mut shutdown = state.shutdown.clone();
    if *shutdown.borrow() {
        return;
    }

    if send(&mut socket, &ReloadMessage::Connected).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Ok(msg) => {
                    if send(&mut socket, &msg).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Reload client lagged by {} messages", skipped);
                    if send(&mut socket, &ReloadMessage::Reload).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = shutdown.changed() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }
}

async fn send(socket: &mut WebSocket, msg: &ReloadMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}

async fn client_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        client_script(),
    )
}

/// Add the client script tag to successful HTML responses.
async fn inject_client(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let is_html = response.status() == StatusCode::OK
        && response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html"));
    if !is_html {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to buffer HTML response: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = inject_script_tag(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(html))
}

fn inject_script_tag(html: &str) -> String {
    let tag = format!(r#"<script src="{}"></script>"#, CLIENT_PATH);
    match html.rfind("</body>") {
        Some(index) => format!("{}{}\n{}", &html[..index], tag, &html[index..]),
        None => format!("{}\n{}\n", html.trim_end(), tag),
    }
}
