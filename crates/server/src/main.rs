use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger::Ledger;
use relay::{Dispatcher, InputGateway, ObserverConnection, ObserverRegistry};
use serde::Serialize;
use shared::{
    error::ApiError,
    protocol::{control_pad, ActionRequest, ControlButton, DispatchStats},
};
use target_control::XdotoolController;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::load_settings;

const FALLBACK_INDEX_HTML: &str = include_str!("../static/index.html");
const MAX_ACTION_BODY_BYTES: usize = 16 * 1024;

#[derive(Debug, Serialize)]
struct StatsResponse {
    dispatch: DispatchStats,
    observers: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = load_settings();
    ledger::ensure_parent_dir_exists(&settings.ledger_path)?;

    let controller = XdotoolController::new(settings.xdotool_config());
    let dispatcher = Dispatcher::spawn(Arc::new(controller), settings.dispatch_policy());
    let gateway = InputGateway::new(
        settings.key_map.clone(),
        Ledger::open(&settings.ledger_path),
        ObserverRegistry::new(),
        dispatcher,
    );

    let state = AppState {
        gateway,
        index_html_path: settings.index_html_path.clone(),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(
        %addr,
        ledger = %settings.ledger_path.display(),
        window_class = %settings.target_window_class,
        "server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/actions", post(submit_action))
        .route("/controls", get(controls))
        .route("/stats", get(stats))
        .route("/ws", get(ws_handler))
        .fallback(upgrade_or_not_found)
        .layer(RequestBodyLimitLayer::new(MAX_ACTION_BODY_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Serves the page, or accepts an observer when the request is an upgrade.
async fn index(
    ws: Option<WebSocketUpgrade>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match ws {
        Some(ws) => accept_observer(ws, state),
        None => page(&state).await.into_response(),
    }
}

async fn page(state: &AppState) -> Html<String> {
    match tokio::fs::read_to_string(&state.index_html_path).await {
        Ok(page) => Html(page),
        Err(error) => {
            debug!(
                path = %state.index_html_path.display(),
                %error,
                "serving built-in page"
            );
            Html(FALLBACK_INDEX_HTML.to_string())
        }
    }
}

/// Entry point for the chat adapter. The 204 is the acknowledgment; it is
/// sent before the target has acted on the input.
async fn submit_action(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ActionRequest>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    state
        .gateway
        .submit(&req.action_id, req.username.as_deref())
        .map_err(|e| {
            debug!(action_id = %req.action_id, error = %e, "rejected action");
            (StatusCode::UNPROCESSABLE_ENTITY, Json(ApiError::from(e)))
        })?;
    Ok(StatusCode::NO_CONTENT)
}

async fn controls() -> Json<Vec<ControlButton>> {
    Json(control_pad())
}

async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        dispatch: state.gateway.dispatcher().stats(),
        observers: state.gateway.observers().len(),
    })
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    accept_observer(ws, state)
}

/// Observers may upgrade on any path of the port.
async fn upgrade_or_not_found(
    ws: Option<WebSocketUpgrade>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match ws {
        Some(ws) => accept_observer(ws, state),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn accept_observer(ws: WebSocketUpgrade, state: Arc<AppState>) -> Response {
    ws.on_upgrade(move |socket| observer_connection(state, socket))
}

async fn observer_connection(state: Arc<AppState>, socket: WebSocket) {
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let (conn, frames) = ObserverConnection::channel();
    let observers = state.gateway.observers();
    let observer_id = observers.register(conn);
    info!(observer = %observer_id, live = observers.len(), "observer connected");

    let send_task = tokio::spawn(async move {
        let mut frames = UnboundedReceiverStream::new(frames);
        while let Some(text) = frames.next().await {
            if let Err(error) = sender.send(Message::Text(text)).await {
                debug!(observer = %observer_id, %error, "observer send failed");
                break;
            }
        }
    });

    // Observers never talk back; drain until the socket closes.
    while let Some(Ok(_msg)) = receiver.next().await {}

    observers.unregister(observer_id);
    send_task.abort();
    info!(observer = %observer_id, live = observers.len(), "observer disconnected");
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
