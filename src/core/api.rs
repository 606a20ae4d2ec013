//! HTTP + WebSocket API for gesture sessions
//!
//! Endpoints:
//! - GET    /health               - Health check
//! - POST   /session/new          - Create session (optional config)
//! - GET    /session/:id          - Session status
//! - DELETE /session/:id          - Drop session
//! - POST   /session/:id/start    - Start detection
//! - POST   /session/:id/stop     - Stop detection
//! - POST   /session/:id/frame    - Submit one landmark frame
//! - POST   /session/:id/tick     - Release due reactions without a frame
//! - WS     /ws/:id               - Live effect tokens

use axum::{
    extract::{ws::{Message, WebSocket}, Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::AbortHandle;
use tracing::{debug, info, trace};

use crate::core::clock::{Clock, SystemClock};
use crate::core::config::ReactionConfig;
use crate::core::effects::BroadcastSink;
use crate::core::session::{ReactionSession, SessionStatus};
use crate::core::source::PushSource;
use crate::error::Error;
use crate::types::{EffectToken, LandmarkFrame, StabilizerOutput};

/// Tokens buffered per WebSocket subscriber before it starts lagging
const TOKEN_CHANNEL_CAPACITY: usize = 256;

type ApiReactionSession = ReactionSession<PushSource, BroadcastSink, SystemClock>;

/// One hosted session
pub struct Session {
    pub id: String,
    pub pipeline: ApiReactionSession,
    /// Same channel the pipeline renders into
    pub tokens: BroadcastSink,
    /// Background task releasing staggered reactions and expired tokens
    reaper: AbortHandle,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.reaper.abort();
    }
}

/// App state
#[derive(Default)]
pub struct AppState {
    pub sessions: RwLock<HashMap<String, Session>>,
}

impl AppState {
    /// Live token feed of one session
    pub async fn subscribe(&self, id: &str) -> Option<broadcast::Receiver<EffectToken>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).map(|s| s.tokens.subscribe())
    }
}

/// Error body: `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("session '{}' not found", id),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let status = match e {
            Error::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            Error::SessionInactive => StatusCode::CONFLICT,
            Error::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct Body {
            error: String,
        }
        (self.status, Json(Body { error: self.message })).into_response()
    }
}

/// Create new session request
#[derive(Debug, Default, Deserialize)]
pub struct NewSessionRequest {
    #[serde(default)]
    pub config: Option<ReactionConfig>,
}

/// Create new session response
#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub websocket_url: String,
}

/// Session status response
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub status: SessionStatus,
}

/// Submit frame request; `null` landmarks means no hand
#[derive(Debug, Deserialize)]
pub struct FrameRequest {
    #[serde(default)]
    pub landmarks: Option<LandmarkFrame>,
}

/// Submit frame response
#[derive(Debug, Serialize)]
pub struct FrameResponse {
    #[serde(flatten)]
    pub output: StabilizerOutput,
    pub live_tokens: usize,
    pub pending_reactions: usize,
}

/// Tick response
#[derive(Debug, Serialize)]
pub struct TickResponse {
    pub created: Vec<EffectToken>,
    pub live_tokens: usize,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
}

/// Create the API router
pub fn create_router() -> Router {
    create_router_with_state(Arc::new(AppState::default()))
}

/// Create the API router over existing state
pub fn create_router_with_state(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/session/new", post(create_session))
        .route("/session/:id", get(get_session).delete(delete_session))
        .route("/session/:id/start", post(start_session))
        .route("/session/:id/stop", post(stop_session))
        .route("/session/:id/frame", post(submit_frame))
        .route("/session/:id/tick", post(tick_session))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: sessions.values().filter(|s| s.pipeline.is_active()).count(),
    })
}

/// Create new session
async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewSessionRequest>,
) -> Result<Json<NewSessionResponse>, ApiError> {
    let session_id = generate_session_id();
    let tokens = BroadcastSink::new(TOKEN_CHANNEL_CAPACITY);
    let pipeline = ReactionSession::new(
        req.config.unwrap_or_default(),
        PushSource,
        tokens.clone(),
        SystemClock::new(),
    )?;
    let every = Duration::from_millis(pipeline.config().frame_interval_ms);

    // Spawned under the write lock so the reaper's first look finds the session
    let mut sessions = state.sessions.write().await;
    let reaper = tokio::spawn(reap_session(state.clone(), session_id.clone(), every));
    sessions.insert(
        session_id.clone(),
        Session {
            id: session_id.clone(),
            pipeline,
            tokens,
            reaper: reaper.abort_handle(),
        },
    );
    info!("Session {} created", session_id);

    Ok(Json(NewSessionResponse {
        session_id: session_id.clone(),
        websocket_url: format!("/ws/{}", session_id),
    }))
}

/// Get session status
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| ApiError::not_found(&id))?;
    Ok(Json(status_of(session)))
}

/// Drop a session; its stabilizer goes with it
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut sessions = state.sessions.write().await;
    let mut session = sessions.remove(&id).ok_or_else(|| ApiError::not_found(&id))?;
    session.pipeline.stop();
    info!("Session {} removed", id);
    Ok(StatusCode::NO_CONTENT)
}

async fn start_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| ApiError::not_found(&id))?;
    session.pipeline.start()?;
    Ok(Json(status_of(session)))
}

async fn stop_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| ApiError::not_found(&id))?;
    session.pipeline.stop();
    Ok(Json(status_of(session)))
}

/// Run one frame through the session's pipeline
async fn submit_frame(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<FrameRequest>,
) -> Result<Json<FrameResponse>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| ApiError::not_found(&id))?;

    let output = session.pipeline.submit(req.landmarks.as_ref())?;
    if let Some(gesture) = output.confirmed {
        debug!("Session {} confirmed {}", session.id, gesture);
    }

    Ok(Json(FrameResponse {
        output,
        live_tokens: session.pipeline.scheduler().live_count(),
        pending_reactions: session.pipeline.pending_reactions().len(),
    }))
}

async fn tick_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TickResponse>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| ApiError::not_found(&id))?;
    let created = session.pipeline.tick();
    Ok(Json(TickResponse {
        created,
        live_tokens: session.pipeline.scheduler().live_count(),
    }))
}

/// WebSocket handler for live tokens
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let rx = state
        .subscribe(&id)
        .await
        .ok_or_else(|| ApiError::not_found(&id))?;

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

/// Forward tokens until the client leaves or the session is dropped
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<EffectToken>) {
    let (mut sender, mut receiver) = socket.split();

    let mut forward = tokio::spawn(async move {
        loop {
            let token = match rx.recv().await {
                Ok(token) => token,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("WebSocket client lagged, skipped {} tokens", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let json = match serde_json::to_string(&token) {
                Ok(json) => json,
                Err(e) => {
                    debug!("Could not serialize {}: {}", token.id, e);
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Inbound messages are ignored; only a close ends the stream
    let mut listen = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut forward => listen.abort(),
        _ = &mut listen => forward.abort(),
    }
}

/// Drive a session's timers while no requests arrive.
/// Ends by itself once the session is gone.
async fn reap_session(state: Arc<AppState>, id: String, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let due = {
            let sessions = state.sessions.read().await;
            let Some(session) = sessions.get(&id) else {
                break;
            };
            let now = session.pipeline.clock().now_ms();
            session.pipeline.next_deadline_ms().is_some_and(|d| d <= now)
        };
        if !due {
            continue;
        }
        let mut sessions = state.sessions.write().await;
        if let Some(session) = sessions.get_mut(&id) {
            let created = session.pipeline.tick();
            trace!("Session {} reaper released {} tokens", id, created.len());
        }
    }
    debug!("Reaper for {} finished", id);
}

fn status_of(session: &Session) -> SessionStatusResponse {
    SessionStatusResponse {
        session_id: session.id.clone(),
        status: session.pipeline.status(),
    }
}

/// Generate session ID
fn generate_session_id() -> String {
    format!("session_{}", uuid::Uuid::new_v4().simple())
}

/// Run the API server
pub async fn run_server(addr: &str) -> crate::Result<()> {
    let router = create_router();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Handsign API running on {}", addr);
    info!("  POST /session/new        - Create session");
    info!("  GET  /session/:id        - Get status");
    info!("  POST /session/:id/start  - Start detection");
    info!("  POST /session/:id/stop   - Stop detection");
    info!("  POST /session/:id/frame  - Submit frame");
    info!("  WS   /ws/:id             - Live effect tokens");
    axum::serve(listener, router).await?;
    Ok(())
}
