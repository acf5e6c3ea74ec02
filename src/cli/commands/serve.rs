//! Web chat server.
//!
//! Serves a single chat page plus a small JSON API. Every browser session
//! gets its own conversation; all of them share the process-wide index.
//! Sessions idle for longer than `server.session_idle_minutes` are dropped.

use crate::chat::{ChatSession, ChatState, Reply, Turn};
use crate::cli::preflight;
use crate::cli::{ChatServices, Output};
use crate::config::{Settings, UiSettings};
use crate::error::VidchatError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

const CHAT_PAGE: &str = include_str!("../../../assets/chat.html");

/// A browser session and when it was last used.
struct SessionSlot {
    chat: Mutex<ChatSession>,
    last_active: std::sync::Mutex<Instant>,
}

impl SessionSlot {
    fn new(chat: ChatSession) -> Self {
        Self {
            chat: Mutex::new(chat),
            last_active: std::sync::Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self.last_active.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        let last = *self.last_active.lock().unwrap_or_else(PoisonError::into_inner);
        now.saturating_duration_since(last)
    }
}

/// Shared application state.
struct AppState {
    services: ChatServices,
    ui: UiSettings,
    idle_timeout: Duration,
    sessions: RwLock<HashMap<Uuid, Arc<SessionSlot>>>,
}

impl AppState {
    fn new(services: ChatServices, ui: UiSettings, idle_timeout: Duration) -> Self {
        Self {
            services,
            ui,
            idle_timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a live session and mark it used.
    async fn session(&self, id: &str) -> Result<Arc<SessionSlot>, ApiError> {
        let not_found = || ApiError(VidchatError::SessionNotFound(id.to_string()));
        let id = Uuid::parse_str(id).map_err(|_| not_found())?;
        let slot = self.sessions.read().await.get(&id).cloned().ok_or_else(not_found)?;
        if slot.idle_for(Instant::now()) >= self.idle_timeout {
            self.sessions.write().await.remove(&id);
            return Err(not_found());
        }
        slot.touch();
        Ok(slot)
    }

    /// Drop sessions idle for at least the timeout as of `now`. Returns how
    /// many were removed.
    async fn expire_idle(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| slot.idle_for(now) < self.idle_timeout);
        before - sessions.len()
    }
}

/// Periodically drop idle sessions.
fn spawn_session_sweeper(state: Arc<AppState>) {
    let period = (state.idle_timeout / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let expired = state.expire_idle(Instant::now()).await;
            if expired > 0 {
                info!(expired, "Dropped idle chat sessions");
            }
        }
    });
}

/// Run the web chat server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(&settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidchat doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let services = ChatServices::start(&settings).await?;
    let idle_timeout = Duration::from_secs(settings.server.session_idle_minutes.max(1) * 60);
    let state = Arc::new(AppState::new(services, settings.ui.clone(), idle_timeout));
    spawn_session_sweeper(state.clone());

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header(&settings.ui.title);
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Chat page", "GET  /");
    Output::kv("Health", "GET  /health");
    Output::kv("New session", "POST /api/sessions");
    Output::kv("Read session", "GET  /api/sessions/{id}");
    Output::kv("Ask", "POST /api/sessions/{id}/messages");
    Output::kv("Retry", "POST /api/sessions/{id}/retry");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(page))
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session))
        .route("/api/sessions/{id}/messages", post(post_message))
        .route("/api/sessions/{id}/retry", post(retry_message))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct MessageRequest {
    content: String,
}

#[derive(Serialize)]
struct SessionView {
    id: Uuid,
    state: ChatState,
    turns: Vec<Turn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<Reply>,
}

impl SessionView {
    fn of(session: &ChatSession, reply: Option<Reply>) -> Self {
        Self {
            id: session.id(),
            state: session.state(),
            turns: session.turns().to_vec(),
            reply,
        }
    }
}

/// Library error rendered as a JSON body with a matching status.
struct ApiError(VidchatError);

impl From<VidchatError> for ApiError {
    fn from(e: VidchatError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            VidchatError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            VidchatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            VidchatError::TurnPending | VidchatError::NothingPending => StatusCode::CONFLICT,
            e if e.is_provider_failure() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

// === Handlers ===

async fn page(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_page(&state.ui))
}

fn render_page(ui: &UiSettings) -> String {
    CHAT_PAGE
        .replace("{{title}}", &html_escape(&ui.title))
        .replace("{{placeholder}}", &html_escape(&ui.input_placeholder))
        .replace("{{thinking_js}}", &js_string(&ui.thinking_message))
}

/// A JavaScript string literal safe to embed in an inline script.
fn js_string(text: &str) -> String {
    serde_json::to_string(text)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "sources": state.services.index().sources().len(),
        "indexed_at": state.services.index().built_at(),
    }))
}

async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let session = state.services.new_session();
    let view = SessionView::of(&session, None);
    state
        .sessions
        .write()
        .await
        .insert(session.id(), Arc::new(SessionSlot::new(session)));
    info!(session = %view.id, "Created chat session");
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let slot = state.session(&id).await?;
    let session = slot.chat.lock().await;
    Ok(Json(SessionView::of(&session, None)))
}

async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let slot = state.session(&id).await?;
    let mut session = slot.chat.lock().await;
    let reply = session.submit(&req.content).await;
    slot.touch();
    Ok(Json(SessionView::of(&session, Some(reply?))))
}

async fn retry_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let slot = state.session(&id).await?;
    let mut session = slot.chat.lock().await;
    let reply = session.retry().await;
    slot.touch();
    Ok(Json(SessionView::of(&session, Some(reply?))))
}
