//! HTTP + WebSocket surface for the funnel.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::countdown::Countdown;
use super::model::Gender;
use super::sessions::SessionStore;
use super::steps;
use super::view::StageView;
use crate::error::FunnelError;
use crate::media::MediaResolver;

type ApiError = (StatusCode, Json<Value>);

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    /// Substitutes placeholders for unreachable images (None to skip probing).
    pub media: Option<MediaResolver>,
}

/// Build the Axum router with the funnel REST and WebSocket routes.
pub fn funnel_routes(store: Arc<SessionStore>, media: Option<MediaResolver>) -> Router {
    let state = AppState { store, media };

    Router::new()
        .route("/health", get(health))
        .route("/api/funnel/steps", get(list_steps))
        .route("/api/funnel/sessions", post(create_session))
        .route(
            "/api/funnel/sessions/{id}",
            get(get_session).delete(delete_session),
        )
        .route("/api/funnel/sessions/{id}/gender", post(select_gender))
        .route("/api/funnel/sessions/{id}/select", post(select_option))
        .route("/api/funnel/sessions/{id}/text", post(set_text))
        .route("/api/funnel/sessions/{id}/continue", post(confirm))
        .route("/api/funnel/sessions/{id}/purchase", post(purchase))
        .route("/api/funnel/sessions/{id}/answers", get(answers))
        .route("/api/funnel/sessions/{id}/countdown/ws", get(countdown_ws))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Errors ──────────────────────────────────────────────────────────────

fn error_status(err: &FunnelError) -> StatusCode {
    match err {
        FunnelError::SessionNotFound { .. } => StatusCode::NOT_FOUND,
        FunnelError::OptionNotOffered { .. } => StatusCode::BAD_REQUEST,
        FunnelError::ContinueDisabled
        | FunnelError::WrongStage { .. }
        | FunnelError::WrongStepKind { .. }
        | FunnelError::AlreadyCompleted => StatusCode::CONFLICT,
    }
}

fn funnel_error(err: FunnelError) -> ApiError {
    let status = error_status(&err);
    debug!(error = %err, status = %status, "Funnel request rejected");
    (status, Json(json!({"error": err.to_string()})))
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message})))
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| bad_request("Invalid session ID"))
}

async fn resolved(state: &AppState, mut view: StageView) -> StageView {
    if let Some(media) = &state.media {
        let substituted = media.resolve_all(view.images_mut()).await;
        if substituted > 0 {
            debug!(count = substituted, "Images replaced by placeholder");
        }
    }
    view
}

// ── Health / catalog ────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "flourcraft-funnel"
    }))
}

async fn list_steps() -> impl IntoResponse {
    Json(json!(steps::catalog()))
}

// ── Sessions ────────────────────────────────────────────────────────────

async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let (id, view) = state.store.create().await;
    let view = resolved(&state, view).await;
    (
        StatusCode::CREATED,
        Json(json!({"session_id": id, "view": view})),
    )
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let view = state.store.view(id).await.map_err(funnel_error)?;
    Ok(Json(json!(resolved(&state, view).await)))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    if state.store.remove(id).await {
        Ok(Json(json!({"status": "deleted"})))
    } else {
        Err(funnel_error(FunnelError::SessionNotFound { id }))
    }
}

#[derive(Deserialize)]
struct GenderRequest {
    gender: String,
}

async fn select_gender(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<GenderRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let gender: Gender = body.gender.parse().map_err(|e: String| bad_request(&e))?;
    let view = state
        .store
        .with_flow(id, |flow| {
            flow.select_gender(gender)?;
            Ok(StageView::of(flow))
        })
        .await
        .map_err(funnel_error)?;
    Ok(Json(json!(resolved(&state, view).await)))
}

#[derive(Deserialize)]
struct SelectRequest {
    option: String,
}

async fn select_option(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SelectRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let view = state
        .store
        .with_flow(id, |flow| {
            flow.select(&body.option)?;
            Ok(StageView::of(flow))
        })
        .await
        .map_err(funnel_error)?;
    Ok(Json(json!(resolved(&state, view).await)))
}

#[derive(Deserialize)]
struct TextRequest {
    value: String,
}

async fn set_text(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<TextRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let view = state
        .store
        .with_flow(id, |flow| {
            flow.set_text(&body.value)?;
            Ok(StageView::of(flow))
        })
        .await
        .map_err(funnel_error)?;
    Ok(Json(json!(resolved(&state, view).await)))
}

async fn confirm(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let (transition, view) = state
        .store
        .with_flow(id, |flow| {
            let transition = flow.confirm()?;
            Ok((transition, StageView::of(flow)))
        })
        .await
        .map_err(funnel_error)?;
    info!(session_id = %id, ?transition, "Screen confirmed");
    let view = resolved(&state, view).await;
    Ok(Json(json!({"result": transition, "view": view})))
}

async fn purchase(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let url = state
        .store
        .with_flow(id, |flow| flow.purchase().map(str::to_string))
        .await
        .map_err(funnel_error)?;
    info!(session_id = %id, "Purchase clicked");
    Ok(Json(json!({"checkout_url": url})))
}

async fn answers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let record = state
        .store
        .with_flow(id, |flow| Ok(flow.answers()))
        .await
        .map_err(funnel_error)?;
    Ok(Json(json!(record)))
}

// ── Countdown WebSocket ─────────────────────────────────────────────────

async fn countdown_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let rx = match state.store.countdown_updates(id).await {
        Ok(rx) => rx,
        Err(e) => return funnel_error(e).into_response(),
    };

    info!(session_id = %id, "Countdown client connecting");
    ws.on_upgrade(move |socket| stream_countdown(socket, id, rx))
}

fn tick_message(countdown: Countdown) -> Message {
    let payload = json!({
        "countdown": countdown.to_string(),
        "hours": countdown.hours,
        "minutes": countdown.minutes,
        "seconds": countdown.seconds,
    });
    Message::Text(payload.to_string().into())
}

async fn stream_countdown(
    mut socket: WebSocket,
    id: Uuid,
    mut rx: watch::Receiver<Countdown>,
) {
    let current = *rx.borrow_and_update();
    if socket.send(tick_message(current)).await.is_err() {
        warn!(session_id = %id, "Failed to send initial countdown, client disconnected");
        return;
    }

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    debug!(session_id = %id, "Offer unmounted, closing countdown socket");
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                let current = *rx.borrow_and_update();
                if socket.send(tick_message(current)).await.is_err() {
                    debug!("Client disconnected during send");
                    break;
                }
            }

            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!(session_id = %id, "Countdown client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    debug!(session_id = %id, "Countdown socket closed");
}
