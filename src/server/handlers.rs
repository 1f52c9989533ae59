//! HTTP and WebSocket handlers for the dashboard API.

use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};

use super::api::{
    freshness, DeleteResponse, EntryType, FileEntry, FileListing, FilesQuery, StatusResponse,
};
use super::error::ApiError;
use super::state::AppState;
use crate::hub::{BroadcastHub, Subscription};
use crate::probe;
use crate::tasks::{NewTask, TaskPatch, TaskRecord};
use crate::telemetry::{self, TelemetrySnapshot};
use crate::watcher::locate_latest_session;

/// GET /api/telemetry - usage metrics for the active session.
pub async fn get_telemetry(State(state): State<AppState>) -> Json<TelemetrySnapshot> {
    let snapshot = match locate_latest_session(&state.config.sessions.dir) {
        Some(session) => telemetry::scan_session(&session.path).await,
        None => TelemetrySnapshot::default(),
    };

    Json(snapshot.with_uptime(state.uptime_secs()))
}

/// GET /api/status - agent process liveness.
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let running = probe::agent_running(&state.config.probe.process_pattern).await;
    Json(StatusResponse::new(running))
}

/// GET /api/files - one-level listing of a workspace subdirectory.
pub async fn get_files(
    State(state): State<AppState>,
    Query(query): Query<FilesQuery>,
) -> Result<Json<FileListing>, ApiError> {
    let relative = sanitize_relative_path(&query.path)?;
    let full_path = state.config.workspace.dir.join(&relative);

    let mut dir = tokio::fs::read_dir(&full_path)
        .await
        .map_err(|e| ApiError::PathNotFound(e.to_string()))?;

    let now = Utc::now();
    let mut items = Vec::new();

    loop {
        match dir.next_entry().await {
            Ok(Some(entry)) => items.push(file_entry(&entry, now).await),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "directory entry unreadable, stopping listing");
                break;
            }
        }
    }

    items.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Json(FileListing {
        path: query.path,
        items,
    }))
}

async fn file_entry(entry: &tokio::fs::DirEntry, now: DateTime<Utc>) -> FileEntry {
    let name = entry.file_name().to_string_lossy().into_owned();

    match entry.metadata().await {
        Ok(metadata) => {
            let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
            let created = metadata.created().ok().map(DateTime::<Utc>::from);
            FileEntry {
                name,
                entry_type: if metadata.is_dir() {
                    EntryType::Folder
                } else {
                    EntryType::File
                },
                size: metadata.len(),
                modified,
                status: freshness(modified, created, now),
            }
        }
        Err(_) => FileEntry {
            name,
            entry_type: EntryType::File,
            size: 0,
            modified: None,
            status: None,
        },
    }
}

fn sanitize_relative_path(raw: &str) -> Result<PathBuf, ApiError> {
    let path = FsPath::new(raw);
    if path.is_absolute() {
        return Err(ApiError::InvalidPath);
    }
    for component in path.components() {
        if !matches!(component, Component::Normal(_) | Component::CurDir) {
            return Err(ApiError::InvalidPath);
        }
    }
    Ok(path.to_path_buf())
}

/// GET /api/tasks - list all tasks.
pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<TaskRecord>> {
    Json(state.tasks.list().await)
}

/// POST /api/tasks - create a task.
pub async fn create_task(
    State(state): State<AppState>,
    Json(new): Json<NewTask>,
) -> Result<(StatusCode, Json<TaskRecord>), ApiError> {
    let record = state.tasks.create(new).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PATCH /api/tasks/{id} - update a task.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<TaskRecord>, ApiError> {
    let record = state.tasks.update(&id, patch).await?;
    Ok(Json(record))
}

/// DELETE /api/tasks/{id} - remove a task.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let ok = state.tasks.remove(&id).await?;
    Ok(Json(DeleteResponse { ok }))
}

/// GET /ws/logs - subscribe to the log event stream.
pub async fn ws_logs(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let hub = state.log_hub.clone();
    ws.on_upgrade(move |socket| stream_events(socket, hub))
}

/// GET /ws/files - subscribe to the file change stream.
pub async fn ws_files(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let hub = state.file_hub.clone();
    ws.on_upgrade(move |socket| stream_events(socket, hub))
}

/// Forward hub frames into the socket until either side goes away.
///
/// Nothing is expected from the client after the handshake; incoming
/// frames are drained only to observe the close.
async fn stream_events(socket: WebSocket, hub: Arc<BroadcastHub>) {
    let Subscription { id, mut receiver } = hub.subscribe().await;
    tracing::debug!(channel = %hub.channel(), subscriber = id, "websocket connected");

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            frame = receiver.recv() => {
                match frame {
                    Some(frame) => {
                        if sink.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    hub.unsubscribe(id).await;
    tracing::debug!(channel = %hub.channel(), subscriber = id, "websocket disconnected");
}
