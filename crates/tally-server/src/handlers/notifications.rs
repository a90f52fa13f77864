//! Notification and preference handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, SuccessResponse, UserQuery};
use tally_core::models::{Notification, UserPreferences};

#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default = "crate::default_user_id")]
    pub user_id: i64,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

/// GET /api/notifications - List notifications, newest first
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<NotificationList>, AppError> {
    let notifications = state
        .db
        .list_notifications(query.user_id, query.unread_only)?;
    let unread_count = state.db.count_unread_notifications(query.user_id)?;
    Ok(Json(NotificationList {
        notifications,
        unread_count,
    }))
}

/// POST /api/notifications/:id/read - Mark a single notification read
pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.mark_notification_read(id)?;
    Ok(Json(SuccessResponse::ok()))
}

#[derive(Debug, Serialize)]
pub struct MarkAllResponse {
    pub marked: usize,
}

/// POST /api/notifications/read-all - Mark all of the user's notifications read
pub async fn mark_all_notifications_read(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
) -> Result<Json<MarkAllResponse>, AppError> {
    let marked = state.db.mark_all_notifications_read(user.user_id)?;
    Ok(Json(MarkAllResponse { marked }))
}

/// GET /api/preferences - Get the user's notification preferences
pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
) -> Result<Json<UserPreferences>, AppError> {
    let prefs = state.db.get_preferences(user.user_id)?;
    Ok(Json(prefs))
}

/// PUT /api/preferences - Replace the user's notification preferences
pub async fn set_preferences(
    State(state): State<Arc<AppState>>,
    Json(prefs): Json<UserPreferences>,
) -> Result<Json<UserPreferences>, AppError> {
    state.db.set_preferences(&prefs)?;
    let saved = state.db.get_preferences(prefs.user_id)?;
    Ok(Json(saved))
}
