//! Notifications endpoints.

use axum::{Json, Router, extract::State, routing::post};
use quorum_common::AppResult;
use quorum_db::entities::notification::Model as NotificationModel;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// List notifications request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsRequest {
    /// Zero-based page index.
    #[serde(default)]
    pub page: u64,
    /// Page size (default: 20, max: 100)
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub page_size: u64,
    /// Only unread notifications
    #[serde(default)]
    pub unread_only: bool,
    /// Include unread count in response metadata
    #[serde(default)]
    pub with_unread_count: bool,
}

const fn default_page_size() -> u64 {
    20
}

/// Notifications response with paging metadata.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub total_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u64>,
}

/// Notification response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub created_at: String,
    pub is_read: bool,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
}

impl From<NotificationModel> for NotificationResponse {
    fn from(n: NotificationModel) -> Self {
        Self {
            id: n.id,
            created_at: n.created_at.to_rfc3339(),
            is_read: n.is_read,
            kind: n.kind.as_str().to_string(),
            message: n.message,
            link: n.link,
            actor_id: n.actor_id,
        }
    }
}

/// Get notifications for the authenticated user.
async fn get_notifications(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListNotificationsRequest>,
) -> AppResult<ApiResponse<NotificationsListResponse>> {
    req.validate()?;

    let (notifications, total_count) = state
        .notification_service
        .list(&user.id, req.page, req.page_size, req.unread_only)
        .await?;

    let unread_count = if req.with_unread_count {
        Some(state.notification_service.unread_count(&user.id).await?)
    } else {
        None
    };

    Ok(ApiResponse::ok(NotificationsListResponse {
        notifications: notifications.into_iter().map(Into::into).collect(),
        total_count,
        unread_count,
    }))
}

/// Mark notification as read request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsReadRequest {
    pub notification_id: String,
}

/// Mark as read response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsReadResponse {
    /// False when the notification is gone or not the caller's.
    pub updated: bool,
}

/// Mark a notification as read.
async fn mark_as_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<MarkAsReadRequest>,
) -> AppResult<ApiResponse<MarkAsReadResponse>> {
    let updated = state
        .notification_service
        .mark_read(&user.id, &req.notification_id)
        .await?;
    Ok(ApiResponse::ok(MarkAsReadResponse { updated }))
}

/// Mark all as read response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllAsReadResponse {
    pub count: u64,
}

/// Mark all notifications as read.
async fn mark_all_as_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MarkAllAsReadResponse>> {
    let count = state.notification_service.mark_all_read(&user.id).await?;
    Ok(ApiResponse::ok(MarkAllAsReadResponse { count }))
}

/// Unread count response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub count: u64,
}

/// Get unread notification count.
async fn unread_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UnreadCountResponse>> {
    let count = state.notification_service.unread_count(&user.id).await?;
    Ok(ApiResponse::ok(UnreadCountResponse { count }))
}

/// Delete notification request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNotificationRequest {
    pub notification_id: String,
}

/// Delete response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNotificationResponse {
    pub deleted: bool,
}

/// Delete a notification.
async fn delete_notification(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteNotificationRequest>,
) -> AppResult<ApiResponse<DeleteNotificationResponse>> {
    let deleted = state
        .notification_service
        .delete(&user.id, &req.notification_id)
        .await?;
    Ok(ApiResponse::ok(DeleteNotificationResponse { deleted }))
}

/// Delete all response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAllResponse {
    pub count: u64,
}

/// Delete all notifications.
async fn delete_all_notifications(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DeleteAllResponse>> {
    let count = state.notification_service.delete_all(&user.id).await?;
    Ok(ApiResponse::ok(DeleteAllResponse { count }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(get_notifications))
        .route("/mark-as-read", post(mark_as_read))
        .route("/mark-all-as-read", post(mark_all_as_read))
        .route("/unread-count", post(unread_count))
        .route("/delete", post(delete_notification))
        .route("/delete-all", post(delete_all_notifications))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_request_defaults() {
        let req: ListNotificationsRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.page, 0);
        assert_eq!(req.page_size, 20);
        assert!(!req.unread_only);
        assert!(!req.with_unread_count);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_list_request_rejects_oversized_page() {
        let req: ListNotificationsRequest =
            serde_json::from_str(r#"{"pageSize": 500}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
