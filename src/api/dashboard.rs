//! Dashboard summary and notifications

use super::client::ApiClient;
use super::error::ApiError;
use crate::models::Notification;

/// Aggregate counters for the dashboard. The shape is backend-defined.
pub async fn summary(client: &ApiClient) -> Result<serde_json::Value, ApiError> {
    client.get("/dashboard/summary/").await
}

pub async fn unread_notifications(client: &ApiClient) -> Result<Vec<Notification>, ApiError> {
    client.get("/notifications/unread/").await
}
