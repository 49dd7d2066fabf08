//! Task workflow endpoints beyond plain CRUD

use serde::Serialize;

use super::client::{ApiClient, PendingRequest};
use super::error::ApiError;
use crate::models::Task;

#[derive(Debug, Serialize)]
struct RejectRequest<'a> {
    reason: &'a str,
}

/// Tasks assigned to the signed-in user.
pub async fn my_tasks(client: &ApiClient) -> Result<Vec<Task>, ApiError> {
    client.get("/tasks/my/").await
}

/// Report an assigned task as done; it waits for a manager's confirmation.
pub async fn submit_complete(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client
        .send(PendingRequest::post(format!("/tasks/{}/submit-complete/", id)))
        .await?;
    Ok(())
}

/// Accept a task the assignee reported as done.
pub async fn confirm_complete(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client
        .send(PendingRequest::post(format!("/tasks/{}/confirm-complete/", id)))
        .await?;
    Ok(())
}

/// Send a completed task back to the assignee.
pub async fn reject_complete(client: &ApiClient, id: i64, reason: &str) -> Result<(), ApiError> {
    let req = PendingRequest::post(format!("/tasks/{}/reject-complete/", id))
        .json(&RejectRequest { reason })?;
    client.send(req).await?;
    Ok(())
}
