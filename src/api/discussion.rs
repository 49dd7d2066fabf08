//! Comments and attachments on tasks and projects

use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use super::client::{ApiClient, FilePart, MultipartBody, PendingRequest};
use super::error::ApiError;
use crate::models::{Attachment, Comment};

const ATTACHMENTS_PATH: &str = "/attachments/";
/// Django app label the backend resolves attachment content types in.
const CONTENT_TYPE_APP: &str = "production";

/// Record a comment or file hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Subject {
    Task,
    Project,
}

impl Subject {
    fn comments_path(self) -> &'static str {
        match self {
            Self::Task => "/task-comments/",
            Self::Project => "/project-comments/",
        }
    }

    /// Model name sent as `content_type_model` on upload.
    fn model(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Project => "project",
        }
    }
}

/// Task comments name their parent `object_id`, project comments `project`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum NewComment<'a> {
    Task { object_id: i64, content: &'a str },
    Project { project: i64, content: &'a str },
}

pub async fn add_comment(
    client: &ApiClient,
    subject: Subject,
    id: i64,
    content: &str,
) -> Result<Comment, ApiError> {
    let body = match subject {
        Subject::Task => NewComment::Task {
            object_id: id,
            content,
        },
        Subject::Project => NewComment::Project {
            project: id,
            content,
        },
    };
    client.post(subject.comments_path(), &body).await
}

pub async fn delete_comment(
    client: &ApiClient,
    subject: Subject,
    comment_id: i64,
) -> Result<(), ApiError> {
    client
        .delete(&format!("{}{}/", subject.comments_path(), comment_id))
        .await
}

/// Upload `file_name`/`bytes` as a `multipart/form-data` attachment.
pub async fn upload_attachment(
    client: &ApiClient,
    subject: Subject,
    id: i64,
    file_name: &str,
    bytes: Vec<u8>,
    description: Option<&str>,
) -> Result<Attachment, ApiError> {
    let mut body = MultipartBody::default()
        .text("object_id", id.to_string())
        .text("content_type_model", subject.model())
        .text("content_type_app", CONTENT_TYPE_APP)
        .file(FilePart {
            field: "file".into(),
            file_name: file_name.to_string(),
            bytes,
        });
    if let Some(description) = description {
        body = body.text("description", description);
    }
    client
        .fetch(PendingRequest::post(ATTACHMENTS_PATH).multipart(body))
        .await
}

/// Read a local file and attach it.
pub async fn attach_file(
    client: &ApiClient,
    subject: Subject,
    id: i64,
    path: &Path,
    description: Option<&str>,
) -> anyhow::Result<Attachment> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("No usable file name in {}", path.display()))?;

    Ok(upload_attachment(client, subject, id, file_name, bytes, description).await?)
}

pub async fn delete_attachment(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client
        .delete(&format!("{}{}/", ATTACHMENTS_PATH, id))
        .await
}
