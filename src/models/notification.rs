//! Task notifications

use serde::{Deserialize, Serialize};

/// Unread notification about a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    #[serde(default)]
    pub task_id: Option<i64>,
    #[serde(default)]
    pub task_title: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}
