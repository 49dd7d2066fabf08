//! Projects and tasks

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status_display: Option<String>,
    #[serde(default)]
    pub last_modified_by_name: Option<String>,
    #[serde(default)]
    pub last_modified_at: Option<String>,
}

/// Task assigned to an employee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project: Option<i64>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub assignee: Option<i64>,
    #[serde(default)]
    pub assignee_name: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_display: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}
