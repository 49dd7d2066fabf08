//! API client module for the ERP backend

pub mod client;
mod dashboard;
pub mod discussion;
pub mod error;
pub mod profile;
pub mod resources;
mod tasks;

use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{Department, Employee, Notification, Position, Project, Task};
use client::ApiClient;
use discussion::Subject;
use resources::Resource;

/// List a collection as a table
pub async fn list(
    client: &ApiClient,
    resource: Resource,
    filters: &[(String, String)],
) -> Result<()> {
    match resource {
        Resource::Departments => {
            let rows: Vec<Department> = resources::list(client, resource, filters).await?;
            println!("{:>6}  NAME", "ID");
            for d in rows {
                println!("{:>6}  {}", d.id, d.name);
            }
        }
        Resource::Positions => {
            let rows: Vec<Position> = resources::list(client, resource, filters).await?;
            println!("{:>6}  {:<32} DEPARTMENT", "ID", "NAME");
            for p in rows {
                let dept = p.department.map_or_else(|| "-".to_string(), |d| d.to_string());
                println!("{:>6}  {:<32} {}", p.id, p.name, dept);
            }
        }
        Resource::Employees => {
            let rows: Vec<Employee> = resources::list(client, resource, filters).await?;
            println!("{:>6}  {:<36} {:<28} PHONE", "ID", "NAME", "EMAIL");
            for e in rows {
                println!(
                    "{:>6}  {:<36} {:<28} {}",
                    e.id,
                    e.full_name(),
                    e.email.as_deref().unwrap_or("-"),
                    e.phone_number.as_deref().unwrap_or("-")
                );
            }
        }
        Resource::Projects => {
            let rows: Vec<Project> = resources::list(client, resource, filters).await?;
            println!("{:>6}  {:<32} {:<10} {:<10} STATUS", "ID", "NAME", "START", "END");
            for p in rows {
                println!(
                    "{:>6}  {:<32} {:<10} {:<10} {}",
                    p.id,
                    p.name,
                    fmt_date(p.start_date),
                    fmt_date(p.end_date),
                    p.status_display.as_deref().unwrap_or("-")
                );
            }
        }
        Resource::Tasks => {
            let rows: Vec<Task> = resources::list(client, resource, filters).await?;
            print_tasks(&rows);
        }
    }
    Ok(())
}

/// Print one record as pretty JSON
pub async fn show(client: &ApiClient, resource: Resource, id: i64) -> Result<()> {
    let record: serde_json::Value = resources::get(client, resource, id).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub async fn create(client: &ApiClient, resource: Resource, json: &str) -> Result<()> {
    let body: serde_json::Value = serde_json::from_str(json).context("Invalid JSON payload")?;
    let created: serde_json::Value = resources::create(client, resource, &body).await?;
    println!("Created {}:", resource.name());
    println!("{}", serde_json::to_string_pretty(&created)?);
    Ok(())
}

pub async fn update(client: &ApiClient, resource: Resource, id: i64, json: &str) -> Result<()> {
    let body: serde_json::Value = serde_json::from_str(json).context("Invalid JSON payload")?;
    let updated: serde_json::Value = resources::update(client, resource, id, &body).await?;
    println!("Updated {} {}:", resource.name(), id);
    println!("{}", serde_json::to_string_pretty(&updated)?);
    Ok(())
}

pub async fn delete(client: &ApiClient, resource: Resource, id: i64) -> Result<()> {
    resources::delete(client, resource, id).await?;
    println!("Deleted {} {}.", resource.name(), id);
    Ok(())
}

pub async fn suggest(client: &ApiClient, resource: Resource, query: &str) -> Result<()> {
    let hits: Vec<serde_json::Value> = resources::suggest(client, resource, query).await?;
    for hit in hits {
        let id = hit.get("id").map(|v| v.to_string()).unwrap_or_default();
        let label = hit
            .get("name")
            .or_else(|| hit.get("title"))
            .and_then(|v| v.as_str())
            .unwrap_or("");
        println!("{:>6}  {}", id, label);
    }
    Ok(())
}

/// Tasks assigned to the current user
pub async fn my_tasks(client: &ApiClient) -> Result<()> {
    let rows = tasks::my_tasks(client).await?;
    print_tasks(&rows);
    Ok(())
}

pub async fn submit_task(client: &ApiClient, id: i64) -> Result<()> {
    tasks::submit_complete(client, id).await?;
    println!("Task {} sent to the manager for confirmation.", id);
    Ok(())
}

pub async fn confirm_task(client: &ApiClient, id: i64) -> Result<()> {
    tasks::confirm_complete(client, id).await?;
    println!("Task {} confirmed as complete.", id);
    Ok(())
}

pub async fn reject_task(client: &ApiClient, id: i64, reason: &str) -> Result<()> {
    tasks::reject_complete(client, id, reason).await?;
    println!("Task {} returned to assignee.", id);
    Ok(())
}

pub async fn comment(client: &ApiClient, subject: Subject, id: i64, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("Comment must not be empty");
    }
    let comment = discussion::add_comment(client, subject, id, text).await?;
    println!(
        "Comment {} added by {}.",
        comment.id,
        comment.author_name.as_deref().unwrap_or("you")
    );
    Ok(())
}

pub async fn delete_comment(client: &ApiClient, subject: Subject, comment_id: i64) -> Result<()> {
    discussion::delete_comment(client, subject, comment_id).await?;
    println!("Comment {} deleted.", comment_id);
    Ok(())
}

pub async fn attach(
    client: &ApiClient,
    subject: Subject,
    id: i64,
    file: &Path,
    description: Option<&str>,
) -> Result<()> {
    let attachment = discussion::attach_file(client, subject, id, file, description).await?;
    println!(
        "Attachment {} uploaded: {}",
        attachment.id,
        attachment.file.as_deref().unwrap_or("-")
    );
    Ok(())
}

pub async fn delete_attachment(client: &ApiClient, id: i64) -> Result<()> {
    discussion::delete_attachment(client, id).await?;
    println!("Attachment {} deleted.", id);
    Ok(())
}

/// Dashboard summary and unread notifications, fetched together
pub async fn dashboard(client: &ApiClient) -> Result<()> {
    let (summary, notifications) = futures::future::try_join(
        dashboard::summary(client),
        dashboard::unread_notifications(client),
    )
    .await?;

    println!("\nSummary:");
    match summary.as_object() {
        Some(fields) => {
            for (key, value) in fields {
                println!("  {:<24} {}", key, value);
            }
        }
        None => println!("  {}", summary),
    }

    println!();
    print_notifications(&notifications);
    Ok(())
}

pub async fn notifications(client: &ApiClient) -> Result<()> {
    let rows = dashboard::unread_notifications(client).await?;
    print_notifications(&rows);
    Ok(())
}

/// Show current user info (verify auth works)
pub async fn whoami(client: &ApiClient) -> Result<()> {
    let me = profile::fetch_profile(client).await?;

    println!();
    println!("Username: {}", me.username.as_deref().unwrap_or("(none)"));
    let name = [me.first_name.as_deref(), me.last_name.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    println!("Name:     {}", if name.is_empty() { "(none)" } else { name.as_str() });
    println!("Email:    {}", me.email.as_deref().unwrap_or("(none)"));
    println!("Role:     {}", me.role.as_deref().unwrap_or("(none)"));
    if let Some(id) = me.id {
        println!("ID:       {}", id);
    }
    Ok(())
}

fn fmt_date(date: Option<chrono::NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

fn print_tasks(rows: &[Task]) {
    println!(
        "{:>6}  {:<36} {:<24} {:<10} STATUS",
        "ID", "TITLE", "ASSIGNEE", "DUE"
    );
    for t in rows {
        println!(
            "{:>6}  {:<36} {:<24} {:<10} {}",
            t.id,
            t.title,
            t.assignee_name.as_deref().unwrap_or("-"),
            fmt_date(t.due_date),
            t.status_display
                .as_deref()
                .or(t.status.as_deref())
                .unwrap_or("-")
        );
    }
}

fn print_notifications(rows: &[Notification]) {
    if rows.is_empty() {
        println!("No unread notifications.");
        return;
    }
    println!("Unread notifications:");
    for n in rows {
        println!(
            "  [{}] {} (from {}, {})",
            n.task_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            n.task_title.as_deref().unwrap_or("(untitled)"),
            n.sender_name.as_deref().unwrap_or("unknown"),
            n.created_at.as_deref().unwrap_or("-")
        );
    }
}
