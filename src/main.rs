//! ERP CLI - admin client for the production resource-management backend
//!
//! Departments, positions, employees, projects and tasks from the terminal.

mod api;
mod auth;
mod config;
mod models;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::client::{ApiClient, RefreshPolicy};
use api::discussion::Subject;
use api::resources::Resource;
use config::Config;

#[derive(Parser)]
#[command(name = "erp-cli")]
#[command(about = "Admin client for the resource-management backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the configured API base URL for this invocation
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with username and password
    Login {
        #[arg(short, long)]
        username: String,

        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Log out and clear stored credentials
    Logout,

    /// Create an account with a role (no login needed)
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        role: String,

        /// Password (read from stdin twice when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create a staff account with an employee record
    CreateEmployee {
        #[arg(short, long)]
        username: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        middle_name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// Department id
        #[arg(long)]
        department: Option<i64>,

        /// Position id
        #[arg(long)]
        position: Option<i64>,

        /// Password (read from stdin twice when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Show current authentication status
    Status,

    /// Show current user profile (verify auth works)
    Whoami,

    /// List records of a collection
    List {
        resource: Resource,

        /// Filter as key=value, repeatable (e.g. --filter department=3)
        #[arg(short, long = "filter", value_parser = parse_key_val)]
        filters: Vec<(String, String)>,
    },

    /// Show a single record
    Show { resource: Resource, id: i64 },

    /// Create a record from a JSON object
    Create {
        resource: Resource,

        #[arg(short, long)]
        json: String,
    },

    /// Replace a record with a JSON object
    Update {
        resource: Resource,
        id: i64,

        #[arg(short, long)]
        json: String,
    },

    /// Delete a record
    Delete { resource: Resource, id: i64 },

    /// Name completion for a collection
    Suggest { resource: Resource, query: String },

    /// Task review workflow
    #[command(subcommand)]
    Tasks(TaskCommands),

    /// Comment on a task or project
    #[command(subcommand)]
    Comment(CommentCommands),

    /// Files attached to tasks and projects
    #[command(subcommand)]
    Attachment(AttachmentCommands),

    /// Dashboard summary and unread notifications
    Dashboard,

    /// Unread notifications
    Notifications,

    /// View or change settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Tasks assigned to me
    Mine,

    /// Report one of my tasks as done
    Submit { id: i64 },

    /// Confirm a task reported as complete
    Confirm { id: i64 },

    /// Return a task reported as complete to its assignee
    Reject {
        id: i64,

        #[arg(short, long)]
        reason: String,
    },
}

#[derive(Subcommand)]
enum CommentCommands {
    /// Add a comment
    Add {
        subject: Subject,
        id: i64,

        #[arg(short, long)]
        text: String,
    },

    /// Delete a comment by its own id
    Delete { subject: Subject, comment_id: i64 },
}

#[derive(Subcommand)]
enum AttachmentCommands {
    /// Upload a file
    Upload {
        subject: Subject,
        id: i64,
        file: PathBuf,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete an attachment by id
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Set the API base URL
    SetUrl { url: String },

    /// Choose how concurrent requests share a token refresh
    SetRefreshPolicy {
        #[arg(value_enum)]
        policy: RefreshPolicy,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

fn read_password() -> Result<String> {
    prompt_password("Password: ")
}

/// Password plus its confirmation, both read from stdin.
fn read_new_password() -> Result<(String, String)> {
    let password = prompt_password("Password: ")?;
    let confirmation = prompt_password("Repeat password: ")?;
    Ok((password, confirmation))
}

fn prompt_password(prompt: &str) -> Result<String> {
    eprint!("{}", prompt);
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    Ok(password)
}

/// Settings edits go to the file as stored, ignoring `--api-url`.
fn config_command(cmd: ConfigCommands, mut config: Config) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommands::SetUrl { url } => {
            config.set_api_base_url(&url)?;
            config.save()?;
            println!("API URL set to {}", config.api_base_url);
        }
        ConfigCommands::SetRefreshPolicy { policy } => {
            config.refresh_policy = policy;
            config.save()?;
            println!("Refresh policy set to {:?}", config.refresh_policy);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = Config::load()?;
    if let Some(url) = &cli.api_url {
        config.set_api_base_url(url)?;
    }
    let connect = || ApiClient::connect(&config);

    match cli.command {
        Commands::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            auth::login(&connect()?, &username, &password).await?;
        }
        Commands::Logout => {
            tracing::info!("Logging out...");
            auth::logout(&connect()?)?;
        }
        Commands::Register {
            username,
            email,
            role,
            password,
        } => {
            let (password, password2) = match password {
                Some(p) => (p.clone(), p),
                None => read_new_password()?,
            };
            let form = auth::Registration {
                username,
                email,
                password,
                password2,
                role,
            };
            auth::register(&connect()?, &form).await?;
            println!("Account {} created. Run 'erp-cli login' to sign in.", form.username);
        }
        Commands::CreateEmployee {
            username,
            first_name,
            last_name,
            middle_name,
            email,
            phone,
            department,
            position,
            password,
        } => {
            let (password, password2) = match password {
                Some(p) => (p.clone(), p),
                None => read_new_password()?,
            };
            let form = auth::NewEmployee {
                username,
                password,
                password2,
                first_name,
                last_name,
                middle_name,
                email,
                phone_number: phone,
                department,
                position,
            };
            auth::create_employee(&connect()?, &form).await?;
            println!("Employee account {} created.", form.username);
        }
        Commands::Status => {
            auth::status(&connect()?)?;
        }
        Commands::Whoami => {
            api::whoami(&connect()?).await?;
        }
        Commands::List { resource, filters } => {
            api::list(&connect()?, resource, &filters).await?;
        }
        Commands::Show { resource, id } => {
            api::show(&connect()?, resource, id).await?;
        }
        Commands::Create { resource, json } => {
            api::create(&connect()?, resource, &json).await?;
        }
        Commands::Update { resource, id, json } => {
            api::update(&connect()?, resource, id, &json).await?;
        }
        Commands::Delete { resource, id } => {
            api::delete(&connect()?, resource, id).await?;
        }
        Commands::Suggest { resource, query } => {
            api::suggest(&connect()?, resource, &query).await?;
        }
        Commands::Tasks(cmd) => {
            let client = connect()?;
            match cmd {
                TaskCommands::Mine => api::my_tasks(&client).await?,
                TaskCommands::Submit { id } => api::submit_task(&client, id).await?,
                TaskCommands::Confirm { id } => api::confirm_task(&client, id).await?,
                TaskCommands::Reject { id, reason } => {
                    api::reject_task(&client, id, &reason).await?
                }
            }
        }
        Commands::Comment(cmd) => {
            let client = connect()?;
            match cmd {
                CommentCommands::Add { subject, id, text } => {
                    api::comment(&client, subject, id, &text).await?
                }
                CommentCommands::Delete {
                    subject,
                    comment_id,
                } => api::delete_comment(&client, subject, comment_id).await?,
            }
        }
        Commands::Attachment(cmd) => {
            let client = connect()?;
            match cmd {
                AttachmentCommands::Upload {
                    subject,
                    id,
                    file,
                    description,
                } => api::attach(&client, subject, id, &file, description.as_deref()).await?,
                AttachmentCommands::Delete { id } => api::delete_attachment(&client, id).await?,
            }
        }
        Commands::Dashboard => {
            api::dashboard(&connect()?).await?;
        }
        Commands::Notifications => {
            api::notifications(&connect()?).await?;
        }
        Commands::Config(cmd) => {
            config_command(cmd, Config::load()?)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("department=3").unwrap(),
            ("department".to_string(), "3".to_string())
        );
        assert_eq!(
            parse_key_val("name=a=b").unwrap(),
            ("name".to_string(), "a=b".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_cli_parses_filters() {
        let cli = Cli::try_parse_from([
            "erp-cli",
            "list",
            "positions",
            "--filter",
            "department=3",
        ])
        .unwrap();
        match cli.command {
            Commands::List { resource, filters } => {
                assert_eq!(resource, Resource::Positions);
                assert_eq!(filters, vec![("department".to_string(), "3".to_string())]);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_cli_parses_refresh_policy() {
        let args = ["erp-cli", "config", "set-refresh-policy", "per-request"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Config(ConfigCommands::SetRefreshPolicy { policy }) => {
                assert_eq!(policy, RefreshPolicy::PerRequest);
            }
            _ => panic!("expected set-refresh-policy"),
        }
        assert!(Cli::try_parse_from(["erp-cli", "config", "set-refresh-policy", "eager"]).is_err());
    }

    #[test]
    fn test_cli_parses_task_submit_and_comment() {
        let cli = Cli::try_parse_from(["erp-cli", "tasks", "submit", "7"]).unwrap();
        assert!(matches!(cli.command, Commands::Tasks(TaskCommands::Submit { id: 7 })));

        let cli = Cli::try_parse_from([
            "erp-cli",
            "comment",
            "add",
            "project",
            "4",
            "--text",
            "Budget approved",
        ])
        .unwrap();
        match cli.command {
            Commands::Comment(CommentCommands::Add { subject, id, text }) => {
                assert_eq!(subject, Subject::Project);
                assert_eq!(id, 4);
                assert_eq!(text, "Budget approved");
            }
            _ => panic!("expected comment add"),
        }
    }
}
