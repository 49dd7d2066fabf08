//! Account registration
//!
//! Self-service sign-up posts to `/auth/register/` without credentials.
//! Managers create staff accounts through `/auth/create-employee/`, which
//! goes through the gateway like any other authorized call.

use anyhow::{bail, Context, Result};
use reqwest::StatusCode;
use serde::Serialize;

use crate::api::client::{ApiClient, PendingRequest};
use crate::api::error::ApiError;

const REGISTER_PATH: &str = "/auth/register/";
const CREATE_EMPLOYEE_PATH: &str = "/auth/create-employee/";

/// Sign-up form. The backend checks that both passwords match.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    pub role: String,
}

/// Staff account created by a manager.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewEmployee {
    pub username: String,
    pub password: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

fn check_passwords(password: &str, confirmation: &str) -> Result<()> {
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    if password != confirmation {
        bail!("Passwords do not match.");
    }
    Ok(())
}

/// Field errors come back as a rendered 400; show them without the URL noise.
fn rejected(e: ApiError, what: &str) -> anyhow::Error {
    match e {
        ApiError::Status { status, body, .. } if status == StatusCode::BAD_REQUEST => {
            anyhow::anyhow!("{} rejected:\n{}", what, body)
        }
        other => anyhow::Error::new(other).context(format!("{} failed", what)),
    }
}

pub async fn register(client: &ApiClient, form: &Registration) -> Result<serde_json::Value> {
    check_passwords(&form.password, &form.password2)?;

    let req = PendingRequest::post(REGISTER_PATH)
        .json(form)
        .context("Failed to encode registration")?;
    client
        .fetch_anonymous(req)
        .await
        .map_err(|e| rejected(e, "Registration"))
}

pub async fn create_employee(client: &ApiClient, form: &NewEmployee) -> Result<serde_json::Value> {
    check_passwords(&form.password, &form.password2)?;

    client
        .post(CREATE_EMPLOYEE_PATH, form)
        .await
        .map_err(|e| rejected(e, "Employee creation"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::redirect::testing::RecordingRedirect;
    use crate::auth::MemorySessionStore;
    use crate::config::Config;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, store: MemorySessionStore) -> ApiClient {
        let config = Config {
            api_base_url: format!("{}/api", server.uri()),
            ..Config::default()
        };
        ApiClient::new(&config, Arc::new(store), Arc::new(RecordingRedirect::default())).unwrap()
    }

    fn sign_up() -> Registration {
        Registration {
            username: "okoval".into(),
            email: "okoval@example.com".into(),
            password: "s3cret-pass".into(),
            password2: "s3cret-pass".into(),
            role: "Worker".into(),
        }
    }

    #[tokio::test]
    async fn test_register_posts_form_without_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/register/"))
            .and(header("authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/register/"))
            .and(body_json(json!({
                "username": "okoval",
                "email": "okoval@example.com",
                "password": "s3cret-pass",
                "password2": "s3cret-pass",
                "role": "Worker"
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"username": "okoval", "role": "Worker"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, MemorySessionStore::with_credentials("A1", Some("R1")));
        let created = register(&client, &sign_up()).await.unwrap();
        assert_eq!(created["username"], "okoval");
    }

    #[tokio::test]
    async fn test_register_surfaces_field_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/register/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "username": ["A user with that username already exists."]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, MemorySessionStore::new());
        let err = register(&client, &sign_up()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Registration rejected:\nusername: A user with that username already exists."
        );
    }

    #[tokio::test]
    async fn test_mismatched_passwords_never_reach_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let form = Registration {
            password2: "typo".into(),
            ..sign_up()
        };
        let client = client(&server, MemorySessionStore::new());
        let err = register(&client, &form).await.unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match.");
    }

    #[tokio::test]
    async fn test_create_employee_goes_through_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/create-employee/"))
            .and(header("authorization", "Bearer A1"))
            .and(body_json(json!({
                "username": "ipetrenko",
                "password": "welder-2025",
                "password2": "welder-2025",
                "first_name": "Ivan",
                "last_name": "Petrenko",
                "department": 3
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 42})))
            .expect(1)
            .mount(&server)
            .await;

        let form = NewEmployee {
            username: "ipetrenko".into(),
            password: "welder-2025".into(),
            password2: "welder-2025".into(),
            first_name: "Ivan".into(),
            last_name: "Petrenko".into(),
            department: Some(3),
            ..NewEmployee::default()
        };
        let client = client(&server, MemorySessionStore::with_credentials("A1", Some("R1")));
        let created = create_employee(&client, &form).await.unwrap();
        assert_eq!(created["id"], 42);
    }
}
