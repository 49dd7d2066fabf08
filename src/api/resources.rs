//! CRUD over the backend's collection endpoints

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::client::{ApiClient, PendingRequest};
use super::error::ApiError;

/// Collection exposed by the backend under `/<name>/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Resource {
    Departments,
    Positions,
    Employees,
    Projects,
    Tasks,
}

impl Resource {
    pub fn name(self) -> &'static str {
        match self {
            Self::Departments => "departments",
            Self::Positions => "positions",
            Self::Employees => "employees",
            Self::Projects => "projects",
            Self::Tasks => "tasks",
        }
    }

    pub fn collection_path(self) -> String {
        format!("/{}/", self.name())
    }

    pub fn item_path(self, id: i64) -> String {
        format!("/{}/{}/", self.name(), id)
    }

    /// Query parameter the `suggest/` endpoint matches on.
    fn suggest_param(self) -> &'static str {
        match self {
            Self::Tasks => "title",
            _ => "name",
        }
    }
}

/// List a collection, narrowed by `filters` (e.g. `department=3`).
pub async fn list<T: DeserializeOwned>(
    client: &ApiClient,
    resource: Resource,
    filters: &[(String, String)],
) -> Result<Vec<T>, ApiError> {
    let req = filters
        .iter()
        .fold(PendingRequest::get(resource.collection_path()), |req, (k, v)| {
            req.query(k, v)
        });
    client.fetch(req).await
}

pub async fn get<T: DeserializeOwned>(
    client: &ApiClient,
    resource: Resource,
    id: i64,
) -> Result<T, ApiError> {
    client.get(&resource.item_path(id)).await
}

pub async fn create<B, T>(client: &ApiClient, resource: Resource, body: &B) -> Result<T, ApiError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    client.post(&resource.collection_path(), body).await
}

/// Replace a record (PUT).
pub async fn update<B, T>(
    client: &ApiClient,
    resource: Resource,
    id: i64,
    body: &B,
) -> Result<T, ApiError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    client.put(&resource.item_path(id), body).await
}

pub async fn delete(client: &ApiClient, resource: Resource, id: i64) -> Result<(), ApiError> {
    client.delete(&resource.item_path(id)).await
}

/// Name completion via `/<resource>/suggest/`.
pub async fn suggest<T: DeserializeOwned>(
    client: &ApiClient,
    resource: Resource,
    query: &str,
) -> Result<Vec<T>, ApiError> {
    let req = PendingRequest::get(format!("/{}/suggest/", resource.name()))
        .query(resource.suggest_param(), query);
    client.fetch(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::redirect::testing::RecordingRedirect;
    use crate::auth::MemorySessionStore;
    use crate::config::Config;
    use crate::models::{Department, Position};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ApiClient {
        let config = Config {
            api_base_url: format!("{}/api", server.uri()),
            ..Config::default()
        };
        ApiClient::new(
            &config,
            Arc::new(MemorySessionStore::with_credentials("A1", Some("R1"))),
            Arc::new(RecordingRedirect::default()),
        )
        .unwrap()
    }

    #[test]
    fn test_paths() {
        assert_eq!(Resource::Employees.collection_path(), "/employees/");
        assert_eq!(Resource::Tasks.item_path(12), "/tasks/12/");
    }

    #[tokio::test]
    async fn test_list_with_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/positions/"))
            .and(query_param("department", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 5, "name": "Welder", "department": 2}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let filters = vec![("department".to_string(), "2".to_string())];
        let positions: Vec<Position> = list(&client(&server), Resource::Positions, &filters)
            .await
            .unwrap();

        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].name, "Welder");
        assert_eq!(positions[0].department, Some(2));
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/departments/"))
            .and(body_json(json!({"name": "Paint shop"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": 9, "name": "Paint shop"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/departments/9/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 9, "name": "Coating"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/departments/9/"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let body = json!({"name": "Paint shop"});
        let created: Department = create(&client, Resource::Departments, &body)
            .await
            .unwrap();
        assert_eq!(created.id, 9);

        let body = json!({"name": "Coating"});
        let updated: Department = update(&client, Resource::Departments, 9, &body)
            .await
            .unwrap();
        assert_eq!(updated.name, "Coating");

        delete(&client, Resource::Departments, 9).await.unwrap();
    }

    #[tokio::test]
    async fn test_suggest_uses_title_for_tasks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tasks/suggest/"))
            .and(query_param("title", "pre"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "title": "Press"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let hits: Vec<serde_json::Value> = suggest(&client(&server), Resource::Tasks, "pre")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }
}
