//! HTTP client for the policy service API.
//!
//! Reads schema objects (resources, roles, relations, condition sets) and
//! facts (condition-set rules) for one project/environment. Every list
//! endpoint is paginated with `page`/`per_page`; pages are requested until a
//! short page comes back.

use async_trait::async_trait;
use policy_schema::EntityKind;
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::{debug, error, instrument, warn};

use crate::client::{ClientError, ClientResult, PolicyClient};
use crate::config::ServiceConfig;

/// Upper bound on pages per collection, guarding against a server that
/// never returns a short page.
const MAX_PAGES: u32 = 10_000;

/// Policy service client over HTTP.
#[derive(Clone)]
pub struct HttpPolicyClient {
    /// HTTP client instance.
    client: Client,

    /// Service configuration.
    config: ServiceConfig,
}

impl HttpPolicyClient {
    /// Create a new client from configuration.
    pub fn new(config: ServiceConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    /// Get the configuration this client was built with.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn schema_path(&self, suffix: &str) -> String {
        format!(
            "/v2/schema/{}/{}/{}",
            self.config.project, self.config.environment, suffix
        )
    }

    fn facts_path(&self, suffix: &str) -> String {
        format!(
            "/v2/facts/{}/{}/{}",
            self.config.project, self.config.environment, suffix
        )
    }

    /// Fetch every page of a collection.
    #[instrument(skip(self, query))]
    async fn list_collection(&self, path: &str, query: &[(&str, &str)]) -> ClientResult<Vec<Value>> {
        let url = self.config.endpoint.join(path);
        let per_page = self.config.page_size.max(1);
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            let mut request = self
                .client
                .get(&url)
                .query(query)
                .query(&[("page", page), ("per_page", per_page)]);

            if let Some(ref api_key) = self.config.endpoint.api_key {
                request = request.header("Authorization", format!("Bearer {}", api_key));
            }

            let response = request.send().await.map_err(|e| {
                if e.is_connect() {
                    ClientError::Unreachable(e.to_string())
                } else {
                    ClientError::RequestFailed(e)
                }
            })?;
            let body: Value = self.handle_response(response).await?;
            let batch = page_items(body)?;
            let received = batch.len();
            items.extend(batch);

            debug!(page, received, total = items.len(), "Fetched page");
            if received < per_page as usize {
                return Ok(items);
            }
        }

        Err(ClientError::InvalidResponse(format!(
            "{} did not finish paginating after {} pages",
            path, MAX_PAGES
        )))
    }

    /// Handle API response and parse JSON.
    async fn handle_response(&self, response: reqwest::Response) -> ClientResult<Value> {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            error!("Policy service authentication failed");
            return Err(ClientError::AuthenticationFailed);
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Policy service API error ({}): {}", status.as_u16(), message);
            return Err(ClientError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl PolicyClient for HttpPolicyClient {
    async fn ensure_ready(&self) -> ClientResult<()> {
        self.config.validate()?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, kind: EntityKind) -> ClientResult<Vec<Value>> {
        match kind {
            EntityKind::Resource => {
                self.list_collection(
                    &self.schema_path("resources"),
                    &[("include_built_in", "false")],
                )
                .await
            }
            EntityKind::Action => {
                let resources = self
                    .list_collection(
                        &self.schema_path("resources"),
                        &[("include_built_in", "false")],
                    )
                    .await?;
                Ok(flatten_actions(&resources))
            }
            EntityKind::UserAttribute => {
                self.list_collection(&self.schema_path("resources/__user/attributes"), &[])
                    .await
            }
            EntityKind::Role => self.list_collection(&self.schema_path("roles"), &[]).await,
            EntityKind::ResourceSet => {
                self.list_collection(
                    &self.schema_path("condition_sets"),
                    &[("type", "resourceset")],
                )
                .await
            }
            EntityKind::UserSet => {
                self.list_collection(&self.schema_path("condition_sets"), &[("type", "userset")])
                    .await
            }
            EntityKind::Relation => {
                self.list_collection(&self.schema_path("relations"), &[])
                    .await
            }
            EntityKind::ConditionSetRule => {
                self.list_collection(&self.facts_path("set_rules"), &[])
                    .await
            }
        }
    }
}

/// Extract the items of one page: either a bare array or `{ "data": [...] }`.
fn page_items(body: Value) -> ClientResult<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut object) => match object.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ClientError::InvalidResponse(
                "expected an array or an object with a `data` array".to_string(),
            )),
        },
        other => Err(ClientError::InvalidResponse(format!(
            "expected an array, got {}",
            other
        ))),
    }
}

/// Turn the actions nested in each resource into one flat collection.
///
/// Each action object gains its `key` and owning `resource`. Resources and
/// actions are kept in listing order; entries that are not objects are
/// passed through untouched so normalization can report them.
fn flatten_actions(resources: &[Value]) -> Vec<Value> {
    let mut actions = Vec::new();
    for resource in resources {
        let Some(resource_key) = resource.get("key").and_then(Value::as_str) else {
            continue;
        };
        let Some(nested) = resource.get("actions").and_then(Value::as_object) else {
            continue;
        };
        for (action_key, action) in nested {
            let mut flat = match action {
                Value::Object(fields) => fields.clone(),
                Value::Null => Map::new(),
                other => {
                    actions.push(other.clone());
                    continue;
                }
            };
            flat.insert("key".to_string(), json!(action_key));
            flat.insert("resource".to_string(), json!(resource_key));
            actions.push(Value::Object(flat));
        }
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceEndpoint;

    #[test]
    fn test_client_creation() {
        let config = ServiceConfig {
            endpoint: ServiceEndpoint {
                base_url: "http://localhost:7766".to_string(),
                api_key: Some("test-key".to_string()),
            },
            project: "acme".to_string(),
            environment: "staging".to_string(),
            ..ServiceConfig::default()
        };
        let client = HttpPolicyClient::new(config).unwrap();
        assert!(client.config().endpoint.has_api_key());
        assert_eq!(client.schema_path("roles"), "/v2/schema/acme/staging/roles");
        assert_eq!(client.facts_path("set_rules"), "/v2/facts/acme/staging/set_rules");
    }

    #[test]
    fn test_page_items_shapes() {
        assert_eq!(page_items(json!([1, 2])).unwrap().len(), 2);
        assert_eq!(page_items(json!({ "data": [1], "total_count": 1 })).unwrap().len(), 1);
        assert!(matches!(
            page_items(json!({ "items": [] })),
            Err(ClientError::InvalidResponse(_))
        ));
        assert!(matches!(
            page_items(json!("nope")),
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_flatten_actions() {
        let resources = vec![
            json!({
                "key": "document",
                "actions": {
                    "write": { "name": "Write" },
                    "read": { "name": "Read", "description": "Read a document" }
                }
            }),
            json!({ "key": "folder" }),
            json!({ "name": "no key", "actions": { "read": {} } }),
        ];
        let actions = flatten_actions(&resources);
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0]["key"], "read");
        assert_eq!(actions[0]["resource"], "document");
        assert_eq!(actions[0]["description"], "Read a document");
        assert_eq!(actions[1]["key"], "write");
    }
}
