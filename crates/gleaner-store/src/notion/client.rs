//! Notion REST client implementing [`DocumentStore`].
//!
//! Every HTTP request, including each page of a listing and each chunk of
//! an append, is paced and retried on its own through [`ResilientCaller`].

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, instrument};

use gleaner_core::defaults::{
    STORE_API_VERSION, STORE_MAX_APPEND, STORE_PAGE_SIZE, STORE_TIMEOUT_SECS, STORE_URL,
};
use gleaner_core::{
    ContentNode, DocumentStore, Error, PropertyMap, RecordQuery, ResilientCaller, Result,
    RetryPolicy, StoreRecord,
};

use super::error::{to_gleaner_error, NotionErrorCode};
use super::types::*;

/// Configuration for the Notion client.
#[derive(Debug, Clone)]
pub struct NotionConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// Integration token.
    pub token: String,
    /// Value of the `Notion-Version` header.
    pub api_version: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Page size for list endpoints.
    pub page_size: u32,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            base_url: STORE_URL.to_string(),
            token: String::new(),
            api_version: STORE_API_VERSION.to_string(),
            timeout_seconds: STORE_TIMEOUT_SECS,
            page_size: STORE_PAGE_SIZE,
        }
    }
}

impl NotionConfig {
    /// Read `NOTION_TOKEN` (required), `NOTION_BASE_URL`, `NOTION_VERSION`
    /// and `NOTION_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("NOTION_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::Config("NOTION_TOKEN is not set".to_string()))?;

        Ok(Self {
            base_url: std::env::var("NOTION_BASE_URL").unwrap_or_else(|_| STORE_URL.to_string()),
            token: token.trim().to_string(),
            api_version: std::env::var("NOTION_VERSION")
                .unwrap_or_else(|_| STORE_API_VERSION.to_string()),
            timeout_seconds: std::env::var("NOTION_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(STORE_TIMEOUT_SECS),
            page_size: STORE_PAGE_SIZE,
        })
    }
}

/// Document store backed by the Notion API.
pub struct NotionStore {
    client: Client,
    config: NotionConfig,
    caller: ResilientCaller,
}

impl NotionStore {
    /// Create a new client with the given configuration.
    pub fn new(config: NotionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "store",
            component = "notion",
            url = %config.base_url,
            api_version = %config.api_version,
            "Initializing Notion store"
        );

        Ok(Self {
            client,
            config,
            caller: ResilientCaller::default(),
        })
    }

    /// Replace the pacing and rate-limit retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.caller = ResilientCaller::new(policy);
        self
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(NotionConfig::from_env()?)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &NotionConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.caller.policy()
    }

    /// Build a request with authentication and version headers.
    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        self.client
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Notion-Version", &self.config.api_version)
    }

    /// Send a request under the retry policy and decode a successful JSON
    /// body.
    async fn send<T: DeserializeOwned>(&self, op: &str, req: RequestBuilder) -> Result<T> {
        self.caller
            .call(op, move || {
                let attempt = req.try_clone();
                async move {
                    let response = check(replayable(attempt)?.send().await?).await?;
                    Ok::<T, Error>(response.json().await?)
                }
            })
            .await
    }

    /// Send a request under the retry policy, ignoring a successful body.
    async fn send_unit(&self, op: &str, req: RequestBuilder) -> Result<()> {
        self.caller
            .call(op, move || {
                let attempt = req.try_clone();
                async move {
                    check(replayable(attempt)?.send().await?).await?;
                    Ok::<(), Error>(())
                }
            })
            .await
    }
}

fn replayable(req: Option<RequestBuilder>) -> Result<RequestBuilder> {
    req.ok_or_else(|| Error::Internal("Request body cannot be replayed".to_string()))
}

/// Map a non-success response to an error.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body: NotionErrorBody = response.json().await.unwrap_or_default();
    let code = NotionErrorCode::from_response(status.as_u16(), &body.code);
    let message = if body.message.is_empty() {
        status.to_string()
    } else {
        body.message
    };
    Err(to_gleaner_error(status.as_u16(), code, &message))
}

#[async_trait]
impl DocumentStore for NotionStore {
    #[instrument(skip(self, query), fields(subsystem = "store", op = "list_due"))]
    async fn list_due(&self, collection_id: &str, query: &RecordQuery) -> Result<Vec<StoreRecord>> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let body = QueryRequest::new(query, self.config.page_size, cursor.take());
            let page: ListResponse<WirePage> = self
                .send(
                    "list_due",
                    self.request(Method::POST, &format!("/databases/{}/query", collection_id))
                        .json(&body),
                )
                .await?;

            for wire in page.results {
                records.push(wire.into_record()?);
            }

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        debug!(item_count = records.len(), "Listed records");
        Ok(records)
    }

    #[instrument(skip(self), fields(subsystem = "store", op = "list_children"))]
    async fn list_children(&self, node_id: &str) -> Result<Vec<ContentNode>> {
        let mut nodes = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut req = self
                .request(Method::GET, &format!("/blocks/{}/children", node_id))
                .query(&[("page_size", self.config.page_size.to_string())]);
            if let Some(c) = cursor.take() {
                req = req.query(&[("start_cursor", c)]);
            }

            let page: ListResponse<Value> = self.send("list_children", req).await?;
            for raw in page.results {
                nodes.push(block_to_node(raw)?);
            }

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        debug!(item_count = nodes.len(), "Listed children");
        Ok(nodes)
    }

    #[instrument(skip(self, properties), fields(subsystem = "store", op = "create"))]
    async fn create(&self, collection_id: &str, properties: PropertyMap) -> Result<String> {
        let body = json!({
            "parent": { "database_id": collection_id },
            "properties": properties_json(&properties),
        });
        let page: CreatedPage = self
            .send("create", self.request(Method::POST, "/pages").json(&body))
            .await?;
        debug!(record_id = %page.id, "Created record");
        Ok(page.id)
    }

    #[instrument(skip(self, properties), fields(subsystem = "store", op = "update"))]
    async fn update(&self, id: &str, properties: PropertyMap) -> Result<()> {
        let body = json!({ "properties": properties_json(&properties) });
        self.send_unit(
            "update",
            self.request(Method::PATCH, &format!("/pages/{}", id))
                .json(&body),
        )
        .await
    }

    #[instrument(skip(self, lines), fields(subsystem = "store", op = "append_after", item_count = lines.len()))]
    async fn append_after(&self, parent_id: &str, after_id: &str, lines: &[String]) -> Result<()> {
        let mut anchor = after_id.to_string();

        // Each chunk goes after the last block of the previous one.
        for chunk in lines.chunks(STORE_MAX_APPEND) {
            let children: Vec<Value> = chunk.iter().map(|l| bullet_block_json(l)).collect();
            let body = json!({ "children": children, "after": anchor });
            let created: ListResponse<CreatedBlock> = self
                .send(
                    "append_after",
                    self.request(Method::PATCH, &format!("/blocks/{}/children", parent_id))
                        .json(&body),
                )
                .await?;
            if let Some(last) = created.results.last() {
                anchor = last.id.clone();
            }
        }
        Ok(())
    }

    #[instrument(skip(self), fields(subsystem = "store", op = "delete_node"))]
    async fn delete_node(&self, id: &str) -> Result<()> {
        self.send_unit("delete_node", self.request(Method::DELETE, &format!("/blocks/{}", id)))
            .await
    }

    #[instrument(skip(self), fields(subsystem = "store", op = "archive"))]
    async fn archive(&self, id: &str) -> Result<()> {
        self.send_unit(
            "archive",
            self.request(Method::PATCH, &format!("/pages/{}", id))
                .json(&json!({ "archived": true })),
        )
        .await
    }
}
