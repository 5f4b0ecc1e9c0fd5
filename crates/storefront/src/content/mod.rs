//! GraphQL content API client.
//!
//! # Architecture
//!
//! - Request and response envelopes come from `graphql_client`
//! - Documents live in `graphql/*.graphql` and are embedded at compile time
//! - HTTP goes through `reqwest` directly
//!
//! The content service is the source of truth for products and orders; nothing
//! here caches or syncs.

pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use graphql_client::{QueryBody, Response};
use pupusas_core::Catalog;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::ContentConfig;
use crate::ports::{CatalogSource, OrderService};

pub use types::{CreatedOrder, OrderInput, OrderItems};

/// Read query for the product listing.
pub const PRODUCTS_QUERY: &str = include_str!("../../graphql/products.graphql");

/// Mutation creating an order from an `OrderCreateInput`.
pub const CREATE_ORDER_MUTATION: &str = include_str!("../../graphql/create_order.graphql");

/// Errors that can occur when talking to the content API.
#[derive(Debug, Error)]
pub enum ContentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response carried neither data nor errors.
    #[error("No data in response")]
    MissingData,
}

/// A GraphQL error returned by the content API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(e: graphql_client::Error) -> Self {
        Self {
            message: e.message,
            locations: e.locations.map_or_else(Vec::new, |locs| {
                locs.into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: i64::from(l.line),
                        column: i64::from(l.column),
                    })
                    .collect()
            }),
            path: e.path.map_or_else(Vec::new, |p| {
                p.into_iter()
                    .map(|fragment| match fragment {
                        graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                        graphql_client::PathFragment::Index(i) => {
                            serde_json::Value::Number(i.into())
                        }
                    })
                    .collect()
            }),
        }
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// First 500 characters of a response body, for logs and error messages.
fn truncate_body(body: &str) -> String {
    body.chars().take(500).collect()
}

// =============================================================================
// ContentClient
// =============================================================================

/// Client for the GraphQL content API.
#[derive(Clone)]
pub struct ContentClient {
    inner: Arc<ContentClientInner>,
}

struct ContentClientInner {
    client: reqwest::Client,
    endpoint: String,
    auth_token: Option<SecretString>,
}

impl ContentClient {
    /// Create a new content API client.
    #[must_use]
    pub fn new(config: &ContentConfig) -> Self {
        Self {
            inner: Arc::new(ContentClientInner {
                client: reqwest::Client::new(),
                endpoint: config.endpoint.clone(),
                auth_token: config.auth_token.clone(),
            }),
        }
    }

    /// Execute a GraphQL document and decode its `data` object.
    async fn execute<V, D>(
        &self,
        operation_name: &'static str,
        query: &'static str,
        variables: V,
    ) -> Result<D, ContentError>
    where
        V: Serialize + Send,
        D: DeserializeOwned,
    {
        let request_body = QueryBody {
            variables,
            query,
            operation_name,
        };

        let mut request = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("Content-Type", "application/json")
            .json(&request_body);
        if let Some(token) = &self.inner.auth_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate_body(&response_text),
                "Content API returned non-success status"
            );
            return Err(ContentError::Status {
                status: status.as_u16(),
                body: truncate_body(&response_text),
            });
        }

        decode_response(&response_text)
    }
}

/// Decode a GraphQL response body, surfacing GraphQL errors before data.
fn decode_response<D: DeserializeOwned>(body: &str) -> Result<D, ContentError> {
    let response: Response<D> = serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %truncate_body(body),
            "Failed to parse content API response"
        );
        ContentError::Parse(e)
    })?;

    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        debug!(errors = ?errors, "GraphQL errors in response");
        return Err(ContentError::GraphQL(
            errors.into_iter().map(GraphQLError::from).collect(),
        ));
    }

    response.data.ok_or(ContentError::MissingData)
}

/// Variables for documents that take none.
#[derive(Debug, Serialize)]
struct NoVariables {}

/// Variables of the `CreateOrder` mutation.
#[derive(Debug, Serialize)]
struct CreateOrderVariables<'a> {
    data: &'a OrderInput,
}

/// `data` object of the `CreateOrder` mutation.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderData {
    create_order: Option<CreatedOrder>,
}

#[async_trait]
impl CatalogSource for ContentClient {
    #[instrument(skip(self))]
    async fn fetch_catalog(&self) -> Result<Catalog, ContentError> {
        let data: serde_json::Value = self
            .execute("Products", PRODUCTS_QUERY, NoVariables {})
            .await?;
        Ok(Catalog::new(data))
    }
}

#[async_trait]
impl OrderService for ContentClient {
    #[instrument(skip(self, input), fields(customer = %input.customer_name, lines = input.items.create.len()))]
    async fn create_order(&self, input: &OrderInput) -> Result<CreatedOrder, ContentError> {
        debug!(order = ?input, "Submitting order");

        let data: CreateOrderData = self
            .execute(
                "CreateOrder",
                CREATE_ORDER_MUTATION,
                CreateOrderVariables { data: input },
            )
            .await?;

        data.create_order.ok_or(ContentError::MissingData)
    }
}
