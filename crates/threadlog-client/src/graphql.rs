//! GraphQL batch executor.
//!
//! Queries are sent as stored documents through the batch endpoint. The
//! response body may start with a `for (;;);` guard and holds several JSON
//! documents back to back; only the one keyed `o0` carries our result.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use threadlog_core::FetchError;

use crate::traits::{QueryExecutor, Transport};

/// Path of the batch endpoint relative to the base URL.
const BATCH_PATH: &str = "/api/graphqlbatch/";

/// Batch name the endpoint expects for thread queries.
const BATCH_NAME: &str = "MessengerGraphQLThreadFetcher";

/// Anti-hijacking prefix some endpoints put in front of JSON.
const JSON_GUARD: &[u8] = b"for (;;);";

/// Runs stored query documents over a [`Transport`].
pub struct GraphQlExecutor<T: Transport> {
    transport: T,
    endpoint: String,
}

impl<T: Transport> GraphQlExecutor<T> {
    pub fn new(transport: T, base_url: &str) -> Self {
        Self {
            transport,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), BATCH_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl<T: Transport> QueryExecutor for GraphQlExecutor<T> {
    #[instrument(skip(self, variables))]
    async fn run_query(&self, doc_id: &str, variables: Value) -> Result<Value, FetchError> {
        let queries = json!({
            "o0": {
                "doc_id": doc_id,
                "query_params": variables,
            }
        });

        let params = vec![
            ("batch_name".to_string(), BATCH_NAME.to_string()),
            ("queries".to_string(), queries.to_string()),
        ];

        debug!(endpoint = %self.endpoint, "Running query");
        let body = self.transport.post(&self.endpoint, params).await?;
        parse_batch_response(&body)
    }
}

/// Extract the `o0` result's `data` object from a batch response body.
pub fn parse_batch_response(body: &[u8]) -> Result<Value, FetchError> {
    let body = strip_guard(body);

    let mut documents = serde_json::Deserializer::from_slice(body).into_iter::<Value>();
    let result = loop {
        match documents.next() {
            Some(Ok(doc)) => {
                if let Some(result) = doc.get("o0") {
                    break result.clone();
                }
                // Trailing status documents such as {"successful_results":1}
            }
            Some(Err(e)) => return Err(FetchError::decode(e)),
            None => return Err(FetchError::Decode("response has no o0 result".to_string())),
        }
    };

    if let Some(message) = query_error(&result) {
        warn!("Query returned an error: {}", message);
        return Err(FetchError::Query { message });
    }

    match result.get("data") {
        Some(data) if !data.is_null() => Ok(data.clone()),
        _ => Err(FetchError::Decode("o0 result has no data".to_string())),
    }
}

fn strip_guard(body: &[u8]) -> &[u8] {
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    let body = &body[start..];
    body.strip_prefix(JSON_GUARD).unwrap_or(body)
}

fn query_error(result: &Value) -> Option<String> {
    if let Some(first) = result
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        let message = first
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| first.to_string());
        return Some(message);
    }

    match result.get("error") {
        Some(Value::String(message)) => Some(message.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
}
