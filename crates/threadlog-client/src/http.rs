//! reqwest-backed [`Transport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::Client;
use tracing::{debug, error, instrument};

use threadlog_core::config::ClientConfig;
use threadlog_core::FetchError;

use crate::traits::{FormParams, Transport};

/// Form-encoded POST transport.
///
/// Session values (cookie, common form parameters) are taken as given from
/// configuration and attached to every request.
pub struct HttpTransport {
    client: Client,
    common_params: FormParams,
    timeout_secs: u64,
}

impl HttpTransport {
    /// Build a transport from client configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = config.resolve_cookie() {
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| FetchError::InvalidRequest(format!("invalid cookie header: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let common_params = config
            .form_params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            client,
            common_params,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Form parameters attached to every request.
    pub fn common_params(&self) -> &FormParams {
        &self.common_params
    }

    fn map_send_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                seconds: self.timeout_secs,
            }
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, params), fields(param_count = params.len()))]
    async fn post(&self, url: &str, params: FormParams) -> Result<Vec<u8>, FetchError> {
        let mut form = self.common_params.clone();
        form.extend(params);

        debug!("Sending POST request");

        let response = self
            .client
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Request failed: {} - {}", status, error_text);
            return Err(FetchError::Http {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        Ok(body.to_vec())
    }
}
