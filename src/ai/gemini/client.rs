use crate::ai::{RawResponse, Transport};
use crate::models::ConnectionConfig;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Where a request goes and which headers it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl Endpoint {
    /// Direct calls put the API key in the query string; proxied calls pass
    /// the gateway key and model name as headers.
    ///
    /// A `models/` prefix on the model id is stripped for direct URLs.
    pub fn for_connection(config: &ConnectionConfig, base_url: &str) -> Self {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];

        match config {
            ConnectionConfig::Direct {
                api_key,
                model_name,
            } => {
                let model = model_name.strip_prefix("models/").unwrap_or(model_name);
                Self {
                    url: format!(
                        "{}/v1beta/models/{}:generateContent?key={}",
                        base_url.trim_end_matches('/'),
                        model,
                        api_key
                    ),
                    headers,
                }
            }
            ConnectionConfig::Proxy {
                proxy_url,
                gateway_key,
                model_name,
            } => {
                headers.push(("x-api-key".to_string(), gateway_key.clone()));
                headers.push(("X-Model-Name".to_string(), model_name.clone()));
                Self {
                    url: proxy_url.clone(),
                    headers,
                }
            }
        }
    }

    /// URL without its query string, safe to log.
    pub fn redacted_url(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }
}

/// [`Transport`] over a shared `reqwest` client.
///
/// No timeout is applied unless one is configured.
pub struct ReqwestTransport {
    client: Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::new_with_client(Client::new())
    }

    pub fn new_with_client(client: Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, endpoint: &Endpoint, body: String) -> Result<RawResponse> {
        tracing::debug!(
            "Sending {} byte request to {}",
            body.len(),
            endpoint.redacted_url()
        );

        let mut request = self.client.post(&endpoint.url).body(body);
        for (name, value) in &endpoint.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            // the direct URL carries the API key
            let e = e.without_url();
            tracing::error!(
                "Failed to send request to {}: {}",
                endpoint.redacted_url(),
                e
            );
            e
        })?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!("Gemini responded with status {}", status);

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn direct(model: &str) -> ConnectionConfig {
        ConnectionConfig::Direct {
            api_key: "test-key".to_string(),
            model_name: model.to_string(),
        }
    }

    #[test]
    fn test_direct_endpoint_puts_key_in_query() {
        let endpoint = Endpoint::for_connection(
            &direct("models/gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/",
        );
        assert_eq!(
            endpoint.url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent?key=test-key"
        );
        assert_eq!(
            endpoint.redacted_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(endpoint.headers.len(), 1);
    }

    #[test]
    fn test_proxy_endpoint_uses_headers() {
        let endpoint = Endpoint::for_connection(
            &ConnectionConfig::Proxy {
                proxy_url: "https://gateway.example.com/gemini".to_string(),
                gateway_key: "gw-key".to_string(),
                model_name: "gemini-2.5-pro".to_string(),
            },
            "https://unused.example.com",
        );
        assert_eq!(endpoint.url, "https://gateway.example.com/gemini");
        assert!(endpoint
            .headers
            .contains(&("x-api-key".to_string(), "gw-key".to_string())));
        assert!(endpoint
            .headers
            .contains(&("X-Model-Name".to_string(), "gemini-2.5-pro".to_string())));
    }

    #[tokio::test]
    async fn test_post_sends_body_and_headers() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(serde_json::json!({ "contents": [] })))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}"))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = Endpoint::for_connection(&direct("gemini-2.5-flash"), &server.uri());
        let response = ReqwestTransport::new()
            .post(&endpoint, r#"{"contents":[]}"#.to_string())
            .await
            .unwrap();

        assert_eq!(response, RawResponse::new(200, "{\"ok\":true}"));
    }

    #[tokio::test]
    async fn test_post_passes_error_status_through() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("x-api-key", "gw-key"))
            .and(header("X-Model-Name", "gemini-2.5-pro"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let endpoint = Endpoint::for_connection(
            &ConnectionConfig::Proxy {
                proxy_url: format!("{}/relay", server.uri()),
                gateway_key: "gw-key".to_string(),
                model_name: "gemini-2.5-pro".to_string(),
            },
            "https://unused.example.com",
        );
        let response = ReqwestTransport::new()
            .with_timeout(Duration::from_secs(5))
            .post(&endpoint, "{}".to_string())
            .await
            .unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(response.body, "unavailable");
    }
}
