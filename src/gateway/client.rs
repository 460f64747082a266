//! Content-hub HTTP client.
//!
//! This module provides the JSON client for a content-hub service that
//! serves inventory, catalog templates and deployments. Responses use the
//! crate's own serde model, so the same shapes appear in snapshot files.

use async_trait::async_trait;
use reqwest::{Client, Method, Url, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::error::GatewayError;
use crate::model::{DeployOutcome, InstalledRef, InstalledResource, ResourceKind, Template};

use super::traits::{CatalogGateway, Deployer, GatewayResult, InventoryGateway};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts for retryable failures.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// Longest we wait on a rate-limit hint, in seconds.
const MAX_RATE_LIMIT_WAIT_SECS: u64 = 60;

/// Content-hub API client.
#[derive(Debug, Clone)]
pub struct HubClient {
    /// HTTP client.
    client: Client,
    /// Service base URL.
    base_url: Url,
    /// Bearer token.
    api_token: String,
    /// Attempts per request.
    max_retries: u32,
    /// Base retry delay.
    retry_delay: Duration,
}

/// Body of a deployment request.
#[derive(Debug, Serialize)]
struct DeployRequest<'a> {
    kind: ResourceKind,
    target: &'a InstalledRef,
    template: &'a Template,
}

impl HubClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: &str, api_token: &str) -> GatewayResult<Self> {
        Self::with_timeout(base_url, api_token, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(base_url: &str, api_token: &str, timeout_secs: u64) -> GatewayResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| GatewayError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl {
                url: base_url.to_string(),
                message: String::from("URL cannot carry a path"),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GatewayError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_token: api_token.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        })
    }

    /// Sets the number of attempts per request (at least one).
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Sets the base delay between retries.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Appends path segments to the base URL.
    ///
    /// Each segment is percent-encoded on its own, so identifiers containing
    /// `/`, `?` or `#` stay inside their segment.
    fn url(&self, segments: &[&str]) -> GatewayResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::InvalidUrl {
                url: self.base_url.to_string(),
                message: String::from("URL cannot carry a path"),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a request, retrying retryable failures.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&serde_json::Value>,
    ) -> GatewayResult<T> {
        let url = self.url(segments)?;
        let mut last_error: Option<GatewayError> = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let delay = last_error
                    .as_ref()
                    .map_or(self.retry_delay, |e| self.retry_delay_after(e, attempt));
                debug!("Retry attempt {attempt} of {} in {delay:?}", self.max_retries);
                tokio::time::sleep(delay).await;
            }

            match self.execute_once::<T>(method.clone(), &url, body).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() => {
                    warn!("Request to {} failed, will retry: {e}", url.path());
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| GatewayError::network("Max retries exceeded")))
    }

    /// Delay before the given retry attempt.
    ///
    /// Rate limits wait as long as the service asks, capped at
    /// [`MAX_RATE_LIMIT_WAIT_SECS`]. Other retryable failures back off
    /// linearly from the configured base delay.
    fn retry_delay_after(&self, last_error: &GatewayError, attempt: u32) -> Duration {
        match (last_error, last_error.retry_delay_secs()) {
            (GatewayError::RateLimited { .. }, Some(secs)) => {
                Duration::from_secs(secs.min(MAX_RATE_LIMIT_WAIT_SECS))
            }
            _ => self.retry_delay * attempt,
        }
    }

    /// Sends a single request.
    async fn execute_once<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &Url,
        body: Option<&serde_json::Value>,
    ) -> GatewayResult<T> {
        trace!("{method} {url}");

        let mut request = self
            .client
            .request(method, url.clone())
            .header(header::ACCEPT, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_token));

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::network(format!("Request failed: {e}")))?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or_default();
            let retry_after = if retry_after == 0 { MAX_RATE_LIMIT_WAIT_SECS } else { retry_after };

            return Err(GatewayError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(GatewayError::AuthenticationFailed {
                message: String::from("Invalid or expired API token"),
            });
        }

        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::network(format!("Server error {status}: {body}")));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::api_error(status.as_u16(), body));
        }

        response.json().await.map_err(|e| GatewayError::InvalidResponse {
            message: format!("Failed to parse response: {e}"),
        })
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> GatewayResult<T> {
        self.execute(Method::GET, segments, None).await
    }

    /// Checks that the token is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached.
    pub async fn validate_token(&self) -> GatewayResult<bool> {
        match self.get::<serde_json::Value>(&["catalog", "solutions", "installed"]).await {
            Ok(_) => Ok(true),
            Err(GatewayError::AuthenticationFailed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl InventoryGateway for HubClient {
    async fn list_installed(&self, kind: ResourceKind) -> GatewayResult<Vec<InstalledResource>> {
        let resources: Vec<InstalledResource> =
            self.get(&["inventory", kind.plural()]).await?;
        debug!("Fetched {} installed {}", resources.len(), kind.plural());
        Ok(resources)
    }
}

#[async_trait]
impl CatalogGateway for HubClient {
    async fn list_installed_solutions(&self) -> GatewayResult<Vec<InstalledResource>> {
        self.get(&["catalog", "solutions", "installed"]).await
    }

    async fn list_templates(&self, kind: ResourceKind) -> GatewayResult<Vec<Template>> {
        let templates: Vec<Template> = self
            .get(&["catalog", "templates", kind.plural()])
            .await?;
        debug!("Fetched {} {} templates", templates.len(), kind);
        Ok(templates)
    }

    async fn get_template_content(&self, template_id: &str) -> GatewayResult<Option<Template>> {
        match self.get(&["catalog", "templates", "id", template_id]).await {
            Ok(template) => Ok(Some(template)),
            Err(GatewayError::ApiRequestFailed { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Deployer for HubClient {
    async fn deploy(
        &self,
        kind: ResourceKind,
        target: &InstalledRef,
        payload: &Template,
    ) -> DeployOutcome {
        info!("Deploying {} update: {}", kind, target.name);

        let body = match serde_json::to_value(DeployRequest {
            kind,
            target,
            template: payload,
        }) {
            Ok(body) => body,
            Err(e) => return DeployOutcome::failed(format!("Failed to encode deployment: {e}")),
        };

        let segments = ["deployments", kind.plural(), target.id.as_str()];
        match self.execute::<DeployOutcome>(Method::POST, &segments, Some(&body)).await {
            Ok(outcome) => outcome,
            Err(e) => DeployOutcome::failed(e.to_string()),
        }
    }

    fn name(&self) -> &'static str {
        "content-hub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HubClient {
        HubClient::new(&server.uri(), "test-token")
            .expect("client builds")
            .with_retry_delay(Duration::from_millis(1))
    }

    fn template_json() -> serde_json::Value {
        serde_json::json!({
            "kind": "rule",
            "id": "tmpl-1",
            "display_name": "Brute force attempt",
            "version": "1.0.2",
            "properties": { "severity": "High", "tactics": ["CredentialAccess"] }
        })
    }

    #[tokio::test]
    async fn test_list_templates_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/catalog/templates/rules"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![template_json()]))
            .expect(1)
            .mount(&server)
            .await;

        let templates = client(&server)
            .list_templates(ResourceKind::Rule)
            .await
            .expect("templates");

        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].display_name, "Brute force attempt");
    }

    #[tokio::test]
    async fn test_missing_template_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/catalog/templates/id/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let template = client(&server)
            .get_template_content("gone")
            .await
            .expect("lookup succeeds");
        assert!(template.is_none());
    }

    #[tokio::test]
    async fn test_auth_failure_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/inventory/rules"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .list_installed(ResourceKind::Rule)
            .await
            .expect_err("auth failure");
        assert!(matches!(err, GatewayError::AuthenticationFailed { .. }));
    }

    #[tokio::test]
    async fn test_server_error_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/catalog/solutions/installed"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let err = client(&server)
            .list_installed_solutions()
            .await
            .expect_err("server keeps failing");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_invalid_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/inventory/connectors"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .list_installed(ResourceKind::Connector)
            .await
            .expect_err("invalid body");
        assert!(matches!(err, GatewayError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_deploy_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/deployments/rules/rule-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "message": "Rule updated",
                "note": "Rule re-enabled"
            })))
            .mount(&server)
            .await;

        let template: Template = serde_json::from_value(template_json()).expect("template");
        let target = InstalledRef {
            id: String::from("rule-1"),
            name: String::from("Brute force attempt"),
            version: None,
        };

        let outcome = client(&server)
            .deploy(ResourceKind::Rule, &target, &template)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.note.as_deref(), Some("Rule re-enabled"));
    }

    #[tokio::test]
    async fn test_deploy_rejection_is_failed_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/deployments/connectors/conn-1"))
            .respond_with(ResponseTemplate::new(409).set_body_string("locked"))
            .mount(&server)
            .await;

        let template = Template::new(ResourceKind::Connector, "tmpl-c", "Syslog");
        let target = InstalledRef {
            id: String::from("conn-1"),
            name: String::from("Syslog"),
            version: None,
        };

        let outcome = client(&server)
            .deploy(ResourceKind::Connector, &target, &template)
            .await;

        assert!(!outcome.success);
        assert!(outcome.message.contains("409"));
    }

    #[tokio::test]
    async fn test_template_id_is_one_escaped_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/catalog/templates/id/contentTemplates%2Frule%23v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(template_json()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/catalog/templates/id/a%3Fb"))
            .respond_with(ResponseTemplate::new(200).set_body_json(template_json()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let slashed = client
            .get_template_content("contentTemplates/rule#v2")
            .await
            .expect("lookup succeeds");
        let queried = client.get_template_content("a?b").await.expect("lookup succeeds");

        assert!(slashed.is_some());
        assert!(queried.is_some());
    }

    #[tokio::test]
    async fn test_deploy_target_id_is_escaped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/deployments/rules/%2Fsubscriptions%2Fs1%2FalertRules%2Fr1",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "message": "Rule updated"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let template: Template = serde_json::from_value(template_json()).expect("template");
        let target = InstalledRef {
            id: String::from("/subscriptions/s1/alertRules/r1"),
            name: String::from("Brute force attempt"),
            version: None,
        };

        let outcome = client(&server)
            .deploy(ResourceKind::Rule, &target, &template)
            .await;
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn test_base_url_path_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/inventory/rules"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = HubClient::new(&format!("{}/api/v1/", server.uri()), "test-token")
            .expect("client builds");
        let rules = client
            .list_installed(ResourceKind::Rule)
            .await
            .expect("inventory");
        assert!(rules.is_empty());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = HubClient::new("not a url", "token").expect_err("invalid url");
        assert!(matches!(err, GatewayError::InvalidUrl { .. }));

        let err = HubClient::new("mailto:soc@example.com", "token").expect_err("no path");
        assert!(matches!(err, GatewayError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_validate_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/catalog/solutions/installed"))
            .and(header("authorization", "Bearer good-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/catalog/solutions/installed"))
            .and(header("authorization", "Bearer stale-token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let good = HubClient::new(&server.uri(), "good-token").expect("client builds");
        let stale = HubClient::new(&server.uri(), "stale-token").expect("client builds");

        assert!(good.validate_token().await.expect("reachable"));
        assert!(!stale.validate_token().await.expect("reachable"));
    }

    #[test]
    fn test_retry_delay_honours_rate_limit_hint() {
        let client = HubClient::new("http://localhost", "token")
            .expect("client builds")
            .with_retry_delay(Duration::from_millis(100));

        let limited = GatewayError::RateLimited { retry_after_secs: 7 };
        assert_eq!(client.retry_delay_after(&limited, 1), Duration::from_secs(7));

        let flooded = GatewayError::RateLimited { retry_after_secs: 600 };
        assert_eq!(
            client.retry_delay_after(&flooded, 1),
            Duration::from_secs(MAX_RATE_LIMIT_WAIT_SECS)
        );

        let reset = GatewayError::network("connection reset");
        assert_eq!(client.retry_delay_after(&reset, 2), Duration::from_millis(200));
    }
}
