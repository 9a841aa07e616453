//! Data access gateway.
//!
//! Every backend call passes through [`Gateway`], which injects the bearer
//! credential and the active unit header, and applies the global failure
//! policy: a 401 clears the persisted credential and emits
//! [`GatewayEvent::SessionInvalidated`] before the error is returned, a 403
//! emits [`GatewayEvent::PermissionDenied`] and is forwarded. Nothing is
//! retried.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::errors::{ConsoleError, Result};
use crate::scope::ScopeQuery;
use crate::storage::StateStore;

/// Header carrying the active unit id.
pub const UNIT_HEADER: &str = "x-unit-id";
/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const EVENT_CAPACITY: usize = 64;

/// Signals raised by the gateway for a top-level coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// The backend rejected the credential; persisted state is already cleared.
    SessionInvalidated,
    /// The active unit may not perform the request.
    PermissionDenied {
        method: String,
        path: String,
        message: String,
    },
}

/// HTTP client wrapper shared by every consumer.
pub struct Gateway {
    client: Client,
    base_url: Option<String>,
    state: Arc<StateStore>,
    events: broadcast::Sender<GatewayEvent>,
}

impl Gateway {
    pub fn new(config: &Config, state: Arc<StateStore>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            state,
            events,
        })
    }

    /// Whether no backend is configured.
    pub fn is_demo(&self) -> bool {
        self.base_url.is_none()
    }

    pub fn state(&self) -> &Arc<StateStore> {
        &self.state
    }

    /// Subscribe to session and permission signals.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.events.subscribe()
    }

    /// GET `path` and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .dispatch(Method::GET, path, query, None::<&()>)
            .await?;
        decode(response).await
    }

    /// Send a mutating request whose scope has already been checked, and
    /// decode the JSON body.
    pub async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        scope: &ScopeQuery,
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.dispatch(method, path, scope.params(), body).await?;
        decode(response).await
    }

    /// Send a mutating request and ignore the response body.
    pub async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        scope: &ScopeQuery,
        body: Option<&B>,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.dispatch(method, path, scope.params(), body).await?;
        Ok(())
    }

    /// Exchange credentials for a session.
    ///
    /// A 401 here means the credentials were rejected, not that a session
    /// expired, so the global invalidation policy does not apply.
    pub async fn exchange_credentials<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let response = self
            .build(Method::POST, &url, &[])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return decode(response).await;
        }

        let text = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => {
                let message = crate::errors::decode_message(&text)
                    .unwrap_or_else(|| "Invalid email or password".to_string());
                tracing::info!("Credentials rejected by backend");
                Err(ConsoleError::Authentication(message))
            }
            _ => Err(ConsoleError::from_status(status, &text)),
        }
    }

    async fn dispatch<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        let mut request = self.build(method.clone(), &url, query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let error = ConsoleError::from_status(status, &text);

        match &error {
            ConsoleError::AuthorizationExpired => {
                tracing::warn!(%method, path, "Session rejected by backend, clearing credentials");
                if let Err(e) = self.state.clear().await {
                    tracing::error!("Failed to clear persisted session: {}", e);
                }
                // No receivers simply means nobody is listening yet.
                let _ = self.events.send(GatewayEvent::SessionInvalidated);
            }
            ConsoleError::PermissionDenied(message) => {
                tracing::warn!(%method, path, "Permission denied: {}", message);
                let _ = self.events.send(GatewayEvent::PermissionDenied {
                    method: method.to_string(),
                    path: path.to_string(),
                    message: message.clone(),
                });
            }
            _ => {
                tracing::debug!(%method, path, status = status.as_u16(), "Request failed");
            }
        }

        Err(error)
    }

    /// Attach credential, unit and correlation headers. The persisted state
    /// is read here, at construction time, for every request.
    fn build(&self, method: Method, url: &str, query: &[(&str, String)]) -> reqwest::RequestBuilder {
        let persisted = self.state.snapshot();
        let request_id = uuid::Uuid::new_v4().to_string();

        tracing::debug!(
            %method,
            url,
            request_id = %request_id,
            unit = ?persisted.active_unit_id,
            "Outbound request"
        );

        let mut request = self
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, request_id);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = persisted.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(unit_id) = persisted.active_unit_id {
            request = request.header(UNIT_HEADER, unit_id.to_string());
        }
        request
    }

    fn url(&self, path: &str) -> Result<String> {
        match &self.base_url {
            Some(base) => Ok(format!("{}{}", base, path)),
            None => Err(ConsoleError::Offline(format!(
                "No backend configured for {}",
                path
            ))),
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_gateway_refuses_to_send() {
        let state = Arc::new(StateStore::in_memory().await.unwrap());
        let gateway = Gateway::new(&Config::demo(), state).unwrap();

        assert!(gateway.is_demo());
        let err = gateway
            .get::<serde_json::Value>("/promotions/partners", &[])
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), crate::errors::codes::OFFLINE);
    }
}
