//! HTTP client-data service over the console's REST API.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::client_service::{ClientDataService, ClientLookup, is_empty_result};
use crate::config::ConsoleConfig;
use crate::error::ClientServiceError;

/// Fetches client records with `GET {base}/clients/me` or `GET {base}/clients/{id}`.
pub struct HttpClientService {
    base_url: Url,
    token: Option<SecretString>,
    client: reqwest::Client,
}

impl HttpClientService {
    pub fn new(base_url: &str, token: Option<SecretString>) -> Result<Self, ClientServiceError> {
        Self::with_client(base_url, token, reqwest::Client::new())
    }

    pub fn from_config(config: &ConsoleConfig) -> Result<Self, ClientServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ClientServiceError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Self::with_client(&config.api_base_url, config.api_token.clone(), client)
    }

    fn with_client(
        base_url: &str,
        token: Option<SecretString>,
        client: reqwest::Client,
    ) -> Result<Self, ClientServiceError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ClientServiceError::Transport(format!("Invalid base URL {base_url:?}: {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientServiceError::Transport(format!(
                "Base URL {base_url} cannot carry a path"
            )));
        }
        Ok(Self {
            base_url,
            token,
            client,
        })
    }

    fn client_url(&self, lookup: &ClientLookup) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("clients");
            match lookup {
                ClientLookup::Current => segments.push("me"),
                ClientLookup::ById(id) => segments.push(id),
            };
        }
        url
    }
}

#[async_trait]
impl ClientDataService for HttpClientService {
    async fn fetch_client(&self, lookup: &ClientLookup) -> Result<Option<Value>, ClientServiceError> {
        let url = self.client_url(lookup);
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let resp = request
            .send()
            .await
            .map_err(|e| ClientServiceError::Transport(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(%url, "Client service has no such client");
            return Ok(None);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ClientServiceError::AuthFailed {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(%url, status = status.as_u16(), "Client service request failed");
            return Err(ClientServiceError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp
            .text()
            .await
            .map_err(|e| ClientServiceError::Transport(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let body: Value =
            serde_json::from_str(&text).map_err(|e| ClientServiceError::InvalidBody(e.to_string()))?;
        unwrap_envelope(body)
    }
}

/// Accept a bare client object, `{"data": ...}`, or a list holding at most
/// one client. Null, `{}` and `[]` mean "no client".
fn unwrap_envelope(body: Value) -> Result<Option<Value>, ClientServiceError> {
    let client = match body {
        Value::Object(mut map) if !map.contains_key("id") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    let client = match client {
        Value::Array(mut items) => match items.len() {
            0 => return Ok(None),
            1 => items.remove(0),
            n => {
                return Err(ClientServiceError::InvalidBody(format!(
                    "expected a single client, got a list of {n}"
                )));
            }
        },
        other => other,
    };
    if is_empty_result(&client) {
        Ok(None)
    } else {
        Ok(Some(client))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn client_urls() {
        let service = HttpClientService::new("https://api.example.com/v1/", None).unwrap();
        assert_eq!(
            service.client_url(&ClientLookup::Current).as_str(),
            "https://api.example.com/v1/clients/me"
        );
        assert_eq!(
            service.client_url(&ClientLookup::ById("cl 1/x".into())).as_str(),
            "https://api.example.com/v1/clients/cl%201%2Fx"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(HttpClientService::new("not a url", None).is_err());
        assert!(HttpClientService::new("mailto:ops@example.com", None).is_err());
    }

    #[test]
    fn envelope_unwrapping() {
        let unwrap = |body: Value| unwrap_envelope(body).unwrap();
        assert_eq!(unwrap(json!({"id": "cl_1"})), Some(json!({"id": "cl_1"})));
        assert_eq!(unwrap(json!({"data": {"id": "cl_1"}})), Some(json!({"id": "cl_1"})));
        assert_eq!(unwrap(json!({"data": null})), None);
        assert_eq!(unwrap(json!({"data": {}})), None);
        assert_eq!(unwrap(json!(null)), None);
        assert_eq!(unwrap(json!({})), None);
        assert_eq!(unwrap(json!([])), None);
        assert_eq!(unwrap(json!({"data": []})), None);
        assert_eq!(unwrap(json!([{}])), None);
        assert_eq!(unwrap(json!([{"id": "cl_1"}])), Some(json!({"id": "cl_1"})));
        assert_eq!(
            unwrap(json!({"data": [{"id": "cl_1"}]})),
            Some(json!({"id": "cl_1"}))
        );
    }

    #[test]
    fn several_clients_are_rejected() {
        let err = unwrap_envelope(json!([{"id": "cl_1"}, {"id": "cl_2"}])).unwrap_err();
        assert!(matches!(err, ClientServiceError::InvalidBody(_)));
    }
}
