//! Client-data service — where onboarding flags come from.

pub mod http;

pub use http::HttpClientService;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClientServiceError;

/// Which client to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientLookup {
    /// The client bound to the credentials in use ("my profile").
    Current,
    /// A specific client, as an administrator.
    ById(String),
}

impl ClientLookup {
    /// Parse a CLI/URL argument: `me` selects the current client.
    ///
    /// Blank input names no client and yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else if raw.eq_ignore_ascii_case("me") {
            Some(Self::Current)
        } else {
            Some(Self::ById(raw.to_string()))
        }
    }
}

impl std::fmt::Display for ClientLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Current => write!(f, "current client"),
            Self::ById(id) => write!(f, "client {id}"),
        }
    }
}

/// Whether a successful response carries no client: `null`, `{}` or `[]`.
pub fn is_empty_result(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Remote source of client records.
///
/// Returns the raw client object; `Ok(None)` means the service answered but
/// has no such client.
#[async_trait]
pub trait ClientDataService: Send + Sync {
    async fn fetch_client(&self, lookup: &ClientLookup) -> Result<Option<Value>, ClientServiceError>;
}
