//! Typed client for the EDRP status API.
//!
//! Translates domain calls into HTTP requests against one fixed base URL and
//! returns normalized results. Ordinary failure (network fault, non-200
//! status, malformed payload) degrades to an [`ApiError`] plus a logged
//! diagnostic; it never propagates as a hard fault.
//!
//! The read endpoints wrap their real payload in a `{"message": ...}`
//! envelope whose value is itself a JSON-encoded string. That double
//! encoding is a quirk of the remote service, but the live deployment
//! depends on it, so this client decodes the wrapper and then the inner
//! string exactly as the service emits them.

pub mod transport;

use serde::Deserialize;
use serde_json::Value;

pub use transport::{ApiError, HttpResponse, ReqwestTransport, Transport, REQUEST_TIMEOUT};

/// The `{"message": ...}` wrapper shape returned by the read endpoints.
#[derive(Debug, Deserialize)]
struct Envelope {
    message: String,
}

/// Body of a successful GET.
///
/// The remote mislabels JSON bodies as `text/html`, so a 200 body is parsed
/// as JSON unconditionally. When even that fails the raw body is handed back
/// as opaque text; callers must check the shape of what they receive.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Body parsed as JSON.
    Json(Value),
    /// Body that was not valid JSON, returned verbatim.
    Text(String),
}

/// Client for the EDRP status API.
///
/// Generic over [`Transport`] so tests can substitute a mock; production
/// code uses the [`ReqwestTransport`] default. One client is shared per
/// supervisor run between the presence updater and any write-path callers.
pub struct ApiClient<T: Transport = ReqwestTransport> {
    base_url: String,
    transport: T,
}

impl ApiClient<ReqwestTransport> {
    /// Creates a client against `base_url` with the standard 10-second
    /// request timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self::with_transport(base_url, ReqwestTransport::new()?))
    }
}

impl<T: Transport> ApiClient<T> {
    /// Creates a client with an explicit transport.
    pub fn with_transport(base_url: impl Into<String>, transport: T) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            transport,
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, normalize_path(path))
    }

    /// Issues an HTTP POST for the given API path.
    ///
    /// Spaces in the path are replaced with `+` before transmission.
    ///
    /// # Returns
    /// - `Ok(String)` - Response body of a 200 answer
    /// - `Err(ApiError)` - Transport failure or non-200 status, logged
    pub async fn post(&self, path: &str) -> Result<String, ApiError> {
        let url = self.url_for(path);
        let response = self.transport.post(&url).await.inspect_err(|e| {
            tracing::error!("API|POST request failed: {e}");
        })?;
        if response.status != 200 {
            tracing::error!(
                "API|POST response status: {}, response text: {}",
                response.status,
                response.body
            );
            return Err(ApiError::Status {
                code: response.status,
            });
        }
        Ok(response.body)
    }

    /// Issues an HTTP GET for the given API path.
    ///
    /// Spaces in the path are replaced with `+` before transmission. A 200
    /// body is parsed as JSON regardless of the declared content type; a
    /// body that fails to parse is logged and returned as [`Payload::Text`].
    ///
    /// # Returns
    /// - `Ok(Payload)` - Parsed JSON or opaque text of a 200 answer
    /// - `Err(ApiError)` - Transport failure or non-200 status, logged
    pub async fn get(&self, path: &str) -> Result<Payload, ApiError> {
        let url = self.url_for(path);
        let response = self.transport.get(&url).await.inspect_err(|e| {
            tracing::error!("API|GET request failed: {e}");
        })?;
        if response.status != 200 {
            tracing::error!(
                "API|GET response status: {}, response text: {}",
                response.status,
                response.body
            );
            return Err(ApiError::Status {
                code: response.status,
            });
        }
        match serde_json::from_str::<Value>(&response.body) {
            Ok(value) => Ok(Payload::Json(value)),
            Err(_) => {
                tracing::error!(
                    "API|unable to convert the response to JSON, raw response: {}",
                    response.body
                );
                Ok(Payload::Text(response.body))
            }
        }
    }

    /// Gets the names of users with an event from the plugin within the last
    /// 10 minutes.
    ///
    /// Decodes the envelope's inner JSON string and extracts each record's
    /// `cmdrName`. Records without one are logged and skipped; the relative
    /// order of the surviving records is preserved.
    ///
    /// # Returns
    /// - `Ok(Vec<String>)` - Possibly empty list of CMDR names
    /// - `Err(ApiError)` - Request failure or a payload without the required shape
    pub async fn get_active(&self) -> Result<Vec<String>, ApiError> {
        let envelope = self.get_envelope("/active").await?;
        let roster: Value = serde_json::from_str(&envelope.message).map_err(|e| {
            tracing::error!(
                "API|unable to load the JSON roster message: {}",
                envelope.message
            );
            ApiError::Decode(format!("roster message is not valid JSON: {e}"))
        })?;
        let Some(records) = roster.as_array() else {
            return Err(ApiError::Decode("roster message is not an array".to_string()));
        };

        let mut names = Vec::with_capacity(records.len());
        for record in records {
            match record.get("cmdrName").and_then(Value::as_str) {
                Some(name) => names.push(name.to_string()),
                None => {
                    tracing::warn!("API|unable to retrieve CMDR name from record: {record}");
                }
            }
        }
        Ok(names)
    }

    /// Gets a count of the users with an event from the plugin within the
    /// last 10 minutes.
    ///
    /// # Returns
    /// - `Ok(u32)` - The count parsed from the envelope message
    /// - `Err(ApiError)` - Request failure or a non-numeric message; never a
    ///   default count
    pub async fn get_active_count(&self) -> Result<u32, ApiError> {
        let envelope = self.get_envelope("/active-count").await?;
        envelope.message.trim().parse().map_err(|_| {
            tracing::error!(
                "API|unable to convert the active-count message to an integer, raw message: {}",
                envelope.message
            );
            ApiError::Decode(format!("non-numeric active count: {:?}", envelope.message))
        })
    }

    /// Sets an event marker for a CMDR logging onto the plugin.
    pub async fn post_logon(&self, cmdr: &str) -> Result<(), ApiError> {
        self.post(&format!("/logon/{cmdr}")).await.map(drop)
    }

    /// Sets an event marker for a CMDR logging off the plugin.
    pub async fn post_logoff(&self, cmdr: &str) -> Result<(), ApiError> {
        self.post(&format!("/logoff/{cmdr}")).await.map(drop)
    }

    /// Sets an event marker for a CMDR entering a station.
    pub async fn post_station(&self, cmdr: &str, station: &str) -> Result<(), ApiError> {
        self.post(&format!("/station/{station}/{cmdr}")).await.map(drop)
    }

    /// Sets an event marker for a CMDR entering a star system.
    pub async fn post_system(&self, cmdr: &str, system: &str) -> Result<(), ApiError> {
        self.post(&format!("/system/{system}/{cmdr}")).await.map(drop)
    }

    async fn get_envelope(&self, path: &str) -> Result<Envelope, ApiError> {
        match self.get(path).await? {
            Payload::Json(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::Decode(format!("missing or malformed message envelope: {e}"))),
            Payload::Text(body) => Err(ApiError::Decode(format!(
                "expected a JSON envelope, got: {body}"
            ))),
        }
    }
}

/// Replaces every literal space in an API path with `+`.
///
/// Applied uniformly by the client before concatenation with the base URL;
/// callers are not trusted to pre-encode their path segments.
fn normalize_path(path: &str) -> String {
    path.replace(' ', "+")
}
