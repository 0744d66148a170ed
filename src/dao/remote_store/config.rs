use std::{str::FromStr, time::Duration};

use serde::Deserialize;

/// Value shipped in sample configs before anyone deploys a row store.
pub const PLACEHOLDER_URL: &str = "YOUR_GOOGLE_APPS_SCRIPT_WEB_APP_URL_HERE";
/// Default ceiling for a single direct request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Default ceiling for a bridged exchange, from injection to callback.
pub const DEFAULT_BRIDGE_TIMEOUT: Duration = Duration::from_secs(10);

/// How requests reach the row store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportStrategy {
    /// Query-string encoded GET, raw JSON response.
    #[default]
    Direct,
    /// POST with a JSON `{action, ...params}` body.
    Post,
    /// Query-string GET with a callback token; the response is `<token>(<json>)`.
    Bridged,
}

impl FromStr for TransportStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "post" => Ok(Self::Post),
            "bridged" | "jsonp" => Ok(Self::Bridged),
            other => Err(format!("unknown transport strategy `{other}`")),
        }
    }
}

/// Runtime configuration describing how to reach the row store.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub url: Option<String>,
    pub transport: TransportStrategy,
    pub request_timeout: Duration,
    pub bridge_timeout: Duration,
}

impl RemoteConfig {
    /// Construct a configuration pointing at `url` with default timeouts.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Select the transport strategy.
    pub fn with_transport(mut self, transport: TransportStrategy) -> Self {
        self.transport = transport;
        self
    }

    /// Override the bridged exchange timeout.
    pub fn with_bridge_timeout(mut self, timeout: Duration) -> Self {
        self.bridge_timeout = timeout;
        self
    }

    /// The endpoint to call, unless it is missing, blank or still the placeholder.
    pub fn endpoint(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty() && *url != PLACEHOLDER_URL)
    }

    /// Whether a usable endpoint is configured.
    pub fn is_configured(&self) -> bool {
        self.endpoint().is_some()
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            transport: TransportStrategy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            bridge_timeout: DEFAULT_BRIDGE_TIMEOUT,
        }
    }
}
