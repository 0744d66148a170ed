use serde::Serialize;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status ("ok" or "offline").
    pub status: String,
    /// Whether a remote store endpoint is configured at all.
    pub remote_configured: bool,
    /// Whether the remote store is currently believed reachable.
    pub online: bool,
}

impl HealthResponse {
    /// Build the response from the remote configuration and reachability.
    pub fn new(remote_configured: bool, online: bool) -> Self {
        let status = if remote_configured && !online {
            "offline"
        } else {
            "ok"
        };
        Self {
            status: status.to_string(),
            remote_configured,
            online,
        }
    }
}
