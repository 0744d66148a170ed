//! Error types shared by the remote row-store client.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`TransportError`] failures.
pub type TransportResult<T> = Result<T, TransportError>;

/// Failures that can occur while talking to the remote row store.
///
/// None of these are fatal to the scoreboard: callers fall back to local state.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No usable endpoint was configured.
    #[error("remote store URL is not configured")]
    NotConfigured,
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build remote store client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent or the connection dropped.
    #[error("failed to send `{action}` request to the remote store")]
    RequestSend {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The remote store answered with a non-2xx status.
    #[error("unexpected remote store response status {status} for `{action}`")]
    RequestStatus {
        action: &'static str,
        status: StatusCode,
    },
    /// Reading the response body failed.
    #[error("failed to read remote store response for `{action}`")]
    ReadBody {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The response body is not the JSON we expected.
    #[error("failed to decode remote store response for `{action}`")]
    DecodeResponse {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// The remote store understood the request and refused it (`{error: ...}`).
    #[error("remote store rejected `{action}`: {message}")]
    Rejected {
        action: &'static str,
        message: String,
    },
    /// The response decoded but lacks the field this action needs.
    #[error("remote store response for `{action}` is missing `{expected}`")]
    UnexpectedPayload {
        action: &'static str,
        expected: &'static str,
    },
    /// A bridged response is not of the `<token>(<json>)` form.
    #[error("malformed bridged response for `{action}`: {reason}")]
    MalformedCallback {
        action: &'static str,
        reason: &'static str,
    },
    /// A bridged response names a callback nobody is waiting on.
    #[error("bridged response for `{action}` targets unknown callback `{token}`")]
    UnknownCallback { action: &'static str, token: String },
    /// No answer arrived within the allotted time.
    #[error("`{action}` timed out after {after:?}")]
    Timeout {
        action: &'static str,
        after: Duration,
    },
    /// The callback registration vanished before a payload was delivered.
    #[error("callback for `{action}` was dropped before the response arrived")]
    CallbackDropped { action: &'static str },
}
