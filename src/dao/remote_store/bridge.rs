//! Callback bookkeeping for the bridged transport.
//!
//! A bridged request carries a unique callback token; the row store answers with
//! `<token>(<json>)`. The registry routes that payload to whoever registered the token,
//! and the [`PendingCallback`] guard unregisters it on every exit path.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use uuid::Uuid;

use super::error::{TransportError, TransportResult};

/// Prefix of every generated callback token.
pub const CALLBACK_PREFIX: &str = "bridge_callback_";

/// Callbacks awaiting a bridged response, keyed by token.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    pending: DashMap<String, oneshot::Sender<Value>>,
}

impl CallbackRegistry {
    /// Create an empty registry, shared between concurrent bridged calls.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a fresh callback token.
    pub fn register(self: &Arc<Self>) -> (PendingCallback, oneshot::Receiver<Value>) {
        let token = format!("{CALLBACK_PREFIX}{}", Uuid::new_v4().simple());
        let (sender, receiver) = oneshot::channel();
        self.pending.insert(token.clone(), sender);
        let guard = PendingCallback {
            token,
            registry: Arc::clone(self),
        };
        (guard, receiver)
    }

    /// Invoke the callback named by a `<token>(<json>)` script body.
    pub fn dispatch(&self, action: &'static str, script: &str) -> TransportResult<()> {
        let (token, payload) = split_callback(script)
            .map_err(|reason| TransportError::MalformedCallback { action, reason })?;
        let value = serde_json::from_str::<Value>(payload)
            .map_err(|source| TransportError::DecodeResponse { action, source })?;

        let Some((_, sender)) = self.pending.remove(token) else {
            return Err(TransportError::UnknownCallback {
                action,
                token: token.to_string(),
            });
        };
        // The waiting side may already have given up; nothing to do then.
        let _ = sender.send(value);
        Ok(())
    }

    /// Number of callbacks still registered.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Registration guard; dropping it removes the callback from the registry.
#[derive(Debug)]
pub struct PendingCallback {
    token: String,
    registry: Arc<CallbackRegistry>,
}

impl PendingCallback {
    /// Token to send as the `callback` query parameter.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Drop for PendingCallback {
    fn drop(&mut self) {
        self.registry.pending.remove(&self.token);
    }
}

/// Split `<token>(<json>)` (optionally followed by `;`) into its two halves.
fn split_callback(script: &str) -> Result<(&str, &str), &'static str> {
    let script = script.trim();
    let script = script.strip_suffix(';').unwrap_or(script).trim_end();
    let open = script.find('(').ok_or("missing opening parenthesis")?;
    let (token, rest) = script.split_at(open);
    let token = token.trim();
    if token.is_empty()
        || !token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    {
        return Err("invalid callback name");
    }
    let payload = rest
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .ok_or("missing closing parenthesis")?;
    Ok((token, payload))
}
