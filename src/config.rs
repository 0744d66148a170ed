//! Application-level configuration loading: remote store, sync cadence, local slot and port.

use std::{env, fs, io::ErrorKind, path::PathBuf, sync::Arc, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::{
    local_store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore},
    remote_store::{RemoteConfig, TransportStrategy},
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "WING_CHALLENGE_CONFIG_PATH";
/// Environment variable that overrides the remote store URL.
const REMOTE_URL_ENV: &str = "WING_CHALLENGE_REMOTE_URL";
/// Environment variable that overrides the transport strategy.
const TRANSPORT_ENV: &str = "WING_CHALLENGE_TRANSPORT";
/// Environment variables consulted, in order, for the listening port.
const PORT_ENVS: [&str; 2] = ["PORT", "SERVER_PORT"];

const DEFAULT_STORAGE_PATH: &str = "data/wing-challenge.json";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SYNC_INTERVAL_MS: u64 = 3_000;
const DEFAULT_PROBE_INTERVAL_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Background synchronisation cadence.
pub struct SyncConfig {
    /// Whether the periodic poll runs at all.
    pub enabled: bool,
    /// Delay between two polls of the remote player list.
    pub interval: Duration,
    /// Delay between two reachability probes while online.
    pub probe_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_millis(DEFAULT_SYNC_INTERVAL_MS),
            probe_interval: Duration::from_millis(DEFAULT_PROBE_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    /// Local snapshot file; `None` keeps the snapshot in memory only.
    pub storage_path: Option<PathBuf>,
    pub port: u16,
}

impl AppConfig {
    /// Load the configuration from disk, then apply environment overrides.
    pub fn load() -> Self {
        Self::load_file().with_overrides(|key| env::var(key).ok())
    }

    fn load_file() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        remote = config.remote.is_configured(),
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON configuration document. Missing sections keep their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Apply overrides looked up through `var` (normally the process environment).
    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = var(REMOTE_URL_ENV) {
            self.remote.url = Some(url);
        }
        if let Some(raw) = var(TRANSPORT_ENV) {
            match raw.parse::<TransportStrategy>() {
                Ok(transport) => self.remote.transport = transport,
                Err(err) => warn!(value = %raw, error = %err, "ignoring transport override"),
            }
        }
        if let Some(raw) = PORT_ENVS.into_iter().find_map(|key| var(key)) {
            match raw.trim().parse::<u16>() {
                Ok(port) => self.port = port,
                Err(err) => warn!(value = %raw, error = %err, "ignoring port override"),
            }
        }
        self
    }

    /// Build the local snapshot slot described by this configuration.
    pub fn snapshot_store(&self) -> Arc<dyn SnapshotStore> {
        match &self.storage_path {
            Some(path) => Arc::new(FileSnapshotStore::new(path.clone())),
            None => Arc::new(MemorySnapshotStore::new()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

fn resolve_config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    remote: RawRemote,
    sync: RawSync,
    storage: RawStorage,
    server: RawServer,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = RemoteConfig::default();
        let remote = RemoteConfig {
            url: value.remote.url,
            transport: value.remote.transport,
            request_timeout: value
                .remote
                .request_timeout_ms
                .map_or(defaults.request_timeout, Duration::from_millis),
            bridge_timeout: value
                .remote
                .bridge_timeout_ms
                .map_or(defaults.bridge_timeout, Duration::from_millis),
        };
        let sync = SyncConfig {
            enabled: value.sync.enabled,
            interval: Duration::from_millis(value.sync.interval_ms.max(1)),
            probe_interval: Duration::from_millis(value.sync.probe_interval_ms.max(1)),
        };
        let storage_path = match value.storage.path {
            Some(explicit) => explicit.map(PathBuf::from),
            None => Some(PathBuf::from(DEFAULT_STORAGE_PATH)),
        };
        Self {
            remote,
            sync,
            storage_path,
            port: value.server.port,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRemote {
    url: Option<String>,
    transport: TransportStrategy,
    request_timeout_ms: Option<u64>,
    bridge_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawSync {
    enabled: bool,
    interval_ms: u64,
    probe_interval_ms: u64,
}

impl Default for RawSync {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: DEFAULT_SYNC_INTERVAL_MS,
            probe_interval_ms: DEFAULT_PROBE_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStorage {
    /// Absent keeps the default file, `null` selects the in-memory slot.
    #[serde(with = "::serde_with::rust::double_option")]
    path: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawServer {
    port: u16,
}

impl Default for RawServer {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert!(!config.remote.is_configured());
        assert_eq!(config.remote.transport, TransportStrategy::Direct);
        assert_eq!(config.remote.bridge_timeout, Duration::from_secs(10));
        assert_eq!(config.sync, SyncConfig::default());
        assert_eq!(config.storage_path, Some(PathBuf::from(DEFAULT_STORAGE_PATH)));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn full_document_is_honoured() {
        let config = AppConfig::from_json(
            r#"{
                "remote": {"url": "https://example.test/exec", "transport": "bridged", "bridge_timeout_ms": 2500},
                "sync": {"enabled": false, "interval_ms": 1000},
                "storage": {"path": null},
                "server": {"port": 9000}
            }"#,
        )
        .unwrap();
        assert_eq!(config.remote.endpoint(), Some("https://example.test/exec"));
        assert_eq!(config.remote.transport, TransportStrategy::Bridged);
        assert_eq!(config.remote.bridge_timeout, Duration::from_millis(2500));
        assert!(!config.sync.enabled);
        assert_eq!(config.sync.interval, Duration::from_secs(1));
        assert_eq!(config.sync.probe_interval, Duration::from_secs(5));
        assert_eq!(config.storage_path, None);
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (REMOTE_URL_ENV, "https://override.test/exec"),
            (TRANSPORT_ENV, "post"),
            ("SERVER_PORT", "7000"),
        ]);
        let config = AppConfig::default()
            .with_overrides(|key| vars.get(key).map(|value| value.to_string()));
        assert_eq!(config.remote.endpoint(), Some("https://override.test/exec"));
        assert_eq!(config.remote.transport, TransportStrategy::Post);
        assert_eq!(config.port, 7000);
    }

    #[test]
    fn bad_overrides_are_ignored() {
        let config = AppConfig::default().with_overrides(|key| match key {
            TRANSPORT_ENV => Some("carrier-pigeon".into()),
            "PORT" => Some("not-a-port".into()),
            _ => None,
        });
        assert_eq!(config.remote.transport, TransportStrategy::Direct);
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
