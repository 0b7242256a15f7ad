//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from TOML and carries the
//! aggregation tuning knobs plus every configured backend instance. Every
//! section defaults sensibly so a completely empty file is valid.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::backend::{BackendFamily, BackendKind, InstanceKey};
use crate::error::Result;
use crate::ids::{InstanceId, UserId};
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub aggregation: AggregationConfig,
    pub instances: Vec<InstanceConfig>,
}

impl Config {
    /// Deserialize a `Config` from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Enabled instances belonging to `user`, in configuration order.
    pub fn instances_for_user(&self, user: UserId) -> impl Iterator<Item = &InstanceConfig> {
        self.instances
            .iter()
            .filter(move |i| i.enabled && i.user_id == user)
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.aggregation.max_concurrency == 0 {
            warnings.push("aggregation.max_concurrency is 0; backends will be queried one at a time".into());
        }

        let mut seen = HashSet::new();
        for (i, instance) in self.instances.iter().enumerate() {
            if instance.id.is_ephemeral() {
                warnings.push(format!(
                    "instances[{i}].id is 0; clients for this instance will never be cached"
                ));
            }
            if !seen.insert(instance.key()) {
                warnings.push(format!(
                    "instances[{i}] duplicates {}; only one client will be kept",
                    instance.key()
                ));
            }
            if instance.url.is_empty() {
                warnings.push(format!("instances[{i}].url is empty"));
            }
            if instance.enabled && !instance.has_credentials() {
                warnings.push(format!(
                    "instances[{i}] ({}) is enabled but has no credentials",
                    instance.name
                ));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Tuning for multi-backend queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// How many backends are queried at once for one request.
    pub max_concurrency: usize,
    /// Per-backend deadline for a single query; `0` disables it.
    pub query_timeout_secs: u64,
}

impl AggregationConfig {
    pub fn query_timeout(&self) -> Option<Duration> {
        (self.query_timeout_secs > 0).then(|| Duration::from_secs(self.query_timeout_secs))
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            query_timeout_secs: 30,
        }
    }
}

/// One configured connection to an external backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub id: InstanceId,
    pub kind: BackendKind,
    pub name: String,
    pub url: String,
    /// Owner of this connection.
    pub user_id: UserId,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl InstanceConfig {
    /// A minimal enabled config, mostly useful for tests and tooling.
    pub fn new(
        id: impl Into<InstanceId>,
        kind: BackendKind,
        name: impl Into<String>,
        user_id: UserId,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            url: String::new(),
            user_id,
            api_key: None,
            username: None,
            password: None,
            enabled: true,
        }
    }

    pub fn key(&self) -> InstanceKey {
        InstanceKey::new(self.kind, self.id)
    }

    /// Subsonic-style servers authenticate with a user/password pair; every
    /// other family uses an API key or token.
    pub fn has_credentials(&self) -> bool {
        match self.kind.family() {
            BackendFamily::MusicServer => self.username.is_some() && self.password.is_some(),
            BackendFamily::MediaServer | BackendFamily::Automation => self.api_key.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [aggregation]
        max_concurrency = 2
        query_timeout_secs = 5

        [[instances]]
        id = 1
        kind = "plex"
        name = "Living room"
        url = "http://plex.local:32400"
        user_id = "6f1c2b1e-7d3a-4c55-9a43-1b8f0d2e7a10"
        api_key = "token"

        [[instances]]
        id = 2
        kind = "subsonic"
        name = "Music"
        url = "http://navidrome.local"
        user_id = "6f1c2b1e-7d3a-4c55-9a43-1b8f0d2e7a10"
        username = "me"
        password = "secret"
        enabled = false
    "#;

    #[test]
    fn default_config_no_warnings() {
        let config = Config::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.aggregation.max_concurrency, 4);
        assert_eq!(config.aggregation.query_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn parse_empty_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert!(config.instances.is_empty());
        assert_eq!(config.aggregation.query_timeout_secs, 30);
    }

    #[test]
    fn parse_toml_config() {
        let config = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(config.aggregation.max_concurrency, 2);
        assert_eq!(config.instances.len(), 2);
        assert_eq!(config.instances[0].key(), InstanceKey::new(BackendKind::Plex, 1));
        assert!(config.instances[0].enabled);
        assert!(!config.instances[1].enabled);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn parse_error_is_config_error() {
        let err = Config::from_toml("instances = 3").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn instances_for_user_skips_disabled_and_foreign() {
        let mut config = Config::from_toml(SAMPLE).unwrap();
        let owner = config.instances[0].user_id;
        config
            .instances
            .push(InstanceConfig::new(3, BackendKind::Emby, "Other", UserId::new()));

        let ids: Vec<_> = config.instances_for_user(owner).map(|i| i.id).collect();
        assert_eq!(ids, vec![InstanceId::new(1)]);
    }

    #[test]
    fn zero_timeout_disables_deadline() {
        let agg = AggregationConfig {
            max_concurrency: 1,
            query_timeout_secs: 0,
        };
        assert_eq!(agg.query_timeout(), None);
    }

    #[test]
    fn duplicate_and_ephemeral_instances_warn() {
        let user = UserId::new();
        let mut a = InstanceConfig::new(0, BackendKind::Radarr, "a", user);
        a.url = "http://radarr".into();
        a.api_key = Some("k".into());
        let b = a.clone();
        let config = Config {
            instances: vec![a, b],
            ..Config::default()
        };

        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("never be cached")));
        assert!(warnings.iter().any(|w| w.contains("duplicates radarr:0")));
    }

    #[test]
    fn enabled_without_credentials_warns() {
        let instance = InstanceConfig::new(4, BackendKind::Subsonic, "music", UserId::new());
        let config = Config {
            instances: vec![instance],
            ..Config::default()
        };
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("url is empty")));
        assert!(warnings.iter().any(|w| w.contains("no credentials")));
    }

    #[test]
    fn load_or_default_with_none() {
        let config = Config::load_or_default(None);
        assert!(config.instances.is_empty());
    }

    #[test]
    fn load_or_default_with_missing_file() {
        let config = Config::load_or_default(Some(Path::new("/nonexistent/mediagate.toml")));
        assert!(config.instances.is_empty());
    }

    #[test]
    fn load_or_default_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mediagate.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = Config::load_or_default(Some(&path));
        assert_eq!(config.instances.len(), 2);
    }
}
