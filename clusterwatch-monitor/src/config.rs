//! Configuration management
//!
//! Handles:
//! - Remote execution settings (ssh user, options, timeout)
//! - Probe output parsing strategy
//! - Healthy tokens compared against cluster and probe output
//! - OS-specific config file location
//!
//! Refresh period, probed services and tracked deployments are fixed.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::ConfigError;

/// Time between two refresh cycle starts
pub const REFRESH_PERIOD: Duration = Duration::from_secs(5);

/// systemd units probed on every node, in display order
pub const AGENT_SERVICE: &str = "kubelet";
pub const RUNTIME_SERVICE: &str = "containerd";
pub const STORAGE_AGENT_SERVICE: &str = "scini";

/// Deployments summarised at the top of the dashboard: (namespace, name)
pub const TRACKED_DEPLOYMENTS: [(&str, &str); 2] = [
    ("kube-system", "coredns"),
    ("kubesphere-system", "ks-apiserver"),
];

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "CLUSTERWATCH_CONFIG";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    pub remote: RemoteConfig,
    pub probe: ProbeConfig,
    pub health: HealthConfig,
    pub kubectl: KubectlConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    pub user: String,
    pub ssh_options: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProbeConfig {
    pub parse_mode: ProbeParseMode,
}

/// How the remote health query reports its three states
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProbeParseMode {
    /// `kubelet:active` style lines, matched by label
    #[default]
    Labeled,
    /// Bare states on lines 0, 1 and 2
    Positional,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HealthConfig {
    pub node_ready: String,
    pub service_healthy: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct KubectlConfig {
    pub binary: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            user: "dspaas".to_string(),
            ssh_options: vec![
                "-o".to_string(),
                "StrictHostKeyChecking=no".to_string(),
                "-o".to_string(),
                "BatchMode=yes".to_string(),
            ],
            timeout_secs: 10,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            node_ready: "Ready".to_string(),
            service_healthy: "active".to_string(),
        }
    }
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self {
            binary: "kubectl".to_string(),
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl MonitorConfig {
    /// Load config from `$CLUSTERWATCH_CONFIG` or the OS-specific location
    pub async fn load() -> Result<Self, ConfigError> {
        match Self::config_file_path() {
            Some(path) => Self::load_from(&path).await,
            None => {
                debug!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load config from an explicit path; a missing file yields defaults
    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get config file path, honouring the environment override
    pub fn config_file_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        let mut path = dirs::config_dir()?;
        path.push("clusterwatch");
        path.push("config.toml");
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.remote.user, "dspaas");
        assert_eq!(config.probe.parse_mode, ProbeParseMode::Labeled);
        assert_eq!(config.health.node_ready, "Ready");
        assert_eq!(config.health.service_healthy, "active");
        assert_eq!(config.remote.timeout(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = MonitorConfig::load_from(&dir.path().join("absent.toml"))
            .await
            .unwrap();
        assert_eq!(config, MonitorConfig::default());
    }

    #[tokio::test]
    async fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[probe]\nparse_mode = \"positional\"\n\n[health]\nservice_healthy = \"running\""
        )
        .unwrap();

        let config = MonitorConfig::load_from(file.path()).await.unwrap();
        assert_eq!(config.probe.parse_mode, ProbeParseMode::Positional);
        assert_eq!(config.health.service_healthy, "running");
        assert_eq!(config.health.node_ready, "Ready");
        assert_eq!(config.remote, RemoteConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[probe]\nparse_mode = \"sideways\"").unwrap();

        let err = MonitorConfig::load_from(file.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_config_file_path() {
        if std::env::var_os(CONFIG_ENV).is_some() {
            return;
        }
        if let Some(path) = MonitorConfig::config_file_path() {
            assert!(path.to_string_lossy().contains("clusterwatch"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
