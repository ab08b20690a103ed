use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub supervisor: SupervisorSettings,
    pub archive: ArchiveConfig,
    pub workspace: WorkspaceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorSettings {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub remediation_timeout_ms: u64,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 10000,
            remediation_timeout_ms: 120000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub dir: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("cadence")
                .join("archive"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub root: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: None,
            supervisor: SupervisorSettings::default(),
            archive: ArchiveConfig::default(),
            workspace: WorkspaceConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Supervisor timing knobs as a runtime config
    pub fn supervisor_config(&self) -> crate::supervisor::SupervisorConfig {
        crate::supervisor::SupervisorConfig {
            max_retries: self.supervisor.max_retries,
            retry_delay: std::time::Duration::from_millis(self.supervisor.retry_delay_ms),
            remediation_timeout: std::time::Duration::from_millis(
                self.supervisor.remediation_timeout_ms,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.supervisor.max_retries, 3);
        assert_eq!(config.supervisor.retry_delay_ms, 10000);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log_level: debug").unwrap();
        writeln!(file, "supervisor:").unwrap();
        writeln!(file, "  max_retries: 5").unwrap();

        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.supervisor.max_retries, 5);
        assert_eq!(config.supervisor.retry_delay_ms, 10000);
    }

    #[test]
    fn test_explicit_missing_path_errors() {
        let path = PathBuf::from("/nonexistent/cadence.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_supervisor_config_conversion() {
        let config = Config::default();
        let sup = config.supervisor_config();
        assert_eq!(sup.retry_delay, std::time::Duration::from_secs(10));
        assert_eq!(sup.max_retries, 3);
    }
}
