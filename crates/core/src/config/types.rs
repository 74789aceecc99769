use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub import: ImportConfig,
    /// Telephony provider configuration. The voice worker only runs when
    /// this section is present.
    #[serde(default)]
    pub voice: Option<VoiceProviderConfig>,
    /// Portal provider configuration. The entry worker only runs when this
    /// section is present.
    #[serde(default)]
    pub entry: Option<EntryProviderConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("leadflow.db")
}

/// Workflow tuning: batch sizes, attempt limits, lease and poll timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowConfig {
    /// Run the background workers. Off by default so the API can be used
    /// standalone.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_voice_batch_size")]
    pub voice_batch_size: usize,
    #[serde(default = "default_entry_batch_size")]
    pub entry_batch_size: usize,
    #[serde(default = "default_max_attempts")]
    pub max_voice_attempts: u32,
    #[serde(default = "default_max_attempts")]
    pub max_entry_attempts: u32,
    /// Claim lease duration. Must exceed the provider timeouts so a live
    /// worker never loses its claim mid-action.
    #[serde(default = "default_claim_lease_secs")]
    pub claim_lease_secs: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Base delay before a failed action is retried; doubles per attempt.
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
    #[serde(default = "default_voice_batch_size")]
    pub max_concurrent_voice: usize,
    #[serde(default = "default_entry_batch_size")]
    pub max_concurrent_entry: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            voice_batch_size: default_voice_batch_size(),
            entry_batch_size: default_entry_batch_size(),
            max_voice_attempts: default_max_attempts(),
            max_entry_attempts: default_max_attempts(),
            claim_lease_secs: default_claim_lease_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            retry_backoff_secs: default_retry_backoff_secs(),
            max_concurrent_voice: default_voice_batch_size(),
            max_concurrent_entry: default_entry_batch_size(),
        }
    }
}

fn default_voice_batch_size() -> usize {
    5
}

fn default_entry_batch_size() -> usize {
    3
}

fn default_max_attempts() -> u32 {
    3
}

fn default_claim_lease_secs() -> u64 {
    600
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_retry_backoff_secs() -> u64 {
    60
}

/// CSV import configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportConfig {
    /// Directory swept for new CSV files.
    #[serde(default = "default_import_dir")]
    pub directory: PathBuf,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            directory: default_import_dir(),
        }
    }
}

fn default_import_dir() -> PathBuf {
    PathBuf::from("data/import")
}

/// Telephony provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VoiceProviderConfig {
    /// Base URL of the telephony HTTP API
    pub url: String,
    /// API key for the telephony service
    pub api_key: String,
    /// Per-call timeout in seconds (default: 300)
    #[serde(default = "default_action_timeout")]
    pub timeout_secs: u64,
}

/// Portal provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntryProviderConfig {
    /// Submission endpoint of the enrollment portal
    pub url: String,
    pub username: String,
    pub password: String,
    /// Per-submission timeout in seconds (default: 300)
    #[serde(default = "default_action_timeout")]
    pub timeout_secs: u64,
}

fn default_action_timeout() -> u64 {
    300
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub workflow: WorkflowConfig,
    pub import: ImportConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<SanitizedVoiceConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<SanitizedEntryConfig>,
}

/// Sanitized voice provider config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedVoiceConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
}

/// Sanitized entry provider config (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedEntryConfig {
    pub url: String,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            workflow: config.workflow.clone(),
            import: config.import.clone(),
            voice: config.voice.as_ref().map(|v| SanitizedVoiceConfig {
                url: v.url.clone(),
                api_key_configured: !v.api_key.is_empty(),
                timeout_secs: v.timeout_secs,
            }),
            entry: config.entry.as_ref().map(|e| SanitizedEntryConfig {
                url: e.url.clone(),
                username: e.username.clone(),
                password_configured: !e.password.is_empty(),
                timeout_secs: e.timeout_secs,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, PathBuf::from("leadflow.db"));
        assert_eq!(config.workflow.voice_batch_size, 5);
        assert_eq!(config.workflow.entry_batch_size, 3);
        assert_eq!(config.workflow.max_voice_attempts, 3);
        assert!(!config.workflow.enabled);
        assert!(config.voice.is_none());
        assert!(config.entry.is_none());
    }

    #[test]
    fn test_lease_outlasts_default_action_timeout() {
        let config = WorkflowConfig::default();
        assert!(config.claim_lease_secs > default_action_timeout());
    }

    #[test]
    fn test_sanitized_config_redacts_secrets() {
        let config = Config {
            voice: Some(VoiceProviderConfig {
                url: "http://voice.example.com".to_string(),
                api_key: "super-secret".to_string(),
                timeout_secs: 300,
            }),
            entry: Some(EntryProviderConfig {
                url: "http://portal.example.com/submit".to_string(),
                username: "worker".to_string(),
                password: "hunter2".to_string(),
                timeout_secs: 300,
            }),
            ..Config::default()
        };

        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(!json.contains("hunter2"));
        assert!(json.contains("api_key_configured"));
        assert!(json.contains("password_configured"));
    }
}
