//! Service client configuration from resume-studio.toml and the environment

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "resume-studio.toml";

/// Environment variable overriding the service base URL
pub const ENV_API_URL: &str = "RESUME_STUDIO_API_URL";

/// Environment variable carrying the bearer token
pub const ENV_API_TOKEN: &str = "RESUME_STUDIO_API_TOKEN";

/// Environment variable overriding the request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "RESUME_STUDIO_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settings for the resume service client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,

    /// Optional bearer token attached to every request
    pub api_token: Option<String>,

    /// Deadline for a single request, in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a resume-studio.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(ClientConfig)` - Successfully loaded configuration, missing keys defaulted
    /// * `Err(ConfigError)` - Error reading or parsing the configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(ConfigError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a resume-studio.toml file
    ///
    /// # Parameters
    /// * `path` - Path where the configuration file will be written
    ///
    /// # Returns
    /// * `Ok(())` - Successfully saved configuration
    /// * `Err(ConfigError)` - Error serializing or writing the configuration file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?;

        fs::write(&path, content).map_err(ConfigError::IoError)?;

        Ok(())
    }

    /// Resolve the effective configuration
    ///
    /// Defaults, then the configuration file, then environment variables.
    /// An explicit path must exist; otherwise `resume-studio.toml` in the
    /// working directory is used when present.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(CONFIG_FILE_NAME)).filter(|p| p.is_file()),
        };

        let mut config = match path {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::load(&path)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup
    ///
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup(ENV_API_URL) {
            self.base_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN) {
            self.api_token = Some(token);
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = timeout
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(timeout.clone()))?;
        }

        self.validate()
    }

    /// Request deadline as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("0".to_string()));
        }
        Ok(())
    }
}

/// Errors that can occur when loading or saving client configuration
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    /// IO error when reading or writing file
    IoError(std::io::Error),

    /// Error parsing TOML
    ParseError(toml::de::Error),

    /// Error serializing to TOML
    SerializeError(toml::ser::Error),

    /// Timeout that is not a positive number of seconds
    InvalidTimeout(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "TOML parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "TOML serialize error: {}", e),
            ConfigError::InvalidTimeout(value) => {
                write!(f, "Invalid timeout '{}': expected a positive number of seconds", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000/api");
        assert_eq!(config.api_token, None);
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_example_toml() {
        let toml_content = r#"
base_url = "https://resume.example.com/api"
api_token = "secret-token"
timeout_secs = 90
"#;

        let config = ClientConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.base_url, "https://resume.example.com/api");
        assert_eq!(config.api_token.as_deref(), Some("secret-token"));
        assert_eq!(config.timeout_secs, 90);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = ClientConfig::from_toml_str("base_url = \"http://svc\"\n").unwrap();
        assert_eq!(config.base_url, "http://svc");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = ClientConfig::from_toml_str("timeout_secs = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidTimeout(_))));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "http://override/api"),
            (ENV_API_TOKEN, "tok"),
            (ENV_TIMEOUT_SECS, "15"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.base_url, "http://override/api");
        assert_eq!(config.api_token.as_deref(), Some("tok"));
        assert_eq!(config.timeout_secs, 15);
    }

    #[test]
    fn test_empty_overrides_ignored() {
        let mut config = ClientConfig::default();
        config
            .apply_overrides(|key| (key == ENV_API_URL).then(|| "  ".to_string()))
            .unwrap();
        assert_eq!(config.base_url, "http://localhost:8000/api");
    }

    #[test]
    fn test_invalid_timeout_override() {
        let mut config = ClientConfig::default();
        let result =
            config.apply_overrides(|key| (key == ENV_TIMEOUT_SECS).then(|| "soon".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidTimeout(v)) if v == "soon"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let config = ClientConfig {
            base_url: "https://resume.example.com/api".to_string(),
            api_token: Some("abc".to_string()),
            timeout_secs: 30,
        };
        config.save(&path).unwrap();

        let loaded = ClientConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_discover_explicit_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let result = ClientConfig::discover(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
