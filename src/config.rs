use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "duki.toml";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            endpoint: EndpointConfig::default(),
            speech: SpeechConfig::default(),
        }
    }
}

fn default_name() -> String {
    "Duki Bot".into()
}

// ============================================================================
// Endpoint Config
// ============================================================================

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EndpointConfig {
    /// Server root, e.g. "http://127.0.0.1:5000" (supports ${ENV_VAR} syntax)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Command route appended to base_url
    #[serde(default = "default_command_path")]
    pub command_path: String,
    /// Health route appended to base_url
    #[serde(default = "default_health_path")]
    pub health_path: String,
    /// Client-side deadline per dispatch; 0 disables it
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            command_path: default_command_path(),
            health_path: default_health_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".into()
}

fn default_command_path() -> String {
    "/api/comando".into()
}

fn default_health_path() -> String {
    "/health".into()
}

fn default_timeout_secs() -> u64 {
    40
}

impl EndpointConfig {
    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn command_url(&self) -> String {
        join_url(&self.base_url, &self.command_path)
    }

    pub fn health_url(&self) -> String {
        join_url(&self.base_url, &self.health_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

// ============================================================================
// Speech Config
// ============================================================================

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SpeechConfig {
    /// Locale handed to both engines
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Text-to-speech program; silent when absent
    #[serde(default)]
    pub synthesizer: Option<ProgramConfig>,
    /// Speech-to-text program; dictation reports unavailable when absent
    #[serde(default)]
    pub recognizer: Option<ProgramConfig>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            synthesizer: None,
            recognizer: None,
        }
    }
}

fn default_locale() -> String {
    "es-ES".into()
}

/// External program invocation. `{locale}` in args is substituted.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProgramConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ProgramConfig {
    pub fn args_for(&self, locale: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace("{locale}", locale))
            .collect()
    }
}

/// Expand ${VAR} using the given lookup; unknown variables expand to ""
pub fn expand_env_vars_with<F>(s: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = s.to_string();

    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = lookup(var_name).unwrap_or_else(|| {
                tracing::warn!("environment variable '{}' not found", var_name);
                String::new()
            });
            result.replace_range(start..start + end + 1, &value);
        } else {
            break;
        }
    }

    result
}

/// Expand ${VAR} from the process environment
pub fn expand_env_vars(s: &str) -> String {
    expand_env_vars_with(s, |name| std::env::var(name).ok())
}

impl Config {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            Self::from_toml(&text, &path.display().to_string())?
        } else {
            tracing::debug!("{} not found, using defaults", path.display());
            Config::default()
        };

        config.resolve()?;
        Ok(config)
    }

    fn from_toml(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Command-line flags win over file values
    pub fn apply_overrides(
        &mut self,
        base_url: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = base_url {
            self.endpoint.base_url = url;
        }
        if let Some(secs) = timeout_secs {
            self.endpoint.timeout_secs = secs;
        }
        self.resolve()
    }

    /// Expand env vars in the endpoint and check it parses as a URL
    fn resolve(&mut self) -> Result<(), ConfigError> {
        let expanded = expand_env_vars(&self.endpoint.base_url);
        let trimmed = expanded.trim().trim_end_matches('/').to_string();
        if reqwest::Url::parse(&trimmed).is_err() {
            return Err(ConfigError::InvalidUrl(trimmed));
        }
        self.endpoint.base_url = trimmed;
        Ok(())
    }
}
