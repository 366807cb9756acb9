//! Client configuration.
//!
//! Settings are layered: `workflows.toml` → environment → CLI flags. The
//! file is looked up at `--config`, then `./workflows.toml`, then
//! `<config dir>/workflows/workflows.toml`. A missing file means defaults.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8080"
//!
//! [realtime]
//! url = "ws://localhost:8080/ws"
//! max_reconnect_attempts = 5
//! reconnect_interval_ms = 5000
//!
//! [router]
//! prefix = "/dashboard"
//! ```
//!
//! | Variable             | Overrides            |
//! |----------------------|----------------------|
//! | `WORKFLOWS_API_BASE` | `api.base_url`       |
//! | `WORKFLOWS_WS_URL`   | `realtime.url`       |
//! | `WORKFLOWS_TOKEN`    | bearer token (no file setting) |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::DEFAULT_API_BASE;
use crate::realtime::{DEFAULT_ENDPOINT, ReconnectPolicy};
use crate::router::DEFAULT_PREFIX;

pub const CONFIG_FILE_NAME: &str = "workflows.toml";

pub const ENV_API_BASE: &str = "WORKFLOWS_API_BASE";
pub const ENV_WS_URL: &str = "WORKFLOWS_WS_URL";
pub const ENV_TOKEN: &str = "WORKFLOWS_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeSection {
    #[serde(default = "default_ws_url")]
    pub url: String,
    /// Reconnects after the first attempt before giving up
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
}

fn default_ws_url() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_max_reconnect_attempts() -> u32 {
    ReconnectPolicy::default().max_attempts
}

fn default_reconnect_interval_ms() -> u64 {
    ReconnectPolicy::default().interval.as_millis() as u64
}

impl Default for RealtimeSection {
    fn default() -> Self {
        Self {
            url: default_ws_url(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterSection {
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl Default for RouterSection {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

/// Contents of `workflows.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowsToml {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub realtime: RealtimeSection,
    #[serde(default)]
    pub router: RouterSection,
}

impl WorkflowsToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("In {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse workflows.toml")
    }

    /// Load `path` if it exists, otherwise defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize workflows.toml")
    }

    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if reqwest::Url::parse(&self.api.base_url).is_err() {
            warnings.push(format!("Invalid api.base_url '{}'", self.api.base_url));
        }
        match reqwest::Url::parse(&self.realtime.url) {
            Ok(url) if matches!(url.scheme(), "ws" | "wss") => {}
            _ => warnings.push(format!(
                "Invalid realtime.url '{}': expected a ws:// or wss:// URL",
                self.realtime.url
            )),
        }
        if self.realtime.reconnect_interval_ms == 0 {
            warnings.push("realtime.reconnect_interval_ms is 0; reconnects will not pause".into());
        }
        let prefix = &self.router.prefix;
        if !prefix.starts_with('/') || (prefix.len() > 1 && prefix.ends_with('/')) {
            warnings.push(format!(
                "Invalid router.prefix '{}': must start with '/' and not end with '/'",
                self.router.prefix
            ));
        }

        warnings
    }
}

/// First existing candidate: explicit path, `./workflows.toml`, then the
/// per-user config dir. An explicit path is returned even when missing so
/// loading reports it.
pub fn discover(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("workflows").join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
}

/// Effective settings after layering file, environment and CLI flags.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub toml: WorkflowsToml,
    /// File the settings came from, if any
    pub source: Option<PathBuf>,
    pub api_base: String,
    pub ws_url: String,
    pub token: Option<String>,
}

impl ClientConfig {
    /// Discover, load and layer the process environment on top.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let source = discover(explicit);
        let toml = match &source {
            Some(path) if explicit.is_some() => WorkflowsToml::load(path)?,
            Some(path) => WorkflowsToml::load_or_default(path)?,
            None => WorkflowsToml::default(),
        };
        Ok(Self::resolve(toml, source, |key| std::env::var(key).ok()))
    }

    /// Layer environment values from `lookup` over `toml`. Empty values
    /// count as unset.
    pub fn resolve(
        toml: WorkflowsToml,
        source: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            api_base: env(ENV_API_BASE).unwrap_or_else(|| toml.api.base_url.clone()),
            ws_url: env(ENV_WS_URL).unwrap_or_else(|| toml.realtime.url.clone()),
            token: env(ENV_TOKEN),
            toml,
            source,
        }
    }

    /// Apply CLI flags; `None` keeps the current value.
    pub fn with_cli_args(mut self, api_base: Option<String>, ws_url: Option<String>, token: Option<String>) -> Self {
        if let Some(api_base) = api_base {
            self.api_base = api_base;
        }
        if let Some(ws_url) = ws_url {
            self.ws_url = ws_url;
        }
        if token.is_some() {
            self.token = token;
        }
        self
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.toml.realtime.max_reconnect_attempts,
            interval: Duration::from_millis(self.toml.realtime.reconnect_interval_ms),
        }
    }

    pub fn router_prefix(&self) -> &str {
        &self.toml.router.prefix
    }

    /// The bearer token, or an error naming how to provide one.
    pub fn require_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .with_context(|| format!("No API token configured. Set {ENV_TOKEN} or pass --token"))
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let toml = WorkflowsToml::parse("").unwrap();
        assert_eq!(toml, WorkflowsToml::default());
        assert_eq!(toml.api.base_url, "http://localhost:8080");
        assert_eq!(toml.realtime.url, "ws://localhost:8080/ws");
        assert_eq!(toml.realtime.max_reconnect_attempts, 5);
        assert_eq!(toml.realtime.reconnect_interval_ms, 5000);
        assert_eq!(toml.router.prefix, "/dashboard");
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let toml = WorkflowsToml::parse(
            r#"
            [realtime]
            max_reconnect_attempts = 2
            "#,
        )
        .unwrap();
        assert_eq!(toml.realtime.max_reconnect_attempts, 2);
        assert_eq!(toml.realtime.reconnect_interval_ms, 5000);
        assert_eq!(toml.api, ApiSection::default());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = WorkflowsToml::parse("[api\nbase_url = 1").unwrap_err();
        assert!(err.to_string().contains("Failed to parse workflows.toml"));
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let dir = TempDir::new().unwrap();
        let toml = WorkflowsToml::load_or_default(&dir.path().join("workflows.toml")).unwrap();
        assert_eq!(toml, WorkflowsToml::default());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = ClientConfig::load(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workflows.toml");
        std::fs::write(&path, "[router]\nprefix = \"/app\"\n").unwrap();
        let config = ClientConfig::load(Some(&path)).unwrap();
        assert_eq!(config.router_prefix(), "/app");
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_round_trips_through_toml_string() {
        let mut toml = WorkflowsToml::default();
        toml.realtime.reconnect_interval_ms = 250;
        let text = toml.to_toml_string().unwrap();
        assert!(text.contains("[realtime]"));
        assert_eq!(WorkflowsToml::parse(&text).unwrap(), toml);
    }

    #[test]
    fn test_environment_overrides_file() {
        let env: HashMap<&str, &str> = [
            (ENV_API_BASE, "https://api.example.test"),
            (ENV_TOKEN, "secret"),
            (ENV_WS_URL, "  "),
        ]
        .into_iter()
        .collect();
        let config = ClientConfig::resolve(WorkflowsToml::default(), None, |k| {
            env.get(k).map(|v| v.to_string())
        });
        assert_eq!(config.api_base, "https://api.example.test");
        assert_eq!(config.ws_url, "ws://localhost:8080/ws");
        assert_eq!(config.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_cli_overrides_environment() {
        let config = ClientConfig::resolve(WorkflowsToml::default(), None, |_| Some("env".into()))
            .with_cli_args(Some("http://cli".into()), None, Some("cli-token".into()));
        assert_eq!(config.api_base, "http://cli");
        assert_eq!(config.ws_url, "env");
        assert_eq!(config.token.as_deref(), Some("cli-token"));
    }

    #[test]
    fn test_require_token() {
        let config = ClientConfig::resolve(WorkflowsToml::default(), None, no_env);
        let err = config.require_token().unwrap_err();
        assert!(err.to_string().contains(ENV_TOKEN));
    }

    #[test]
    fn test_reconnect_policy_from_file() {
        let toml = WorkflowsToml::parse("[realtime]\nmax_reconnect_attempts = 1\nreconnect_interval_ms = 20\n").unwrap();
        let policy = ClientConfig::resolve(toml, None, no_env).reconnect_policy();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.interval, Duration::from_millis(20));
    }

    #[test]
    fn test_validate_flags_bad_values() {
        let toml = WorkflowsToml::parse(
            r#"
            [api]
            base_url = "not a url"
            [realtime]
            url = "http://localhost:8080/ws"
            reconnect_interval_ms = 0
            [router]
            prefix = "dashboard/"
            "#,
        )
        .unwrap();
        let warnings = toml.validate();
        assert_eq!(warnings.len(), 4, "{warnings:?}");
        assert!(WorkflowsToml::default().validate().is_empty());
    }
}
