//! `config.toml` loading.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use copilot_api::HttpOptions;
use copilot_stream::ThemeName;
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_DIR_NAME: &str = "gh-copilot";
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// File names read by earlier releases. They are no longer parsed.
pub const LEGACY_CONFIG_FILE_NAMES: [&str; 2] = ["config.yaml", "config.yml"];
pub const CONFIG_LOAD_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MODEL: &str = "claude-3.7-sonnet";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
    #[error("loading config timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("config loader failed: {0}")]
    Loader(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderFormat {
    #[default]
    Markdown,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub idle_conn_timeout_sec: u64,
    pub dial_timeout_sec: u64,
    pub keep_alive_sec: u64,
    pub request_timeout_sec: u64,
    pub max_idle_conns_per_host: usize,
    pub disable_keep_alives: bool,
    pub force_http2: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            idle_conn_timeout_sec: 90,
            dial_timeout_sec: 30,
            keep_alive_sec: 30,
            request_timeout_sec: 60,
            max_idle_conns_per_host: 100,
            disable_keep_alives: false,
            force_http2: true,
        }
    }
}

impl HttpConfig {
    pub fn to_options(&self) -> HttpOptions {
        HttpOptions {
            idle_conn_timeout: Duration::from_secs(self.idle_conn_timeout_sec),
            dial_timeout: Duration::from_secs(self.dial_timeout_sec),
            keep_alive: Duration::from_secs(self.keep_alive_sec),
            request_timeout: Duration::from_secs(self.request_timeout_sec),
            max_idle_conns_per_host: self.max_idle_conns_per_host,
            disable_keep_alives: self.disable_keep_alives,
            force_http2: self.force_http2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub format: RenderFormat,
    pub theme: String,
    pub wrap_lines: bool,
    /// `0` means the terminal width.
    pub wrap_width: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            format: RenderFormat::Markdown,
            theme: ThemeName::Auto.as_str().to_string(),
            wrap_lines: true,
            wrap_width: 120,
        }
    }
}

impl RenderConfig {
    pub fn theme_name(&self) -> Result<ThemeName, ConfigError> {
        self.theme.parse().map_err(|_| ConfigError::Invalid {
            field: "render.theme",
            message: format!(
                "unknown theme {:?} (expected auto, dark, light or notty)",
                self.theme
            ),
        })
    }

    /// Column limit for styled output, or `None` when wrapping is off.
    pub fn effective_wrap_width(&self, terminal_columns: u16) -> Option<usize> {
        if !self.wrap_lines {
            None
        } else if self.wrap_width == 0 {
            Some(usize::from(terminal_columns))
        } else {
            Some(self.wrap_width)
        }
    }
}

/// A named prompt selectable with `-c <name>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PromptCommand {
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: String,
    /// Overall invocation deadline.
    pub context_timeout_sec: u64,
    pub http: HttpConfig,
    pub render: RenderConfig,
    pub prompts: BTreeMap<String, PromptCommand>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            context_timeout_sec: 600,
            http: HttpConfig::default(),
            render: RenderConfig::default(),
            prompts: default_prompts(),
        }
    }
}

fn default_prompts() -> BTreeMap<String, PromptCommand> {
    BTreeMap::from([(
        "ask".to_string(),
        PromptCommand {
            prompt: "Answer the following question.".to_string(),
            model: None,
        },
    )])
}

impl Config {
    /// Parses TOML. Built-in prompts stay available unless the file redefines them.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(raw)?;
        for (name, prompt) in default_prompts() {
            config.prompts.entry(name).or_insert(prompt);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "model",
                message: "must not be empty".to_string(),
            });
        }
        if self.context_timeout_sec == 0 {
            return Err(ConfigError::Invalid {
                field: "context_timeout_sec",
                message: "must be greater than zero".to_string(),
            });
        }
        self.render.theme_name()?;
        if let Some((name, _)) = self
            .prompts
            .iter()
            .find(|(_, command)| command.prompt.trim().is_empty())
        {
            return Err(ConfigError::Invalid {
                field: "prompts",
                message: format!("prompt {name:?} is empty"),
            });
        }
        Ok(())
    }

    pub fn context_timeout(&self) -> Duration {
        Duration::from_secs(self.context_timeout_sec)
    }

    pub fn prompt(&self, name: &str) -> Option<&PromptCommand> {
        self.prompts.get(name)
    }
}

/// `$XDG_CONFIG_HOME/gh-copilot/config.toml` when set, else under the platform config dir.
pub fn config_path() -> Option<PathBuf> {
    let base = env::var_os("XDG_CONFIG_HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)?;
    Some(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// YAML config files sitting next to `path`.
pub fn legacy_config_files(path: &Path) -> Vec<PathBuf> {
    let Some(dir) = path.parent() else {
        return Vec::new();
    };
    LEGACY_CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .filter(|candidate| candidate.is_file())
        .collect()
}

/// Reads `path`. A missing file yields the defaults.
pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
    for legacy in legacy_config_files(path) {
        tracing::warn!(
            legacy = %legacy.display(),
            expected = %path.display(),
            "ignoring YAML config file; move its settings to TOML"
        );
    }

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Config::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let config = Config::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Loads `path` on the blocking pool, giving up after `timeout`.
pub async fn load_with_timeout(path: PathBuf, timeout: Duration) -> Result<Config, ConfigError> {
    let task = tokio::task::spawn_blocking(move || load_from_path(&path));
    match tokio::time::timeout(timeout, task).await {
        Err(_) => Err(ConfigError::Timeout(timeout)),
        Ok(Err(join)) => Err(ConfigError::Loader(join.to_string())),
        Ok(Ok(result)) => result,
    }
}

pub async fn load() -> Result<Config, ConfigError> {
    match config_path() {
        Some(path) => load_with_timeout(path, CONFIG_LOAD_TIMEOUT).await,
        None => Ok(Config::default()),
    }
}
