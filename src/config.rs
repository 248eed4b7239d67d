use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Top-level config structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Name of this solve config.
    pub name: String,

    /// Target page carrying the widget.
    pub target: Target,

    /// Browser configuration.
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Solve behavior.
    #[serde(default)]
    pub solver: SolverConfig,
}

impl Config {
    /// Load config from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse config from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config.
    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Config("name is required".into()));
        }
        if self.target.url.is_empty() {
            return Err(Error::Config("target.url is required".into()));
        }
        if self.solver.animation_timeout_ms == 0 {
            return Err(Error::Config(
                "solver.animation_timeout_ms must be at least 1".into(),
            ));
        }
        if self.solver.poll_interval_ms == 0 {
            return Err(Error::Config(
                "solver.poll_interval_ms must be at least 1".into(),
            ));
        }
        if self.solver.solve_timeout_ms == 0 {
            return Err(Error::Config(
                "solver.solve_timeout_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Target page configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    /// URL of the page embedding the widget.
    pub url: String,

    /// Site key of the widget, forwarded to the solving service.
    pub sitekey: Option<String>,
}

/// Browser launch configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BrowserConfig {
    /// Run in headless mode.
    #[serde(default)]
    pub headless: bool,

    /// Proxy URL (e.g., "http://host:port").
    pub proxy: Option<String>,

    /// Proxy credentials, spliced into the proxy URL at launch and
    /// forwarded to the solving service.
    pub proxy_auth: Option<ProxyAuth>,

    /// Custom user agent.
    pub user_agent: Option<String>,

    /// Viewport size.
    pub viewport: Option<Viewport>,
}

/// Proxy credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

/// Viewport dimensions.
#[derive(Debug, Clone, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Secondary-challenge strategy. Fixed per solve call: a solve configured
/// for one strategy never falls back to the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Images,
    Audio,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Images => f.write_str("images"),
            Strategy::Audio => f.write_str("audio"),
        }
    }
}

/// Solve behavior configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SolverConfig {
    /// Which secondary-challenge strategy to use.
    #[serde(default = "default_strategy")]
    pub strategy: Strategy,

    /// Bound on every wait for the widget to render or settle, in
    /// milliseconds.
    #[serde(default = "default_animation_timeout_ms")]
    pub animation_timeout_ms: u64,

    /// Cadence of presence/detection polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Overall bound on one solve attempt, in milliseconds. A solve that
    /// exceeds it is cancelled at the next suspension point and reported
    /// as failed.
    #[serde(default = "default_solve_timeout_ms")]
    pub solve_timeout_ms: u64,

    /// Remote solving service (required to actually run the image/audio
    /// strategies from the CLI).
    pub service: Option<ServiceConfig>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            animation_timeout_ms: default_animation_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            solve_timeout_ms: default_solve_timeout_ms(),
            service: None,
        }
    }
}

impl SolverConfig {
    pub fn animation_timeout(&self) -> Duration {
        Duration::from_millis(self.animation_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn solve_timeout(&self) -> Duration {
        Duration::from_millis(self.solve_timeout_ms)
    }
}

/// Remote solving service endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the task API.
    pub url: String,

    /// Account key sent with every request.
    pub api_key: String,
}

fn default_strategy() -> Strategy {
    Strategy::Audio
}

fn default_animation_timeout_ms() -> u64 {
    5000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_solve_timeout_ms() -> u64 {
    120_000
}
