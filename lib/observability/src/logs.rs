use crate::config::ObservabilityConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_DIRECTIVES: &str = "info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
    Logfmt,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown log format `{0}`, expected one of `plain`, `json`, `logfmt`")]
pub struct UnknownLogFormat(String);

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            "logfmt" => Ok(Self::Logfmt),
            _ => Err(UnknownLogFormat(s.to_owned())),
        }
    }
}

/// Builder for the global `tracing` subscriber.
#[derive(Debug, Default)]
pub struct Logs {
    format: LogFormat,
    directives: Option<String>,
    disable_ansi: bool,
}

impl Logs {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn from_config(config: &ObservabilityConfig) -> anyhow::Result<Self> {
        Ok(Self {
            format: config.log_format.parse()?,
            directives: config.log_directives.clone(),
            disable_ansi: false,
        })
    }

    /// Overrides `RUST_LOG`.
    pub fn with_directives(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    pub fn disable_ansi(mut self) -> Self {
        self.disable_ansi = true;
        self
    }

    fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        Ok(match &self.directives {
            Some(directives) => EnvFilter::try_new(directives)?,
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES)),
        })
    }

    /// Installs the subscriber. Fails if a global subscriber is already set.
    pub fn install(self) -> anyhow::Result<()> {
        let registry = tracing_subscriber::registry().with(self.env_filter()?);
        match self.format {
            LogFormat::Plain => registry
                .with(fmt::layer().with_ansi(!self.disable_ansi))
                .try_init()?,
            LogFormat::Json => registry
                .with(fmt::layer().json().flatten_event(true))
                .try_init()?,
            LogFormat::Logfmt => registry.with(tracing_logfmt::layer()).try_init()?,
        }
        tracing::debug!(format = ?self.format, "installed logs subscriber");
        Ok(())
    }
}
