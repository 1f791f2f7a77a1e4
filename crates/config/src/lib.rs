//! Configuration for the voice bridge
//!
//! Settings are layered: `config/default.yaml` first, then environment
//! variables with the `VOICEBRIDGE` prefix (`__` separator), e.g.
//! `VOICEBRIDGE__TELEPHONY__AUTH_TOKEN`.

pub mod settings;

pub use settings::{
    load, ObservabilityConfig, ServerConfig, Settings, SpeechConfig, TelephonyConfig,
};

use thiserror::Error;

/// Configuration errors; all are fatal at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required config value: {field}")]
    MissingValue { field: &'static str },

    #[error("invalid config value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },

    #[error("config load error: {0}")]
    Load(#[from] config::ConfigError),
}
