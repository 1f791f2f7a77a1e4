//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Telephony provider configuration
    #[serde(default)]
    pub telephony: TelephonyConfig,

    /// Speech provider configuration
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Control server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Validate settings; every non-defaultable value must be present
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("telephony.account_sid", &self.telephony.account_sid),
            ("telephony.auth_token", &self.telephony.auth_token),
            ("telephony.from_number", &self.telephony.from_number),
            ("telephony.to_number", &self.telephony.to_number),
            ("speech.api_key", &self.speech.api_key),
            ("server.public_url", &self.server.public_url),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingValue { field });
            }
        }

        if self.speech.speed <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "speech.speed",
                message: format!("must be positive, got {}", self.speech.speed),
            });
        }

        Ok(())
    }
}

/// Telephony provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelephonyConfig {
    /// Provider account identifier
    #[serde(default)]
    pub account_sid: String,

    /// Provider auth token
    #[serde(default)]
    pub auth_token: String,

    /// Outbound caller number (E.164)
    #[serde(default)]
    pub from_number: String,

    /// Number to dial (E.164)
    #[serde(default)]
    pub to_number: String,

    /// Provider API base URL
    #[serde(default = "default_telephony_base_url")]
    pub base_url: String,

    /// Ring timeout passed to the provider when dialing
    #[serde(default = "default_dial_timeout")]
    pub dial_timeout_seconds: u32,
}

fn default_telephony_base_url() -> String {
    "https://api.twilio.com".to_string()
}
fn default_dial_timeout() -> u32 {
    60
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            to_number: String::new(),
            base_url: default_telephony_base_url(),
            dial_timeout_seconds: default_dial_timeout(),
        }
    }
}

/// Speech provider configuration (TTS and STT share one key)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Speech provider API key
    #[serde(default)]
    pub api_key: String,

    /// Speech provider base URL
    #[serde(default = "default_speech_base_url")]
    pub base_url: String,

    /// Synthesis voice
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Synthesis speed multiplier
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_speech_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_voice() -> String {
    "alloy".to_string()
}
fn default_speed() -> f32 {
    1.0
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_speech_base_url(),
            voice: default_voice(),
            speed: default_speed(),
        }
    }
}

/// Control server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Publicly routable base URL the telephony provider can reach
    #[serde(default)]
    pub public_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3333
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: String::new(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment.
///
/// Priority (highest to lowest):
/// 1. Environment variables (`VOICEBRIDGE` prefix, `__` separator)
/// 2. `config/default.yaml`
pub fn load() -> Result<Settings, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix("VOICEBRIDGE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_settings() -> Settings {
        Settings {
            telephony: TelephonyConfig {
                account_sid: "AC0123".into(),
                auth_token: "token".into(),
                from_number: "+15550001111".into(),
                to_number: "+15550002222".into(),
                ..TelephonyConfig::default()
            },
            speech: SpeechConfig {
                api_key: "sk-test".into(),
                ..SpeechConfig::default()
            },
            server: ServerConfig {
                public_url: "https://bridge.example.com".into(),
                ..ServerConfig::default()
            },
            observability: ObservabilityConfig::default(),
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 3333);
        assert_eq!(settings.speech.speed, 1.0);
        assert_eq!(settings.telephony.dial_timeout_seconds, 60);
    }

    #[test]
    fn test_complete_settings_validate() {
        assert!(complete_settings().validate().is_ok());
    }

    #[test]
    fn test_missing_values_fail_validation() {
        // defaults have no credentials at all
        assert!(Settings::default().validate().is_err());

        let mut settings = complete_settings();
        settings.telephony.auth_token.clear();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingValue {
                field: "telephony.auth_token"
            })
        ));
    }

    #[test]
    fn test_invalid_speed_rejected() {
        let mut settings = complete_settings();
        settings.speech.speed = 0.0;
        assert!(settings.validate().is_err());
    }
}
