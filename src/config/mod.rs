// src/config/mod.rs

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::speech::TranscriberSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct EmpathConfig {
    // ── Server Configuration
    pub host: String,
    pub port: u16,
    pub cors_origin: String,

    // ── Database Configuration
    pub database_url: String,
    pub sqlite_max_connections: u32,

    // ── Emotion Classifier
    pub emotion_model_dir: String,
    /// Run the lexicon degraded mode instead of loading model weights.
    pub emotion_dev_mode: bool,
    pub chunk_max_len: usize,

    // ── Speech Transcription
    pub speech_api_key: Option<String>,
    pub speech_api_base: String,
    pub speech_remote_model: String,
    pub speech_timeout_secs: u64,
    pub whisper_model_path: String,
    pub speech_language: Option<String>,
    pub ffmpeg_path: String,
    pub convert_timeout_secs: u64,

    // ── History & Insights
    pub history_window: usize,
    pub history_default_page_size: usize,
    pub memory_default_limit: usize,
    pub insights_window_days: i64,
    pub insights_scan_cap: usize,

    // ── Logging Configuration
    pub log_level: String,
}

/// Parse an env var with a default. Values may carry trailing comments and
/// whitespace; both are stripped before parsing.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            clean_val.parse::<T>().unwrap_or(default)
        }
        Err(_) => default,
    }
}

fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl EmpathConfig {
    pub fn from_env() -> Self {
        // Load from .env file first if it exists.
        dotenvy::dotenv().ok();

        Self {
            host: env_var_or("EMPATH_HOST", "0.0.0.0".to_string()),
            port: env_var_or("EMPATH_PORT", 8000),
            cors_origin: env_var_or("EMPATH_CORS_ORIGIN", "*".to_string()),
            database_url: env_var_or("DATABASE_URL", "sqlite:empath.db?mode=rwc".to_string()),
            sqlite_max_connections: env_var_or("SQLITE_MAX_CONNECTIONS", 5),
            emotion_model_dir: env_var_or(
                "EMPATH_EMOTION_MODEL_DIR",
                "./models/emotion".to_string(),
            ),
            emotion_dev_mode: env_var_or("EMPATH_EMOTION_DEV", false),
            chunk_max_len: env_var_or("EMPATH_CHUNK_MAX_LEN", 300),
            speech_api_key: env_var_opt("OPENAI_API_KEY"),
            speech_api_base: env_var_or(
                "OPENAI_BASE_URL",
                "https://api.openai.com/v1".to_string(),
            ),
            speech_remote_model: env_var_or("EMPATH_SPEECH_MODEL", "whisper-1".to_string()),
            speech_timeout_secs: env_var_or("EMPATH_SPEECH_TIMEOUT", 60),
            whisper_model_path: env_var_or(
                "EMPATH_WHISPER_MODEL",
                "./models/asr/ggml-base.en.bin".to_string(),
            ),
            speech_language: env_var_opt("EMPATH_SPEECH_LANGUAGE"),
            ffmpeg_path: env_var_or("EMPATH_FFMPEG_PATH", "ffmpeg".to_string()),
            convert_timeout_secs: env_var_or("EMPATH_CONVERT_TIMEOUT", 30),
            history_window: env_var_or("EMPATH_HISTORY_WINDOW", 30),
            history_default_page_size: env_var_or("EMPATH_HISTORY_PAGE_SIZE", 20),
            memory_default_limit: env_var_or("EMPATH_MEMORY_LIMIT", 20),
            insights_window_days: env_var_or("EMPATH_INSIGHTS_WINDOW_DAYS", 30),
            insights_scan_cap: env_var_or("EMPATH_INSIGHTS_SCAN_CAP", 1000),
            log_level: env_var_or("EMPATH_LOG_LEVEL", "info".to_string()),
        }
    }

    // --- Convenience Methods for Common Operations ---

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Transcriber settings derived from the speech section.
    pub fn transcriber_settings(&self) -> TranscriberSettings {
        TranscriberSettings {
            api_key: self.speech_api_key.clone(),
            api_base: self.speech_api_base.clone(),
            remote_model: self.speech_remote_model.clone(),
            remote_timeout: Duration::from_secs(self.speech_timeout_secs),
            local_model_path: PathBuf::from(&self.whisper_model_path),
            language: self.speech_language.clone(),
            ffmpeg_path: self.ffmpeg_path.clone(),
            convert_timeout: Duration::from_secs(self.convert_timeout_secs),
        }
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<EmpathConfig> = Lazy::new(EmpathConfig::from_env);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = EmpathConfig::from_env();

        assert_eq!(config.chunk_max_len, 300);
        assert_eq!(config.history_window, 30);
        assert_eq!(config.insights_scan_cap, 1000);
        assert!(!config.bind_address().is_empty());
    }

    #[test]
    fn env_var_or_strips_comments() {
        unsafe {
            std::env::set_var("EMPATH_TEST_PORT", "9000 # dev override");
        }
        let port: u16 = env_var_or("EMPATH_TEST_PORT", 1);
        assert_eq!(port, 9000);
        unsafe {
            std::env::remove_var("EMPATH_TEST_PORT");
        }
    }

    #[test]
    fn transcriber_settings_carry_timeouts() {
        let config = EmpathConfig::from_env();
        let settings = config.transcriber_settings();
        assert!(settings.convert_timeout.as_secs() > 0);
        assert!(settings.remote_timeout.as_secs() > 0);
    }
}
