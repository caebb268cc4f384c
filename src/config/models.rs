use crate::highlight::{AutoGranularityThresholds, HighlightGranularity};
use serde::Deserialize;
use std::collections::BTreeMap;
use ts_rs::TS;

/// High-level engine configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, serde::Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_locale")]
    pub locale: String,
    #[serde(default = "crate::config::defaults::default_speech_rate")]
    pub speech_rate: f32,
    #[serde(default = "crate::config::defaults::default_max_speech_length")]
    pub max_speech_length: usize,
    #[serde(default = "crate::config::defaults::default_highlight_granularity")]
    pub highlight_granularity: HighlightGranularity,
    #[serde(default = "crate::config::defaults::default_auto_word_max_rate")]
    pub auto_word_max_rate: f32,
    #[serde(default = "crate::config::defaults::default_auto_sentence_min_rate")]
    pub auto_sentence_min_rate: f32,
    #[serde(default = "crate::config::defaults::default_current_highlight")]
    pub current_highlight: HighlightColor,
    #[serde(default = "crate::config::defaults::default_previous_highlight")]
    pub previous_highlight: HighlightColor,
    #[serde(default = "crate::config::defaults::default_auto_voice_switching")]
    pub auto_voice_switching: bool,
    #[serde(default = "crate::config::defaults::default_enabled_languages")]
    pub enabled_languages: Vec<String>,
    /// Voice name chosen by the user, keyed by language.
    #[serde(default = "crate::config::defaults::default_stored_voices")]
    pub stored_voices: BTreeMap<String, String>,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            locale: crate::config::defaults::default_locale(),
            speech_rate: crate::config::defaults::default_speech_rate(),
            max_speech_length: crate::config::defaults::default_max_speech_length(),
            highlight_granularity: crate::config::defaults::default_highlight_granularity(),
            auto_word_max_rate: crate::config::defaults::default_auto_word_max_rate(),
            auto_sentence_min_rate: crate::config::defaults::default_auto_sentence_min_rate(),
            current_highlight: crate::config::defaults::default_current_highlight(),
            previous_highlight: crate::config::defaults::default_previous_highlight(),
            auto_voice_switching: crate::config::defaults::default_auto_voice_switching(),
            enabled_languages: crate::config::defaults::default_enabled_languages(),
            stored_voices: crate::config::defaults::default_stored_voices(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn auto_thresholds(&self) -> AutoGranularityThresholds {
        AutoGranularityThresholds {
            word_max_rate: self.auto_word_max_rate,
            sentence_min_rate: self.auto_sentence_min_rate,
        }
    }
}

#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize, PartialEq, TS)]
#[ts(export)]
pub struct HighlightColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl HighlightColor {
    pub const TRANSPARENT: HighlightColor = HighlightColor {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
