use super::defaults;
use super::models::{AppConfig, HighlightColor, LogLevel};
use crate::highlight::HighlightGranularity;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Top-level tables recognised in a sectioned config file.
pub(super) const TABLE_NAMES: [&str; 4] = ["speech", "highlight", "voice", "logging"];

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    speech: SpeechConfig,
    #[serde(default)]
    highlight: HighlightConfig,
    #[serde(default)]
    voice: VoiceConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            locale: tables.speech.locale,
            speech_rate: tables.speech.rate,
            max_speech_length: tables.speech.max_speech_length,
            highlight_granularity: tables.highlight.granularity,
            auto_word_max_rate: tables.highlight.auto_word_max_rate,
            auto_sentence_min_rate: tables.highlight.auto_sentence_min_rate,
            current_highlight: tables.highlight.current_color,
            previous_highlight: tables.highlight.previous_color,
            auto_voice_switching: tables.voice.auto_voice_switching,
            enabled_languages: tables.voice.enabled_languages,
            stored_voices: tables.voice.stored_voices,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            speech: SpeechConfig {
                locale: config.locale.clone(),
                rate: config.speech_rate,
                max_speech_length: config.max_speech_length,
            },
            highlight: HighlightConfig {
                granularity: config.highlight_granularity,
                auto_word_max_rate: config.auto_word_max_rate,
                auto_sentence_min_rate: config.auto_sentence_min_rate,
                current_color: config.current_highlight,
                previous_color: config.previous_highlight,
            },
            voice: VoiceConfig {
                auto_voice_switching: config.auto_voice_switching,
                enabled_languages: config.enabled_languages.clone(),
                stored_voices: config.stored_voices.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct SpeechConfig {
    #[serde(default = "defaults::default_locale")]
    locale: String,
    #[serde(default = "defaults::default_speech_rate")]
    rate: f32,
    #[serde(default = "defaults::default_max_speech_length")]
    max_speech_length: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        SpeechConfig {
            locale: defaults::default_locale(),
            rate: defaults::default_speech_rate(),
            max_speech_length: defaults::default_max_speech_length(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct HighlightConfig {
    #[serde(default = "defaults::default_highlight_granularity")]
    granularity: HighlightGranularity,
    #[serde(default = "defaults::default_auto_word_max_rate")]
    auto_word_max_rate: f32,
    #[serde(default = "defaults::default_auto_sentence_min_rate")]
    auto_sentence_min_rate: f32,
    #[serde(default = "defaults::default_current_highlight")]
    current_color: HighlightColor,
    #[serde(default = "defaults::default_previous_highlight")]
    previous_color: HighlightColor,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        HighlightConfig {
            granularity: defaults::default_highlight_granularity(),
            auto_word_max_rate: defaults::default_auto_word_max_rate(),
            auto_sentence_min_rate: defaults::default_auto_sentence_min_rate(),
            current_color: defaults::default_current_highlight(),
            previous_color: defaults::default_previous_highlight(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct VoiceConfig {
    #[serde(default = "defaults::default_auto_voice_switching")]
    auto_voice_switching: bool,
    #[serde(default = "defaults::default_enabled_languages")]
    enabled_languages: Vec<String>,
    #[serde(default = "defaults::default_stored_voices")]
    stored_voices: BTreeMap<String, String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        VoiceConfig {
            auto_voice_switching: defaults::default_auto_voice_switching(),
            enabled_languages: defaults::default_enabled_languages(),
            stored_voices: defaults::default_stored_voices(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
