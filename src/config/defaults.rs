use std::collections::BTreeMap;

pub(crate) fn default_locale() -> String {
    "en-US".to_string()
}

pub(crate) fn default_speech_rate() -> f32 {
    1.0
}

/// Longest utterance handed to the speech engine in one go, in bytes.
pub(crate) fn default_max_speech_length() -> usize {
    175
}

pub(crate) fn default_highlight_granularity() -> crate::highlight::HighlightGranularity {
    crate::highlight::HighlightGranularity::Auto
}

pub(crate) fn default_auto_word_max_rate() -> f32 {
    0.75
}

pub(crate) fn default_auto_sentence_min_rate() -> f32 {
    1.75
}

pub(crate) fn default_current_highlight() -> crate::config::HighlightColor {
    crate::config::HighlightColor {
        r: 0.8,
        g: 0.8,
        b: 0.5,
        a: 0.4,
    }
}

pub(crate) fn default_previous_highlight() -> crate::config::HighlightColor {
    crate::config::HighlightColor {
        r: 0.5,
        g: 0.5,
        b: 0.5,
        a: 0.15,
    }
}

pub(crate) fn default_auto_voice_switching() -> bool {
    true
}

pub(crate) fn default_enabled_languages() -> Vec<String> {
    Vec::new()
}

pub(crate) fn default_stored_voices() -> BTreeMap<String, String> {
    BTreeMap::new()
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}
