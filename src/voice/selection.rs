//! Picks a voice for a language from what the platform offers.

use crate::segmenter::{base_language, normalize_locale};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use ts_rs::TS;

/// A voice advertised by the speech provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Voice {
    pub name: String,
    pub lang: String,
    /// Platform default voice.
    #[serde(default)]
    pub default: bool,
    #[serde(default = "local_by_default")]
    pub local: bool,
}

fn local_by_default() -> bool {
    true
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
            default: false,
            local: true,
        }
    }

    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    fn locale(&self) -> String {
        normalize_locale(&self.lang)
    }
}

/// User preferences supplied by the preference store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoicePreferences {
    /// Voice name per language or locale.
    pub stored_voices: BTreeMap<String, String>,
    /// Languages the user reads in; empty means every language.
    pub enabled_languages: Vec<String>,
    pub auto_voice_switching: bool,
}

impl VoicePreferences {
    pub fn stored_voice(&self, language: &str) -> Option<&str> {
        let locale = normalize_locale(language);
        self.stored_voices
            .iter()
            .find(|(key, _)| normalize_locale(key) == locale)
            .or_else(|| {
                self.stored_voices
                    .iter()
                    .find(|(key, _)| normalize_locale(key) == base_language(&locale))
            })
            .map(|(_, name)| name.as_str())
    }

    pub fn is_enabled(&self, language: &str) -> bool {
        if self.enabled_languages.is_empty() {
            return true;
        }
        let locale = normalize_locale(language);
        self.enabled_languages.iter().any(|enabled| {
            let enabled = normalize_locale(enabled);
            enabled == locale || enabled == base_language(&locale)
        })
    }
}

/// Voices speaking `language`: an exact locale match, or any region when
/// `language` is a bare language code.
fn voices_for<'a>(voices: &'a [Voice], language: &str) -> Vec<&'a Voice> {
    let locale = normalize_locale(language);
    let bare = !locale.contains('-');
    voices
        .iter()
        .filter(|voice| {
            let voice_locale = voice.locale();
            voice_locale == locale || (bare && base_language(&voice_locale) == locale)
        })
        .collect()
}

fn same_base<'a>(voices: &'a [Voice], language: &str) -> Vec<&'a Voice> {
    let locale = normalize_locale(language);
    let base = base_language(&locale);
    voices
        .iter()
        .filter(|voice| base_language(&voice.locale()) == base)
        .collect()
}

fn preferred<'a>(candidates: &[&'a Voice]) -> Option<&'a Voice> {
    candidates
        .iter()
        .find(|voice| voice.default)
        .or_else(|| candidates.first())
        .copied()
}

/// Choose a voice for `language`, first match wins:
///
/// 1. the stored voice for this language when it is still available;
/// 2. the current voice if it already speaks this language, then the
///    platform default for the language, then its first voice;
/// 3. a voice of the same base language in another locale, then the device
///    default voice;
/// 4. for a language outside the enabled set, the same search over the
///    enabled languages.
pub fn select_voice<'a>(
    voices: &'a [Voice],
    language: &str,
    current: Option<&str>,
    preferences: &VoicePreferences,
) -> Option<&'a Voice> {
    if !preferences.is_enabled(language) {
        debug!(language, "Language not enabled; choosing from enabled set");
        return select_from_enabled(voices, current, preferences);
    }
    select_for_language(voices, language, current, preferences)
        .or_else(|| voices.iter().find(|voice| voice.default))
}

fn select_for_language<'a>(
    voices: &'a [Voice],
    language: &str,
    current: Option<&str>,
    preferences: &VoicePreferences,
) -> Option<&'a Voice> {
    if let Some(stored) = preferences.stored_voice(language) {
        if let Some(voice) = voices.iter().find(|voice| voice.name == stored) {
            return Some(voice);
        }
        debug!(language, stored, "Stored voice is no longer available");
    }

    let current = current.and_then(|name| voices.iter().find(|voice| voice.name == name));
    if !preferences.auto_voice_switching {
        if let Some(voice) = current {
            return Some(voice);
        }
    }

    let matching = voices_for(voices, language);
    if let Some(voice) = current.filter(|voice| matching.contains(voice)) {
        return Some(voice);
    }
    preferred(&matching).or_else(|| preferred(&same_base(voices, language)))
}

fn select_from_enabled<'a>(
    voices: &'a [Voice],
    current: Option<&str>,
    preferences: &VoicePreferences,
) -> Option<&'a Voice> {
    if let Some(voice) = voices
        .iter()
        .find(|voice| voice.default && preferences.is_enabled(&voice.lang))
    {
        return Some(voice);
    }
    preferences
        .enabled_languages
        .iter()
        .find_map(|language| select_for_language(voices, language, current, preferences))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs() -> VoicePreferences {
        VoicePreferences {
            auto_voice_switching: true,
            ..VoicePreferences::default()
        }
    }

    #[test]
    fn language_match_beats_default() {
        let voices = vec![
            Voice::new("Daniel", "en").with_default(true),
            Voice::new("Amelie", "fr"),
        ];
        let voice = select_voice(&voices, "fr", None, &prefs()).unwrap();
        assert_eq!(voice.name, "Amelie");
    }

    #[test]
    fn stored_voice_wins_when_available() {
        let voices = vec![
            Voice::new("Samantha", "en-US").with_default(true),
            Voice::new("Alex", "en-US"),
        ];
        let mut prefs = prefs();
        prefs.stored_voices.insert("en-US".into(), "Alex".into());
        assert_eq!(select_voice(&voices, "en-us", None, &prefs).unwrap().name, "Alex");

        prefs.stored_voices.insert("en-US".into(), "Gone".into());
        assert_eq!(
            select_voice(&voices, "en-US", None, &prefs).unwrap().name,
            "Samantha"
        );
    }

    #[test]
    fn current_voice_kept_for_same_language() {
        let voices = vec![
            Voice::new("Samantha", "en-US").with_default(true),
            Voice::new("Alex", "en-US"),
            Voice::new("Amelie", "fr-FR"),
        ];
        let chosen = select_voice(&voices, "en-US", Some("Alex"), &prefs()).unwrap();
        assert_eq!(chosen.name, "Alex");
        let chosen = select_voice(&voices, "fr-FR", Some("Alex"), &prefs()).unwrap();
        assert_eq!(chosen.name, "Amelie");
    }

    #[test]
    fn without_auto_switching_current_voice_sticks() {
        let voices = vec![Voice::new("Alex", "en-US"), Voice::new("Amelie", "fr-FR")];
        let prefs = VoicePreferences::default();
        let chosen = select_voice(&voices, "fr-FR", Some("Alex"), &prefs).unwrap();
        assert_eq!(chosen.name, "Alex");
    }

    #[test]
    fn falls_back_to_sibling_locale_then_device_default() {
        let voices = vec![
            Voice::new("Kyoko", "ja-JP").with_default(true),
            Voice::new("Daniel", "en-GB"),
        ];
        assert_eq!(
            select_voice(&voices, "en-US", None, &prefs()).unwrap().name,
            "Daniel"
        );
        assert_eq!(
            select_voice(&voices, "de-DE", None, &prefs()).unwrap().name,
            "Kyoko"
        );
    }

    #[test]
    fn disabled_language_picks_from_enabled_set() {
        let voices = vec![Voice::new("Anna", "de-DE"), Voice::new("Amelie", "fr-FR")];
        let mut prefs = prefs();
        prefs.enabled_languages = vec!["fr".into()];
        assert_eq!(
            select_voice(&voices, "de-DE", None, &prefs).unwrap().name,
            "Amelie"
        );

        prefs.enabled_languages = vec!["it".into()];
        assert!(select_voice(&voices, "de-DE", None, &prefs).is_none());
    }
}
