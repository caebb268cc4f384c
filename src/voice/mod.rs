//! Voice choice and voice-pack lifecycle for the active reading language.

mod install;
mod language;
mod selection;

pub use install::{
    VoiceInstallStatus, VoiceInstallTracker, VoiceNotification, VoicePackEffect,
    VoicePackStatusCode,
};
pub use language::VoicePackLanguage;
pub use selection::{Voice, VoicePreferences, select_voice};

use crate::segmenter::base_language;
use crate::segmenter::normalize_locale;
use tracing::{debug, info};

/// Result of a voice change: the new voice and whether it speaks the same
/// base language as the one it replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSwitch {
    pub voice: Voice,
    pub same_language: bool,
}

#[derive(Debug, Default)]
pub struct VoiceLanguageController {
    preferences: VoicePreferences,
    voices: Vec<Voice>,
    language: String,
    current: Option<Voice>,
    installs: VoiceInstallTracker,
}

impl VoiceLanguageController {
    pub fn new(preferences: VoicePreferences, voices: Vec<Voice>, language: &str) -> Self {
        let mut controller = Self {
            preferences,
            voices,
            language: normalize_locale(language),
            current: None,
            installs: VoiceInstallTracker::new(),
        };
        controller.reselect();
        controller
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn current_voice(&self) -> Option<&Voice> {
        self.current.as_ref()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn preferences(&self) -> &VoicePreferences {
        &self.preferences
    }

    /// The provider's voice list changed.
    pub fn set_voices(&mut self, voices: Vec<Voice>) -> Option<VoiceSwitch> {
        debug!(count = voices.len(), "Available voices updated");
        self.voices = voices;
        self.reselect()
    }

    /// Content language changed; pick a voice for it.
    pub fn set_language(&mut self, language: &str) -> Option<VoiceSwitch> {
        let language = normalize_locale(language);
        if language == self.language {
            return None;
        }
        info!(from = %self.language, to = %language, "Reading language changed");
        self.language = language;
        self.reselect()
    }

    /// The user picked a voice by name. It is remembered for the voice's
    /// language.
    pub fn set_user_voice(&mut self, name: &str) -> Option<VoiceSwitch> {
        let voice = self.voices.iter().find(|voice| voice.name == name)?.clone();
        self.preferences
            .stored_voices
            .insert(normalize_locale(&voice.lang), voice.name.clone());
        info!(voice = %voice.name, lang = %voice.lang, "User selected voice");
        self.switch_to(Some(voice))
    }

    pub fn install_status(&self, lang_or_locale: &str) -> VoiceInstallStatus {
        self.installs.status(lang_or_locale)
    }

    pub fn on_install_status(&mut self, lang_or_locale: &str, code: &str) -> Vec<VoicePackEffect> {
        self.installs.on_status(lang_or_locale, code)
    }

    pub fn request_install(&mut self, lang_or_locale: &str) -> Vec<VoicePackEffect> {
        self.installs.request_install(lang_or_locale)
    }

    fn reselect(&mut self) -> Option<VoiceSwitch> {
        let current_name = self.current.as_ref().map(|voice| voice.name.as_str());
        let selected = select_voice(&self.voices, &self.language, current_name, &self.preferences)
            .cloned();
        self.switch_to(selected)
    }

    fn switch_to(&mut self, voice: Option<Voice>) -> Option<VoiceSwitch> {
        if voice == self.current {
            return None;
        }
        let previous = std::mem::replace(&mut self.current, voice);
        let voice = self.current.clone()?;
        let same_language = previous.as_ref().is_some_and(|previous| {
            base_language(&normalize_locale(&previous.lang))
                == base_language(&normalize_locale(&voice.lang))
        });
        debug!(voice = %voice.name, same_language, "Voice switched");
        Some(VoiceSwitch {
            voice,
            same_language,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices() -> Vec<Voice> {
        vec![
            Voice::new("Samantha", "en-US").with_default(true),
            Voice::new("Alex", "en-US"),
            Voice::new("Amelie", "fr-FR"),
        ]
    }

    fn controller() -> VoiceLanguageController {
        let preferences = VoicePreferences {
            auto_voice_switching: true,
            ..VoicePreferences::default()
        };
        VoiceLanguageController::new(preferences, voices(), "en-US")
    }

    #[test]
    fn initial_selection_uses_language_default() {
        let controller = controller();
        assert_eq!(controller.current_voice().unwrap().name, "Samantha");
    }

    #[test]
    fn language_change_switches_voice_across_languages() {
        let mut controller = controller();
        let switch = controller.set_language("fr-FR").unwrap();
        assert_eq!(switch.voice.name, "Amelie");
        assert!(!switch.same_language);
        assert!(controller.set_language("fr_fr").is_none());
    }

    #[test]
    fn user_voice_is_remembered_per_language() {
        let mut controller = controller();
        let switch = controller.set_user_voice("Alex").unwrap();
        assert!(switch.same_language);
        assert_eq!(
            controller.preferences().stored_voice("en-US"),
            Some("Alex")
        );

        controller.set_language("fr-FR");
        let back = controller.set_language("en-US").unwrap();
        assert_eq!(back.voice.name, "Alex");
        assert!(controller.set_user_voice("Nobody").is_none());
    }
}
