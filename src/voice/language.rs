//! Canonical language keys understood by the voice-pack backend.

use crate::segmenter::{base_language, normalize_locale};
use serde::Serialize;
use std::fmt;

/// Locales the backend ships distinct packs for.
const SUPPORTED_LOCALES: [&str; 8] = [
    "en-us", "en-gb", "en-au", "en-in", "es-es", "es-us", "pt-br", "pt-pt",
];

/// Languages with a single pack regardless of region.
const SUPPORTED_BASE_LANGUAGES: [&str; 27] = [
    "bn", "cs", "da", "de", "el", "fi", "fil", "fr", "hi", "hu", "id", "it", "ja", "km", "ko",
    "nb", "ne", "nl", "pl", "si", "sk", "sv", "th", "tr", "uk", "vi", "yue",
];

fn default_locale_for(base: &str) -> Option<&'static str> {
    match base {
        "en" => Some("en-us"),
        "es" => Some("es-es"),
        "pt" => Some("pt-br"),
        _ => None,
    }
}

/// A language or locale key accepted by the voice-pack backend. Only
/// obtainable through [`VoicePackLanguage::canonicalize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VoicePackLanguage(String);

impl VoicePackLanguage {
    /// Map any language tag onto the key the backend knows it by.
    ///
    /// Bare languages with regional packs get their default locale (`en` to
    /// `en-us`), unsupported regions fall back to the base language (`fr-FR`
    /// to `fr`) or to the default sibling locale (`en-UK` to `en-us`).
    /// Anything else is unsupported.
    pub fn canonicalize(lang_or_locale: &str) -> Option<Self> {
        let normalized = normalize_locale(lang_or_locale);
        if SUPPORTED_LOCALES.contains(&normalized.as_str()) {
            return Some(Self(normalized));
        }
        let base = base_language(&normalized);
        if let Some(locale) = default_locale_for(base) {
            return Some(Self(locale.to_string()));
        }
        SUPPORTED_BASE_LANGUAGES
            .contains(&base)
            .then(|| Self(base.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn base_language(&self) -> &str {
        base_language(&self.0)
    }
}

impl fmt::Display for VoicePackLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(input: &str) -> Option<String> {
        VoicePackLanguage::canonicalize(input).map(|lang| lang.as_str().to_string())
    }

    #[test]
    fn canonicalizes_supported_and_sibling_locales() {
        assert_eq!(canonical("fr-FR").as_deref(), Some("fr"));
        assert_eq!(canonical("en-UK").as_deref(), Some("en-us"));
        assert_eq!(canonical("en-GB").as_deref(), Some("en-gb"));
        assert_eq!(canonical("pt_PT").as_deref(), Some("pt-pt"));
        assert_eq!(canonical("es-MX").as_deref(), Some("es-es"));
    }

    #[test]
    fn bare_languages_get_default_locale() {
        assert_eq!(canonical("en").as_deref(), Some("en-us"));
        assert_eq!(canonical("es").as_deref(), Some("es-es"));
        assert_eq!(canonical("pt").as_deref(), Some("pt-br"));
        assert_eq!(canonical("yue").as_deref(), Some("yue"));
    }

    #[test]
    fn unsupported_languages_have_no_key() {
        assert_eq!(canonical("cn"), None);
        assert_eq!(canonical("zh-CN"), None);
        assert_eq!(canonical(""), None);
    }
}
