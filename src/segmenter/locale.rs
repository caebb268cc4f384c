//! Per-locale punctuation rules layered over UAX #29 segmentation.

/// Languages written without spaces between words.
const SCRIPTIO_CONTINUA: [&str; 6] = ["ja", "zh", "th", "lo", "km", "my"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleRules {
    locale: String,
    semicolon_is_question_mark: bool,
    scriptio_continua: bool,
}

impl Default for LocaleRules {
    fn default() -> Self {
        Self::for_locale("en-us")
    }
}

impl LocaleRules {
    pub fn for_locale(locale: &str) -> Self {
        let locale = normalize_locale(locale);
        let base = base_language(&locale).to_string();
        Self {
            semicolon_is_question_mark: base == "el",
            scriptio_continua: SCRIPTIO_CONTINUA.contains(&base.as_str()),
            locale,
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn base_language(&self) -> &str {
        base_language(&self.locale)
    }

    /// Greek writes the question mark as `;`.
    pub fn semicolon_is_question_mark(&self) -> bool {
        self.semicolon_is_question_mark
    }

    pub fn is_scriptio_continua(&self) -> bool {
        self.scriptio_continua
    }

    /// Kanji followed by kana form one word in Japanese.
    pub(crate) fn merges_okurigana(&self) -> bool {
        self.base_language() == "ja"
    }

    pub fn is_sentence_terminator(&self, ch: char) -> bool {
        match ch {
            '.' | '!' | '?' | '…' | '‼' | '⁇' | '⁈' | '⁉' | '؟' | '।' | '॥' | '\u{037E}' => true,
            ';' => self.semicolon_is_question_mark,
            '。' | '！' | '？' | '．' | '｡' => true,
            _ => false,
        }
    }

    pub fn is_clause_separator(&self, ch: char) -> bool {
        match ch {
            ',' | ':' | '—' | '–' | '،' => true,
            ';' => !self.semicolon_is_question_mark,
            '、' | '，' | '；' | '：' | '､' => true,
            _ => false,
        }
    }
}

/// Lowercases and swaps `_` for `-`, so `en_US` and `en-us` compare equal.
pub fn normalize_locale(locale: &str) -> String {
    locale.trim().replace('_', "-").to_ascii_lowercase()
}

pub fn base_language(locale: &str) -> &str {
    locale.split(['-', '_']).next().unwrap_or(locale)
}
