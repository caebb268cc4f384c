//! Locale-aware text segmentation for read-aloud.
//!
//! Sentence and word boundaries come from UAX #29 (`unicode-segmentation`);
//! the locale rules in [`locale`] patch in the cases the default algorithm
//! gets wrong for speech: Greek question marks, trailing opening brackets and
//! Japanese okurigana. All offsets are byte offsets into the input `&str`.

mod locale;

pub use locale::{LocaleRules, base_language, normalize_locale};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

const SENTENCE_CACHE_LIMIT: usize = 256;

static RE_TRAILING_OPENERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{Ps}\p{Pi}][\p{Ps}\p{Pi}\s]*$").unwrap());
static RE_LEADING_PUNCT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{P}+").unwrap());

/// One segmentation unit and its offset within the source string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextUnit {
    pub text: String,
    pub index: usize,
}

impl TextUnit {
    fn new(source: &str, start: usize, end: usize) -> Self {
        Self {
            text: source[start..end].to_string(),
            index: start,
        }
    }

    pub fn end(&self) -> usize {
        self.index + self.text.len()
    }
}

#[derive(Debug)]
pub struct TextSegmenter {
    rules: LocaleRules,
    sentence_cache: Mutex<HashMap<String, Vec<TextUnit>>>,
}

impl Default for TextSegmenter {
    fn default() -> Self {
        Self::new("en-US")
    }
}

impl TextSegmenter {
    pub fn new(locale: &str) -> Self {
        Self {
            rules: LocaleRules::for_locale(locale),
            sentence_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn rules(&self) -> &LocaleRules {
        &self.rules
    }

    /// Switch the locale used by subsequent calls. Cached sentence splits are
    /// dropped since they depend on the locale.
    pub fn update_language(&mut self, locale: &str) {
        let rules = LocaleRules::for_locale(locale);
        if rules == self.rules {
            return;
        }
        debug!(from = %self.rules.locale(), to = %rules.locale(), "Updating segmenter locale");
        self.rules = rules;
        self.sentence_cache
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// Split `text` into contiguous sentences whose concatenation is `text`.
    ///
    /// A run of opening punctuation left dangling at the end of a sentence
    /// (`hello.[2]` splits as `hello.[` / `2]` under UAX #29) is moved to the
    /// start of the following sentence.
    pub fn get_sentences(&self, text: &str) -> Vec<TextUnit> {
        if text.is_empty() {
            return Vec::new();
        }
        if let Some(cached) = self.lock_cache().get(text) {
            return cached.clone();
        }

        let mut cuts: Vec<usize> = text
            .split_sentence_bound_indices()
            .map(|(idx, _)| idx)
            .filter(|idx| *idx > 0)
            .collect();
        if self.rules.semicolon_is_question_mark() {
            cuts.extend(semicolon_question_cuts(text));
            cuts.sort_unstable();
            cuts.dedup();
        }
        let cuts = pull_openers_forward(text, &cuts);

        let mut sentences = Vec::with_capacity(cuts.len() + 1);
        let mut start = 0;
        for cut in cuts.into_iter().chain(std::iter::once(text.len())) {
            if cut > start {
                sentences.push(TextUnit::new(text, start, cut));
                start = cut;
            }
        }

        let mut cache = self.lock_cache();
        if cache.len() >= SENTENCE_CACHE_LIMIT {
            cache.clear();
        }
        cache.insert(text.to_string(), sentences.clone());
        sentences
    }

    /// Split `text` at clause punctuation. The punctuation run and any
    /// whitespace after it stay with the phrase they close.
    pub fn get_phrases(&self, text: &str) -> Vec<TextUnit> {
        let mut phrases = Vec::new();
        let mut start = 0;
        let mut chars = text.char_indices().peekable();
        while let Some((idx, ch)) = chars.next() {
            if !self.is_phrase_break(ch) {
                continue;
            }
            let mut end = idx + ch.len_utf8();
            while let Some(&(next_idx, next)) = chars.peek() {
                if self.is_phrase_break(next) || next.is_whitespace() || is_closing(next) {
                    end = next_idx + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            if end < text.len() {
                phrases.push(TextUnit::new(text, start, end));
                start = end;
            }
        }
        if start < text.len() {
            phrases.push(TextUnit::new(text, start, text.len()));
        }
        phrases
    }

    /// Word units: UAX #29 word segments containing a letter or number.
    pub fn get_words(&self, text: &str) -> Vec<TextUnit> {
        let words: Vec<TextUnit> = text
            .split_word_bound_indices()
            .filter(|(_, word)| has_alphanumeric(word))
            .map(|(idx, word)| TextUnit {
                text: word.to_string(),
                index: idx,
            })
            .collect();
        if self.rules.merges_okurigana() {
            merge_okurigana(words)
        } else {
            words
        }
    }

    pub fn get_word_count(&self, text: &str) -> usize {
        self.get_words(text).len()
    }

    /// End offset of the first word, skipping any leading punctuation or
    /// whitespace. Returns `text.len()` when there is no word at all.
    pub fn get_next_word_end(&self, text: &str) -> usize {
        self.get_words(text)
            .first()
            .map(TextUnit::end)
            .unwrap_or(text.len())
    }

    /// Largest prefix length of `text` that fits in `max_length` bytes,
    /// preferring to end on a sentence and then on a word.
    pub fn get_accessible_boundary(&self, text: &str, max_length: usize) -> usize {
        if text.len() <= max_length {
            return text.len();
        }

        let sentence_end = self
            .get_sentences(text)
            .iter()
            .map(|sentence| sentence.index + sentence.text.trim_end().len())
            .filter(|end| *end > 0)
            .take_while(|end| *end <= max_length)
            .last();
        if let Some(end) = sentence_end {
            return end;
        }

        let mut word_end = None;
        for word in self.get_words(text) {
            let end = word.end();
            if end > max_length {
                break;
            }
            let run_end = end + punctuation_run_len(&text[end..]);
            word_end = Some(if run_end <= max_length { run_end } else { end });
        }
        if let Some(end) = word_end {
            return end;
        }

        match floor_char_boundary(text, max_length) {
            0 => text.chars().next().map(char::len_utf8).unwrap_or(0),
            end => end,
        }
    }

    fn is_phrase_break(&self, ch: char) -> bool {
        self.rules.is_clause_separator(ch) || self.rules.is_sentence_terminator(ch)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<TextUnit>>> {
        self.sentence_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub(crate) fn has_alphanumeric(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}

/// Largest char boundary at or below `index`.
pub(crate) fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut idx = index;
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn punctuation_run_len(text: &str) -> usize {
    RE_LEADING_PUNCT_RUN
        .find(text)
        .map(|m| m.end())
        .unwrap_or(0)
}

fn is_closing(ch: char) -> bool {
    matches!(ch, ')' | ']' | '}' | '"' | '\'' | '”' | '’' | '»' | '）' | '」' | '』')
}

/// Cut points after a `;` that is followed by whitespace, placed after that
/// whitespace like UAX #29 does for other terminators.
fn semicolon_question_cuts(text: &str) -> Vec<usize> {
    let mut cuts = Vec::new();
    for (idx, _) in text.match_indices(';') {
        let rest = &text[idx + 1..];
        let trimmed = rest.trim_start();
        if trimmed.len() == rest.len() && !rest.is_empty() {
            continue;
        }
        let cut = text.len() - trimmed.len();
        if cut < text.len() {
            cuts.push(cut);
        }
    }
    cuts
}

fn pull_openers_forward(text: &str, cuts: &[usize]) -> Vec<usize> {
    let mut adjusted = Vec::with_capacity(cuts.len());
    let mut start = 0;
    for &cut in cuts {
        let piece = &text[start..cut];
        let cut = match RE_TRAILING_OPENERS.find(piece) {
            Some(openers) => start + openers.start(),
            None => cut,
        };
        // A piece made only of openers merges into the next sentence.
        if cut > start {
            adjusted.push(cut);
            start = cut;
        }
    }
    adjusted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JaScript {
    Kanji,
    Hiragana,
    Other,
}

fn ja_script(ch: char) -> JaScript {
    match ch {
        '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '々' => JaScript::Kanji,
        '\u{3041}'..='\u{309F}' => JaScript::Hiragana,
        _ => JaScript::Other,
    }
}

fn uniform_ja_script(text: &str) -> JaScript {
    let mut scripts = text.chars().map(ja_script);
    match scripts.next() {
        Some(first) if scripts.all(|script| script == first) => first,
        _ => JaScript::Other,
    }
}

fn merge_okurigana(words: Vec<TextUnit>) -> Vec<TextUnit> {
    let mut merged: Vec<TextUnit> = Vec::with_capacity(words.len());
    for word in words {
        if let Some(last) = merged.last_mut() {
            let adjacent = last.end() == word.index;
            let last_script = last.text.chars().last().map(ja_script);
            let joins = adjacent
                && matches!(
                    (last_script, uniform_ja_script(&word.text)),
                    (Some(JaScript::Kanji), JaScript::Kanji | JaScript::Hiragana)
                        | (Some(JaScript::Hiragana), JaScript::Hiragana)
                );
            if joins {
                last.text.push_str(&word.text);
                continue;
            }
        }
        merged.push(word);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(units: &[TextUnit]) -> Vec<&str> {
        units.iter().map(|unit| unit.text.as_str()).collect()
    }

    #[test]
    fn trailing_bracket_moves_to_next_sentence() {
        let segmenter = TextSegmenter::default();
        let sentences = segmenter.get_sentences("hello.[2]");
        assert_eq!(texts(&sentences), vec!["hello.", "[2]"]);
        assert_eq!(sentences[1].index, 6);
    }

    #[test]
    fn sentences_concatenate_back_to_input() {
        let segmenter = TextSegmenter::default();
        let inputs = [
            "One. Two! Three? (Four, with parens) five.",
            "Dr. Smith went home.[3] Then he slept.  ",
            "No terminator at all",
            "Wait... what? Really!!",
        ];
        for input in inputs {
            let sentences = segmenter.get_sentences(input);
            let joined: String = sentences.iter().map(|s| s.text.as_str()).collect();
            assert_eq!(joined, input);
            let mut expected = 0;
            for sentence in &sentences {
                assert_eq!(sentence.index, expected);
                expected = sentence.end();
            }
        }
    }

    #[test]
    fn parentheses_do_not_split_sentences() {
        let segmenter = TextSegmenter::default();
        let sentences = segmenter.get_sentences("He left (quietly) and - at last - slept. Done.");
        assert_eq!(
            texts(&sentences),
            vec!["He left (quietly) and - at last - slept. ", "Done."]
        );
    }

    #[test]
    fn greek_semicolon_ends_a_question() {
        let mut segmenter = TextSegmenter::new("en");
        let text = "Τι κάνεις; Καλά.";
        assert_eq!(segmenter.get_sentences(text).len(), 1);

        segmenter.update_language("el");
        assert_eq!(
            texts(&segmenter.get_sentences(text)),
            vec!["Τι κάνεις; ", "Καλά."]
        );
    }

    #[test]
    fn japanese_sentences_split_without_spaces() {
        let segmenter = TextSegmenter::new("ja");
        let sentences = segmenter.get_sentences("今日は晴れです。明日は雨です。");
        assert_eq!(texts(&sentences), vec!["今日は晴れです。", "明日は雨です。"]);
    }

    #[test]
    fn japanese_words_keep_okurigana() {
        let segmenter = TextSegmenter::new("ja");
        assert_eq!(texts(&segmenter.get_words("食べる")), vec!["食べる"]);
        let english = TextSegmenter::new("en");
        assert!(english.get_word_count("食べる") > 1);
    }

    #[test]
    fn word_count_ignores_punctuation_and_whitespace() {
        let segmenter = TextSegmenter::default();
        assert_eq!(segmenter.get_word_count(""), 0);
        assert_eq!(segmenter.get_word_count(" "), 0);
        assert_eq!(segmenter.get_word_count("."), 0);
        assert_eq!(segmenter.get_word_count("Hello, big world!"), 3);
    }

    #[test]
    fn word_count_matches_sum_over_sentences() {
        let segmenter = TextSegmenter::default();
        let text = "It was late. The rain (finally) stopped!  Nobody noticed, of course.[1]";
        let per_sentence: usize = segmenter
            .get_sentences(text)
            .iter()
            .map(|sentence| segmenter.get_word_count(&sentence.text))
            .sum();
        assert_eq!(per_sentence, segmenter.get_word_count(text));
    }

    #[test]
    fn next_word_end_skips_leading_punctuation() {
        let segmenter = TextSegmenter::default();
        assert_eq!(segmenter.get_next_word_end("hello world"), 5);
        assert_eq!(segmenter.get_next_word_end("  ...hello world"), 10);
        assert_eq!(segmenter.get_next_word_end("!!!"), 3);
        assert_eq!(segmenter.get_next_word_end(""), 0);
    }

    #[test]
    fn phrases_split_on_clause_punctuation() {
        let segmenter = TextSegmenter::default();
        let phrases = segmenter.get_phrases("First, second; third: end.");
        assert_eq!(texts(&phrases), vec!["First, ", "second; ", "third: ", "end."]);
    }

    #[test]
    fn accessible_boundary_returns_length_when_short() {
        let segmenter = TextSegmenter::default();
        assert_eq!(segmenter.get_accessible_boundary("short", 10), 5);
        assert_eq!(segmenter.get_accessible_boundary("", 0), 0);
    }

    #[test]
    fn accessible_boundary_prefers_sentence_end() {
        let segmenter = TextSegmenter::default();
        let text = "First sentence. Second sentence is longer.";
        assert_eq!(segmenter.get_accessible_boundary(text, 30), 15);
    }

    #[test]
    fn accessible_boundary_falls_back_to_word_end() {
        let segmenter = TextSegmenter::default();
        let text = "one two three four five";
        assert_eq!(segmenter.get_accessible_boundary(text, 10), 7);
    }

    #[test]
    fn accessible_boundary_keeps_comma_with_its_clause() {
        let segmenter = TextSegmenter::default();
        let text = "alpha beta, gamma delta epsilon";
        assert_eq!(segmenter.get_accessible_boundary(text, 12), 11);
        // The comma past the cutoff is never used.
        assert_eq!(segmenter.get_accessible_boundary(text, 10), 10);
        assert_eq!(segmenter.get_accessible_boundary(text, 9), 5);
    }

    #[test]
    fn accessible_boundary_never_cuts_inside_punctuation_run() {
        let segmenter = TextSegmenter::default();
        let text = "Wait... what happened here";
        assert_eq!(segmenter.get_accessible_boundary(text, 6), 4);
    }

    #[test]
    fn accessible_boundary_falls_back_to_max_length() {
        let segmenter = TextSegmenter::default();
        let text = "supercalifragilistic";
        assert_eq!(segmenter.get_accessible_boundary(text, 5), 5);
        assert_eq!(segmenter.get_accessible_boundary("日本語", 1), 3);
    }

    #[test]
    fn accessible_boundary_is_bounded() {
        let segmenter = TextSegmenter::default();
        let text = "Lorem ipsum dolor sit amet, consectetur. Adipiscing elit sed do.";
        for max in 0..text.len() + 3 {
            let boundary = segmenter.get_accessible_boundary(text, max);
            let first_word = segmenter.get_next_word_end(text);
            assert!(boundary <= max.max(first_word), "max={max} boundary={boundary}");
            assert!(text.is_char_boundary(boundary));
        }
    }

    #[test]
    fn update_language_clears_cache() {
        let mut segmenter = TextSegmenter::new("en");
        let _ = segmenter.get_sentences("A; b.");
        segmenter.update_language("el");
        assert_eq!(segmenter.lock_cache().len(), 0);
        assert_eq!(segmenter.rules().base_language(), "el");
    }

    #[test]
    fn shared_segmenter_splits_from_several_threads() {
        let segmenter = TextSegmenter::default();
        let texts = ["One. Two. Three.", "Alpha beta. Gamma delta?"];
        let results: Vec<Vec<String>> = std::thread::scope(|scope| {
            let handles: Vec<_> = texts
                .iter()
                .map(|text| {
                    let segmenter = &segmenter;
                    scope.spawn(move || -> Vec<String> {
                        (0..50)
                            .map(|_| segmenter.get_sentences(text))
                            .last()
                            .unwrap_or_default()
                            .into_iter()
                            .map(|unit| unit.text)
                            .collect()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("segmenter thread"))
                .collect()
        });

        assert_eq!(results[0], vec!["One. ", "Two. ", "Three."]);
        assert_eq!(results[1], vec!["Alpha beta. ", "Gamma delta?"]);
        assert_eq!(segmenter.lock_cache().len(), 2);
    }
}
