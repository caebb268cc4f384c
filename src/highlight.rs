//! Turns the playback position into current and previous highlight spans.

use crate::boundary::{BoundaryMode, WordBoundaryState};
use crate::config::HighlightColor;
use crate::node::{NodeId, Segment};
use crate::queue::{ReadingQueue, ReadingUnit};
use crate::segmenter::{TextSegmenter, TextUnit, floor_char_boundary, has_alphanumeric};
use serde::{Deserialize, Serialize};
use tracing::trace;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum HighlightGranularity {
    Off,
    Word,
    Phrase,
    Sentence,
    #[default]
    Auto,
}

impl HighlightGranularity {
    /// `Auto` picks a unit from the speech rate; faster speech gets coarser
    /// highlighting. Every other value resolves to itself.
    pub fn resolve(self, rate: f32, thresholds: &AutoGranularityThresholds) -> Self {
        match self {
            HighlightGranularity::Auto if rate < thresholds.word_max_rate => {
                HighlightGranularity::Word
            }
            HighlightGranularity::Auto if rate >= thresholds.sentence_min_rate => {
                HighlightGranularity::Sentence
            }
            HighlightGranularity::Auto => HighlightGranularity::Phrase,
            other => other,
        }
    }

    pub fn is_off(self) -> bool {
        self == HighlightGranularity::Off
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoGranularityThresholds {
    /// Rates strictly below this highlight words.
    pub word_max_rate: f32,
    /// Rates at or above this highlight whole sentences.
    pub sentence_min_rate: f32,
}

impl Default for AutoGranularityThresholds {
    fn default() -> Self {
        Self {
            word_max_rate: crate::config::defaults::default_auto_word_max_rate(),
            sentence_min_rate: crate::config::defaults::default_auto_sentence_min_rate(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum HighlightKind {
    Current,
    Previous,
}

/// One highlight descriptor for the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightSpan {
    pub node: NodeId,
    pub start: usize,
    pub length: usize,
    pub kind: HighlightKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlights {
    pub current: Vec<Segment>,
    pub previous: Vec<Segment>,
}

impl Highlights {
    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.previous.is_empty()
    }

    /// Flatten into span descriptors, previous spans first.
    pub fn spans(&self) -> Vec<HighlightSpan> {
        let tag = |kind: HighlightKind| {
            move |segment: &Segment| HighlightSpan {
                node: segment.node,
                start: segment.start,
                length: segment.length,
                kind,
            }
        };
        self.previous
            .iter()
            .map(tag(HighlightKind::Previous))
            .chain(self.current.iter().map(tag(HighlightKind::Current)))
            .collect()
    }
}

/// Compute highlights for the queue's cursor. `granularity` must already be
/// resolved; an unresolved `Auto` is treated as sentence-level.
pub fn resolve_highlights(
    queue: &ReadingQueue,
    granularity: HighlightGranularity,
    boundary: &WordBoundaryState,
    segmenter: &TextSegmenter,
) -> Highlights {
    if granularity.is_off() {
        return Highlights::default();
    }

    let previous = queue
        .previous()
        .iter()
        .flat_map(|unit| unit.segments.iter().copied())
        .collect();
    let current = queue
        .current()
        .map(|unit| current_segments(unit, granularity, boundary, segmenter))
        .unwrap_or_default();

    Highlights { current, previous }
}

fn current_segments(
    unit: &ReadingUnit,
    granularity: HighlightGranularity,
    boundary: &WordBoundaryState,
    segmenter: &TextSegmenter,
) -> Vec<Segment> {
    let sub_sentence = matches!(
        granularity,
        HighlightGranularity::Word | HighlightGranularity::Phrase
    );
    if !sub_sentence || boundary.mode != BoundaryMode::BoundaryDetected {
        return unit.segments.clone();
    }

    let span = match granularity {
        HighlightGranularity::Word => word_span(&unit.text, boundary, segmenter),
        _ => phrase_span(&unit.text, boundary, segmenter),
    };
    match span.and_then(|(start, end)| trimmed_span(&unit.text, start, end)) {
        Some((start, end)) => unit.segments_for_range(start, end),
        None => {
            trace!(
                position = boundary.absolute_position(),
                "Span has nothing to highlight; skipping frame"
            );
            Vec::new()
        }
    }
}

/// Word starting at the tracker's absolute position. The engine-reported
/// length wins when one was given.
fn word_span(
    text: &str,
    boundary: &WordBoundaryState,
    segmenter: &TextSegmenter,
) -> Option<(usize, usize)> {
    let start = position_in(text, boundary.absolute_position())?;
    let rest = &text[start..];
    let length = match boundary.speech_utterance_length {
        0 => segmenter.get_next_word_end(rest),
        reported => floor_char_boundary(rest, reported),
    };
    Some((start, start + length))
}

/// Phrase that contains the word at the tracker's absolute position.
fn phrase_span(
    text: &str,
    boundary: &WordBoundaryState,
    segmenter: &TextSegmenter,
) -> Option<(usize, usize)> {
    let position = position_in(text, boundary.absolute_position())?;
    segmenter
        .get_phrases(text)
        .iter()
        .find(|phrase| phrase.index <= position && position < phrase.end())
        .map(|phrase: &TextUnit| (phrase.index, phrase.end()))
}

fn position_in(text: &str, position: usize) -> Option<usize> {
    (position < text.len()).then(|| floor_char_boundary(text, position))
}

/// Trim whitespace off both ends; `None` when nothing speakable is left.
fn trimmed_span(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let slice = text.get(start..end)?;
    let leading = slice.len() - slice.trim_start().len();
    let trimmed = slice.trim();
    if trimmed.is_empty() || !has_alphanumeric(trimmed) {
        return None;
    }
    let from = start + leading;
    Some((from, from + trimmed.len()))
}

/// Background colour for a highlight. `Off` still yields a colour, just a
/// transparent one.
pub fn highlight_color(
    granularity: HighlightGranularity,
    kind: HighlightKind,
    current: HighlightColor,
    previous: HighlightColor,
) -> HighlightColor {
    if granularity.is_off() {
        return HighlightColor::TRANSPARENT;
    }
    match kind {
        HighlightKind::Current => current,
        HighlightKind::Previous => previous,
    }
}
