//! Command-driven façade tying the read-aloud components together.

use crate::boundary::BoundaryMode;
use crate::config::{AppConfig, HighlightColor};
use crate::content::{ContentHandle, ContentTree};
use crate::error::Result;
use crate::highlight::{self, HighlightGranularity, HighlightKind};
use crate::node::{NodeId, NodeStore, Segment};
use crate::queue::ReadingQueue;
use crate::segmenter::{TextSegmenter, normalize_locale};
use crate::speech::{PauseSource, PlaybackState, SpeechController, SpeechEffect, SpeechEvent};
use crate::voice::{
    Voice, VoiceInstallStatus, VoiceLanguageController, VoicePackEffect, VoicePreferences,
    VoiceSwitch,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct HighlightSpanView {
    pub node: u64,
    pub start: usize,
    pub length: usize,
    pub kind: HighlightKind,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ReadAloudSnapshot {
    pub state: PlaybackState,
    pub pause_source: Option<PauseSource>,
    pub granularity: HighlightGranularity,
    pub resolved_granularity: HighlightGranularity,
    pub boundary_mode: BoundaryMode,
    pub spans: Vec<HighlightSpanView>,
    pub links_suppressed: bool,
    pub unit_index: Option<usize>,
    pub unit_count: usize,
    pub voice: Option<String>,
    pub language: String,
    pub voice_pack_status: VoiceInstallStatus,
    pub rate: f32,
    pub current_color: HighlightColor,
    pub previous_color: HighlightColor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    GetSnapshot,
    Play,
    Pause { source: PauseSource },
    Stop,
    NextGranularity,
    PreviousGranularity,
    SetGranularity { granularity: HighlightGranularity },
    SetRate { rate: f32 },
    SetVoice { name: String },
    SetLanguage { locale: String },
    SetSelection { handle: ContentHandle, offset: usize },
    ClearSelection,
}

impl SessionCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetSnapshot => "read_aloud_get_snapshot",
            Self::Play => "read_aloud_play",
            Self::Pause { .. } => "read_aloud_pause",
            Self::Stop => "read_aloud_stop",
            Self::NextGranularity => "read_aloud_next_granularity",
            Self::PreviousGranularity => "read_aloud_previous_granularity",
            Self::SetGranularity { .. } => "read_aloud_set_granularity",
            Self::SetRate { .. } => "read_aloud_set_rate",
            Self::SetVoice { .. } => "read_aloud_set_voice",
            Self::SetLanguage { .. } => "read_aloud_set_language",
            Self::SetSelection { .. } => "read_aloud_set_selection",
            Self::ClearSelection => "read_aloud_clear_selection",
        }
    }
}

/// Outcome of a command or engine event: the effects to hand to the
/// synthesizer and the state to render.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub action: &'static str,
    pub effects: Vec<SpeechEffect>,
    pub snapshot: ReadAloudSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Selection {
    handle: ContentHandle,
    offset: usize,
}

pub struct ReadAloudSession<T: ContentTree> {
    pub config: AppConfig,
    tree: T,
    nodes: Vec<NodeId>,
    store: NodeStore,
    segmenter: TextSegmenter,
    speech: SpeechController,
    voices: VoiceLanguageController,
    granularity: HighlightGranularity,
    selection: Option<Selection>,
}

impl<T: ContentTree> ReadAloudSession<T> {
    /// `handles` lists the text-bearing nodes of `tree` in reading order.
    pub fn new(
        config: AppConfig,
        tree: T,
        handles: &[ContentHandle],
        voices: Vec<Voice>,
    ) -> Result<Self> {
        let preferences = VoicePreferences {
            stored_voices: config.stored_voices.clone(),
            enabled_languages: config.enabled_languages.clone(),
            auto_voice_switching: config.auto_voice_switching,
        };
        let voices = VoiceLanguageController::new(preferences, voices, &config.locale);
        let mut speech =
            SpeechController::new(config.speech_rate, config.max_speech_length, voices.language());
        let voice = voices.current_voice().map(|voice| voice.name.clone());
        let segmenter = TextSegmenter::new(&config.locale);
        speech.on_voice_changed(voice, true, &segmenter);

        let mut session = Self {
            granularity: config.highlight_granularity,
            config,
            tree,
            nodes: Vec::new(),
            store: NodeStore::new(),
            segmenter,
            speech,
            voices,
            selection: None,
        };
        session.register(handles)?;
        Ok(session)
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    /// Mutable tree access for content updates; follow a node swap with
    /// [`ReadAloudSession::replace_node`].
    pub fn tree_mut(&mut self) -> &mut T {
        &mut self.tree
    }

    pub fn speech(&self) -> &SpeechController {
        &self.speech
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn apply_command(&mut self, command: SessionCommand) -> SessionEvent {
        let action = command.action();
        let effects = match command {
            SessionCommand::GetSnapshot => Vec::new(),
            SessionCommand::Play => self.play(),
            SessionCommand::Pause { source } => self.speech.pause(source),
            SessionCommand::Stop => self.speech.reset(),
            SessionCommand::NextGranularity => self.speech.next_unit(&self.segmenter),
            SessionCommand::PreviousGranularity => self.speech.previous_unit(&self.segmenter),
            SessionCommand::SetGranularity { granularity } => {
                info!(?granularity, "Highlight granularity changed");
                self.granularity = granularity;
                self.config.highlight_granularity = granularity;
                Vec::new()
            }
            SessionCommand::SetRate { rate } => {
                self.speech.set_rate(rate);
                self.config.speech_rate = self.speech.rate();
                Vec::new()
            }
            SessionCommand::SetVoice { name } => {
                let switch = self.voices.set_user_voice(&name);
                if let Some(voice) = self.voices.current_voice() {
                    self.config
                        .stored_voices
                        .insert(normalize_locale(&voice.lang), voice.name.clone());
                }
                self.apply_voice_switch(switch)
            }
            SessionCommand::SetLanguage { locale } => self.set_language(&locale),
            SessionCommand::SetSelection { handle, offset } => {
                self.selection = Some(Selection { handle, offset });
                Vec::new()
            }
            SessionCommand::ClearSelection => {
                self.selection = None;
                Vec::new()
            }
        };
        SessionEvent {
            action,
            effects,
            snapshot: self.snapshot(),
        }
    }

    pub fn handle_speech_event(&mut self, event: SpeechEvent) -> SessionEvent {
        let effects = self.speech.on_event(event, &self.segmenter);
        SessionEvent {
            action: "read_aloud_speech_event",
            effects,
            snapshot: self.snapshot(),
        }
    }

    /// The provider's voice list changed.
    pub fn set_voices(&mut self, voices: Vec<Voice>) -> Vec<SpeechEffect> {
        let switch = self.voices.set_voices(voices);
        self.apply_voice_switch(switch)
    }

    pub fn on_voice_pack_status(&mut self, lang_or_locale: &str, code: &str) -> Vec<VoicePackEffect> {
        self.voices.on_install_status(lang_or_locale, code)
    }

    pub fn request_voice_pack_install(&mut self, lang_or_locale: &str) -> Vec<VoicePackEffect> {
        self.voices.request_install(lang_or_locale)
    }

    /// The rendering layer swapped `old` for `new` in the tree.
    pub fn replace_node(&mut self, old: ContentHandle, new: ContentHandle) -> Result<NodeId> {
        self.store.replace(&self.tree, old, new)
    }

    /// New page content: stop, forget every node and start over.
    pub fn set_content(&mut self, tree: T, handles: &[ContentHandle]) -> Result<Vec<SpeechEffect>> {
        let effects = self.speech.reset();
        self.selection = None;
        self.store.clear();
        self.nodes.clear();
        self.tree = tree;
        self.register(handles)?;
        Ok(effects)
    }

    pub fn snapshot(&self) -> ReadAloudSnapshot {
        let resolved = self.resolved_granularity();
        let boundary = self.speech.boundary();
        let spans = if self.speech.has_speech_been_triggered() {
            self.highlight_spans(resolved)
        } else {
            Vec::new()
        };
        let queue = self.speech.queue();
        let language = self.voices.language().to_string();
        ReadAloudSnapshot {
            state: self.speech.state(),
            pause_source: self.speech.pause_source(),
            granularity: self.granularity,
            resolved_granularity: resolved,
            boundary_mode: boundary.mode,
            spans,
            links_suppressed: self.speech.links_suppressed(),
            unit_index: queue.current().map(|_| queue.cursor()),
            unit_count: queue.len(),
            voice: self.speech.voice().map(str::to_string),
            voice_pack_status: self.voices.install_status(&language),
            language,
            rate: self.speech.rate(),
            current_color: highlight::highlight_color(
                resolved,
                HighlightKind::Current,
                self.config.current_highlight,
                self.config.previous_highlight,
            ),
            previous_color: highlight::highlight_color(
                resolved,
                HighlightKind::Previous,
                self.config.current_highlight,
                self.config.previous_highlight,
            ),
        }
    }

    pub fn resolved_granularity(&self) -> HighlightGranularity {
        self.granularity
            .resolve(self.speech.rate(), &self.config.auto_thresholds())
    }

    fn register(&mut self, handles: &[ContentHandle]) -> Result<()> {
        for &handle in handles {
            let node = self.store.node_for(&self.tree, handle)?;
            self.nodes.push(node);
        }
        debug!(nodes = self.nodes.len(), "Registered read-aloud content");
        Ok(())
    }

    fn build_queue(&self) -> ReadingQueue {
        match ReadingQueue::build(&self.nodes, &self.store, &self.tree, &self.segmenter) {
            Ok(queue) => queue,
            Err(err) => {
                // Nodes come from this store, so this only trips on a caller
                // bug that already surfaced at registration.
                warn!("Failed to build reading queue: {err}");
                ReadingQueue::default()
            }
        }
    }

    fn play(&mut self) -> Vec<SpeechEffect> {
        if let Some(selection) = self.selection.take() {
            return self.play_from_selection(selection);
        }
        match self.speech.state() {
            PlaybackState::Idle | PlaybackState::Finished => {
                let queue = self.build_queue();
                self.speech.start(queue, &self.segmenter)
            }
            PlaybackState::Paused => self.speech.play(&self.segmenter),
            PlaybackState::Playing => Vec::new(),
        }
    }

    fn play_from_selection(&mut self, selection: Selection) -> Vec<SpeechEffect> {
        let queue = self.build_queue();
        let start = self
            .store
            .find(selection.handle)
            .and_then(|node| queue.locate(node, selection.offset));
        let (unit, offset) = start.unwrap_or_else(|| {
            debug!(handle = %selection.handle, "Selection is outside the reading queue");
            (0, 0)
        });
        info!(unit, offset, "Playing from selection");
        self.speech.start_at(queue, unit, offset, &self.segmenter)
    }

    fn set_language(&mut self, locale: &str) -> Vec<SpeechEffect> {
        self.segmenter.update_language(locale);
        self.config.locale = locale.to_string();
        let switch = self.voices.set_language(locale);
        self.speech.set_lang(self.voices.language());
        self.apply_voice_switch(switch)
    }

    fn apply_voice_switch(&mut self, switch: Option<VoiceSwitch>) -> Vec<SpeechEffect> {
        match switch {
            Some(VoiceSwitch {
                voice,
                same_language,
            }) => self
                .speech
                .on_voice_changed(Some(voice.name), same_language, &self.segmenter),
            None => Vec::new(),
        }
    }

    fn highlight_spans(&self, resolved: HighlightGranularity) -> Vec<HighlightSpanView> {
        let highlights = highlight::resolve_highlights(
            self.speech.queue(),
            resolved,
            &self.speech.boundary(),
            &self.segmenter,
        );
        highlights
            .spans()
            .into_iter()
            .filter_map(|span| {
                let segment = Segment::new(span.node, span.start, span.length);
                let text = self.store.segment_text(&segment)?;
                let handle = self.store.handle(span.node).ok()?;
                Some(HighlightSpanView {
                    node: handle.0,
                    start: span.start,
                    length: span.length,
                    kind: span.kind,
                    text: text.to_string(),
                })
            })
            .collect()
    }
}
