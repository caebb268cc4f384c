use serde::Serialize;

/// One request handed to the speech provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    pub voice: Option<String>,
    pub lang: String,
    pub rate: f32,
}

/// Work the controller asks the provider to do.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEffect {
    Speak(Utterance),
    Cancel,
    Pause,
    Resume,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpeechEventKind {
    Start,
    End,
    /// `index` and `length` are byte offsets into the utterance text.
    Boundary {
        index: usize,
        length: Option<usize>,
    },
    Error {
        message: String,
    },
}

/// A provider callback, tagged with the utterance it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeechEvent {
    pub utterance_id: u64,
    #[serde(flatten)]
    pub kind: SpeechEventKind,
}

impl SpeechEvent {
    pub fn new(utterance_id: u64, kind: SpeechEventKind) -> Self {
        Self { utterance_id, kind }
    }
}

/// Edge to the platform speech engine.
pub trait SpeechSynthesizer {
    fn speak(&mut self, utterance: &Utterance);
    fn cancel(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);

    fn apply(&mut self, effects: &[SpeechEffect]) {
        for effect in effects {
            match effect {
                SpeechEffect::Speak(utterance) => self.speak(utterance),
                SpeechEffect::Cancel => self.cancel(),
                SpeechEffect::Pause => self.pause(),
                SpeechEffect::Resume => self.resume(),
            }
        }
    }
}
