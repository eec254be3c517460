//! In-memory collaborators for unit tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::client::{CommandClient, Reply};
use crate::command::{Command, Modality};
use crate::error::{DispatchError, SpeechError};
use crate::speech::{Recognition, Recognizer, Synthesizer, Utterance};
use crate::view::{ResponseStyle, ResponseView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Clear,
    Response(String, ResponseStyle),
    Alert(String),
    Loading(Modality, bool),
}

#[derive(Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn is_loading(&self, modality: Modality) -> bool {
        self.events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|e| match e {
                ViewEvent::Loading(m, on) if *m == modality => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn hide_count(&self, modality: Modality) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| **e == ViewEvent::Loading(modality, false))
            .count()
    }

    pub fn last_response(&self) -> Option<(String, ResponseStyle)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|e| match e {
                ViewEvent::Response(text, style) => Some((text.clone(), *style)),
                _ => None,
            })
    }

    pub fn alerts(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Alert(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ViewEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ResponseView for RecordingView {
    fn clear_response(&self) {
        self.push(ViewEvent::Clear);
    }

    fn show_response(&self, text: &str, style: ResponseStyle) {
        self.push(ViewEvent::Response(text.to_string(), style));
    }

    fn alert(&self, message: &str) {
        self.push(ViewEvent::Alert(message.to_string()));
    }

    fn set_loading(&self, modality: Modality, loading: bool) {
        self.push(ViewEvent::Loading(modality, loading));
    }
}

#[derive(Default)]
pub struct RecordingSynth {
    spoken: Mutex<Vec<Utterance>>,
}

impl RecordingSynth {
    pub fn spoken(&self) -> Vec<Utterance> {
        self.spoken.lock().unwrap().clone()
    }
}

impl Synthesizer for RecordingSynth {
    fn speak(&self, utterance: Utterance) {
        self.spoken.lock().unwrap().push(utterance);
    }
}

pub enum Step {
    Answer(&'static str),
    Fail(DispatchError),
    Hang,
}

/// Plays back one step per request and records what was sent
#[derive(Default)]
pub struct ScriptedClient {
    steps: Mutex<VecDeque<Step>>,
    sent: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandClient for ScriptedClient {
    async fn send(&self, command: &Command) -> Result<Reply, DispatchError> {
        self.sent.lock().unwrap().push(command.as_str().to_string());
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected request");
        match step {
            Step::Answer(body) => Reply::from_slice(body.as_bytes()),
            Step::Fail(e) => Err(e),
            Step::Hang => std::future::pending().await,
        }
    }
}

pub enum Listen {
    Hear(Result<Recognition, SpeechError>),
    Hang,
}

/// Plays back one recognition per session and records the locales asked for
pub struct ScriptedRecognizer {
    sessions: Mutex<VecDeque<Listen>>,
    pub locales: Mutex<Vec<String>>,
}

impl ScriptedRecognizer {
    pub fn new(sessions: impl IntoIterator<Item = Listen>) -> Self {
        Self {
            sessions: Mutex::new(sessions.into_iter().collect()),
            locales: Mutex::new(Vec::new()),
        }
    }

    pub fn started(&self) -> usize {
        self.locales.lock().unwrap().len()
    }
}

#[async_trait]
impl Recognizer for ScriptedRecognizer {
    async fn recognize(&self, locale: &str) -> Result<Recognition, SpeechError> {
        self.locales.lock().unwrap().push(locale.to_string());
        let session = self
            .sessions
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected recognition session");
        match session {
            Listen::Hear(result) => result,
            Listen::Hang => std::future::pending().await,
        }
    }
}
