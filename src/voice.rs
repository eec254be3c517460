//! Dictation - one recognition session feeding the dispatcher
//!
//! idle -> listening -> idle. The listening indicator is the voice
//! modality's loading indicator and is hidden as soon as the session ends,
//! whatever the outcome. A transcript is then dispatched exactly like typed
//! input on the voice modality.
//!
//! Only one dictation runs at a time, and none starts while a command is in
//! flight. A rejected dictation raises the busy alert and touches nothing else.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::command::{Command, Modality};
use crate::dispatcher::{CommandDispatcher, DispatchOutcome, InFlight};
use crate::error::{BUSY_MSG, SpeechError};
use crate::speech::Recognizer;
use crate::view::{LoadingGuard, ResponseView};

/// How a dictation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationOutcome {
    /// A transcript was heard and dispatched
    Dispatched {
        transcript: String,
        outcome: DispatchOutcome,
    },
    /// Session ended without a usable transcript
    NothingHeard,
    /// Recognizer could not start or failed mid-session
    Failed(SpeechError),
    /// Not started: another dictation or a command was in flight
    Busy,
}

pub struct VoiceSession {
    recognizer: Arc<dyn Recognizer>,
    dispatcher: Arc<CommandDispatcher>,
    view: Arc<dyn ResponseView>,
    locale: String,
    active: AtomicBool,
}

impl VoiceSession {
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        dispatcher: Arc<CommandDispatcher>,
        view: Arc<dyn ResponseView>,
    ) -> Self {
        Self {
            recognizer,
            dispatcher,
            view,
            locale: "es-ES".to_string(),
            active: AtomicBool::new(false),
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub async fn dictate(&self) -> DictationOutcome {
        let active = if self.dispatcher.is_busy() {
            None
        } else {
            InFlight::acquire(&self.active)
        };
        let Some(_active) = active else {
            tracing::warn!("dictation rejected, another one or a command is in flight");
            self.view.alert(BUSY_MSG);
            return DictationOutcome::Busy;
        };

        let recognition = {
            self.view.clear_response();
            let _listening = LoadingGuard::show(self.view.as_ref(), Modality::Voice);
            tracing::debug!(locale = %self.locale, "listening");
            self.recognizer.recognize(&self.locale).await
        };

        let transcript = match recognition {
            Ok(r) => r.transcript.as_deref().and_then(Command::parse),
            Err(e) => {
                tracing::warn!("recognition failed: {}", e);
                self.view.alert(&e.user_message());
                return DictationOutcome::Failed(e);
            }
        };

        match transcript {
            Some(command) => {
                tracing::info!(transcript = %command, "heard");
                let transcript = command.as_str().to_string();
                let outcome = self.dispatcher.dispatch(Modality::Voice, command).await;
                DictationOutcome::Dispatched {
                    transcript,
                    outcome,
                }
            }
            None => {
                tracing::debug!("recognition ended without a transcript");
                DictationOutcome::NothingHeard
            }
        }
    }
}
