//! Command dispatcher - sends one command, routes the outcome to the view and the synthesizer
//!
//! A dispatch is one linear async flow:
//! 1. Reject if another dispatch is in flight (alert only)
//! 2. Clear the response region, show the modality's loading indicator
//! 3. POST the command, bounded by the optional deadline
//! 4. Show the reply and speak it, or show the failure in error style
//! 5. Hide the indicator (guard drop, runs on every exit path)

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::client::{CommandClient, Reply};
use crate::command::{Command, Modality};
use crate::error::{BUSY_MSG, DispatchError};
use crate::speech::{Synthesizer, Utterance};
use crate::view::{LoadingGuard, ResponseStyle, ResponseView};

/// How a submission ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Reply shown and handed to the synthesizer
    Answered(Reply),
    /// Failure message shown
    Failed(DispatchError),
    /// Rejected because another dispatch was in flight
    Busy,
    /// Empty input, nothing happened
    Ignored,
}

impl DispatchOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, DispatchOutcome::Answered(_))
    }
}

/// Releases a single-in-flight slot on drop
pub(crate) struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct CommandDispatcher {
    client: Arc<dyn CommandClient>,
    view: Arc<dyn ResponseView>,
    synthesizer: Arc<dyn Synthesizer>,
    locale: String,
    timeout: Option<Duration>,
    in_flight: AtomicBool,
}

impl CommandDispatcher {
    pub fn new(
        client: Arc<dyn CommandClient>,
        view: Arc<dyn ResponseView>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            client,
            view,
            synthesizer,
            locale: "es-ES".to_string(),
            timeout: Some(Duration::from_secs(40)),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// `None` waits for the endpoint indefinitely
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Submit raw input. Blank input is dropped without touching the view.
    pub async fn submit(&self, modality: Modality, input: &str) -> DispatchOutcome {
        match Command::parse(input) {
            Some(command) => self.dispatch(modality, command).await,
            None => {
                tracing::trace!(%modality, "ignoring blank input");
                DispatchOutcome::Ignored
            }
        }
    }

    pub async fn dispatch(&self, modality: Modality, command: Command) -> DispatchOutcome {
        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            tracing::warn!(%modality, "command rejected, another one is in flight");
            self.view.alert(BUSY_MSG);
            return DispatchOutcome::Busy;
        };

        self.view.clear_response();
        let _loading = LoadingGuard::show(self.view.as_ref(), modality);

        let started = Instant::now();
        let result = self.exchange(&command).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(reply) => {
                tracing::info!(%modality, elapsed_ms, "command answered");
                self.view.show_response(&reply.text, ResponseStyle::Info);
                self.synthesizer
                    .speak(Utterance::new(reply.text.clone(), self.locale.clone()));
                DispatchOutcome::Answered(reply)
            }
            Err(e) => {
                if e.is_timeout() {
                    tracing::warn!(%modality, elapsed_ms, "command timed out");
                } else {
                    tracing::warn!(%modality, elapsed_ms, "command failed: {}", e);
                }
                self.view.show_response(&e.user_message(), ResponseStyle::Error);
                DispatchOutcome::Failed(e)
            }
        }
    }

    async fn exchange(&self, command: &Command) -> Result<Reply, DispatchError> {
        match self.timeout {
            // Dropping the send future on expiry cancels the request
            Some(limit) => tokio::time::timeout(limit, self.client.send(command))
                .await
                .map_err(|_| DispatchError::Timeout(limit))?,
            None => self.client.send(command).await,
        }
    }
}
