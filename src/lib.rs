//! Terminal client for the Duki voice assistant.
//!
//! Commands are typed at a prompt or dictated through a speech recognizer,
//! posted to the assistant's command endpoint, and the answer is printed and
//! spoken. [`CommandDispatcher`] owns that lifecycle; everything it talks to
//! is injected behind a trait so tests can swap in fakes.

pub mod client;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod prompt;
pub mod render;
pub mod speech;
pub mod view;
pub mod voice;

#[cfg(test)]
mod fakes;

pub use client::{CommandClient, HttpCommandClient, Reply};
pub use command::{Command, Modality};
pub use config::Config;
pub use dispatcher::{CommandDispatcher, DispatchOutcome};
pub use error::{DispatchError, SpeechError};
pub use view::{ResponseStyle, ResponseView};
pub use voice::{DictationOutcome, VoiceSession};
