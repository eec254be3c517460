//! Speech capabilities - recognition and synthesis engines behind traits
//!
//! The engines themselves are external programs. `ProcessRecognizer` and
//! `ProcessSynthesizer` adapt any command-line STT/TTS tool, e.g.
//! `espeak-ng -v es` for output or a whisper wrapper script for input.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::ProgramConfig;
use crate::error::SpeechError;

/// One text-to-speech playback request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub locale: String,
}

impl Utterance {
    pub fn new(text: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            locale: locale.into(),
        }
    }
}

/// Fire-and-forget speech output. No completion tracking, no cancellation.
pub trait Synthesizer: Send + Sync {
    fn speak(&self, utterance: Utterance);
}

/// Outcome of one recognition session that ended without an engine error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognition {
    /// First alternative of the first result, if the engine heard anything
    pub transcript: Option<String>,
}

impl Recognition {
    pub fn heard(text: impl Into<String>) -> Self {
        Self {
            transcript: Some(text.into()),
        }
    }

    pub fn silence() -> Self {
        Self { transcript: None }
    }
}

/// Single-shot speech-to-text
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, locale: &str) -> Result<Recognition, SpeechError>;
}

// ============================================================================
// Synthesizers
// ============================================================================

/// Used when no synthesizer program is configured
pub struct SilentSynthesizer;

impl Synthesizer for SilentSynthesizer {
    fn speak(&self, utterance: Utterance) {
        tracing::debug!(locale = %utterance.locale, "no synthesizer configured, not speaking");
    }
}

/// Runs the configured program with the text as its last argument
pub struct ProcessSynthesizer {
    program: ProgramConfig,
}

impl ProcessSynthesizer {
    pub fn new(program: ProgramConfig) -> Self {
        Self { program }
    }
}

impl Synthesizer for ProcessSynthesizer {
    fn speak(&self, utterance: Utterance) {
        if utterance.text.is_empty() {
            return;
        }

        let spawned = Command::new(&self.program.program)
            .args(self.program.args_for(&utterance.locale))
            .arg(&utterance.text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                let program = self.program.program.clone();
                // Reap in the background; nobody waits on speech
                tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) if !status.success() => {
                            tracing::warn!(%program, %status, "synthesizer exited with failure");
                        }
                        Err(e) => tracing::warn!(%program, "synthesizer wait failed: {}", e),
                        Ok(_) => {}
                    }
                });
            }
            Err(e) => {
                tracing::warn!(program = %self.program.program, "failed to start synthesizer: {}", e);
            }
        }
    }
}

// ============================================================================
// Recognizers
// ============================================================================

/// Used when no recognizer program is configured
pub struct UnavailableRecognizer;

#[async_trait]
impl Recognizer for UnavailableRecognizer {
    async fn recognize(&self, _locale: &str) -> Result<Recognition, SpeechError> {
        Err(SpeechError::Unavailable(
            "no recognizer configured".to_string(),
        ))
    }
}

/// Runs the configured program once; its first non-empty stdout line is the transcript
pub struct ProcessRecognizer {
    program: ProgramConfig,
}

impl ProcessRecognizer {
    pub fn new(program: ProgramConfig) -> Self {
        Self { program }
    }
}

#[async_trait]
impl Recognizer for ProcessRecognizer {
    async fn recognize(&self, locale: &str) -> Result<Recognition, SpeechError> {
        let child = Command::new(&self.program.program)
            .args(self.program.args_for(locale))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SpeechError::Unavailable(format!("{}: {}", self.program.program, e)))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SpeechError::Engine(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| output.status.to_string());
            return Err(SpeechError::Engine(reason));
        }

        Ok(parse_transcript(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn parse_transcript(stdout: &str) -> Recognition {
    match stdout.lines().map(str::trim).find(|l| !l.is_empty()) {
        Some(line) => Recognition::heard(line),
        None => Recognition::silence(),
    }
}
