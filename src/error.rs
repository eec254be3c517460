//! Error types for dispatching commands and driving the speech engines

use std::time::Duration;
use thiserror::Error;

/// Generic failure text shown in the response region
pub const GENERIC_FAILURE_MSG: &str = "Error al procesar el comando. Intenta otra vez más tarde.";

/// Alert raised when a dispatch is rejected because another is in flight
pub const BUSY_MSG: &str = "Ya hay un comando en curso. Espera la respuesta antes de enviar otro.";

/// Alert raised when the recognizer cannot be started
pub const RECOGNIZER_UNAVAILABLE_MSG: &str =
    "No se puede iniciar reconocimiento de voz. Verifica si el sistema tiene acceso al micrófono.";

/// Why a dispatch did not produce a reply
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Connection refused, reset, DNS failure and the like
    #[error("command endpoint unreachable: {0}")]
    Network(String),

    /// Endpoint answered with a non-success status; the body is not inspected
    #[error("command endpoint returned HTTP {0}")]
    Status(u16),

    /// Body was not a JSON object
    #[error("malformed response: {0}")]
    Malformed(String),

    /// No answer before the client-side deadline
    #[error("no response within {}s", seconds(.0))]
    Timeout(Duration),
}

impl DispatchError {
    /// Message suitable for the response region
    pub fn user_message(&self) -> String {
        match self {
            DispatchError::Network(_) | DispatchError::Status(_) | DispatchError::Malformed(_) => {
                GENERIC_FAILURE_MSG.to_string()
            }
            DispatchError::Timeout(limit) => format!(
                "El sistema está tardando demasiado en responder (timeout de {} segundos). Por favor intenta nuevamente.",
                seconds(limit)
            ),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchError::Timeout(_))
    }
}

/// Whole seconds print as-is, fractions keep their decimals ("0.3")
fn seconds(limit: &Duration) -> String {
    if limit.subsec_nanos() == 0 {
        limit.as_secs().to_string()
    } else {
        limit.as_secs_f64().to_string()
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            DispatchError::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            DispatchError::Status(status.as_u16())
        } else {
            DispatchError::Network(e.to_string())
        }
    }
}

/// Recognition failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    /// Engine could not be started (missing program, no microphone access)
    #[error("speech recognizer unavailable: {0}")]
    Unavailable(String),

    /// Engine started but reported an error during the session
    #[error("{0}")]
    Engine(String),
}

impl SpeechError {
    /// Alert text for the user
    pub fn user_message(&self) -> String {
        match self {
            SpeechError::Unavailable(_) => RECOGNIZER_UNAVAILABLE_MSG.to_string(),
            SpeechError::Engine(reason) => format!("Error al reconocer voz: {}", reason),
        }
    }
}

/// Configuration loading failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid endpoint url '{0}'")]
    InvalidUrl(String),
}
