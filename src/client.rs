//! Command endpoint client - one POST per command, JSON in and out

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::Command;
use crate::config::EndpointConfig;
use crate::error::DispatchError;

/// Shown when the endpoint answers without a usable `respuesta`
pub const NO_RESPONSE_MSG: &str = "No se obtuvo respuesta.";

#[derive(Serialize)]
struct CommandRequest<'a> {
    texto: &'a str,
}

/// Diagnostics the server may attach next to the answer
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ReplyMeta {
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub hf_enabled: Option<bool>,
    #[serde(default)]
    pub elapsed_ms: Option<u64>,
}

/// Answer extracted from a command response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub meta: Option<ReplyMeta>,
}

impl Reply {
    /// Pull `respuesta` out of a decoded body. Only a JSON `null` body is
    /// rejected; any other shape without a usable field gets the fallback.
    pub fn from_value(value: &Value) -> Result<Self, DispatchError> {
        if value.is_null() {
            return Err(DispatchError::Malformed("null body".into()));
        }

        let text = value
            .get("respuesta")
            .and_then(answer_text)
            .unwrap_or_else(|| NO_RESPONSE_MSG.to_string());

        let meta = value
            .get("meta")
            .and_then(|m| serde_json::from_value::<ReplyMeta>(m.clone()).ok());

        Ok(Self { text, meta })
    }

    pub fn from_slice(body: &[u8]) -> Result<Self, DispatchError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| DispatchError::Malformed(e.to_string()))?;
        Self::from_value(&value)
    }
}

/// Non-empty strings, non-zero numbers and `true` are shown; anything else
/// (empty, zero, false, null, arrays, objects) is treated as no answer
fn answer_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// `GET /health` report
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct HealthReport {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub hf_enabled: Option<bool>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Anything that can turn a command into a reply
#[async_trait]
pub trait CommandClient: Send + Sync {
    async fn send(&self, command: &Command) -> Result<Reply, DispatchError>;
}

pub struct HttpCommandClient {
    client: Client,
    command_url: String,
    health_url: String,
}

impl HttpCommandClient {
    pub fn new(endpoint: &EndpointConfig) -> Self {
        Self {
            client: Client::new(),
            command_url: endpoint.command_url(),
            health_url: endpoint.health_url(),
        }
    }

    pub fn health_url(&self) -> &str {
        &self.health_url
    }

    /// Probe the server's health route. Does not touch the assistant backend.
    pub async fn health(&self) -> Result<HealthReport, DispatchError> {
        let response = self.client.get(&self.health_url).send().await?;

        if !response.status().is_success() {
            return Err(DispatchError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| DispatchError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl CommandClient for HttpCommandClient {
    async fn send(&self, command: &Command) -> Result<Reply, DispatchError> {
        tracing::debug!(url = %self.command_url, "POST command");

        let response = self
            .client
            .post(&self.command_url)
            .json(&CommandRequest {
                texto: command.as_str(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let reply = Reply::from_slice(&body)?;

        if let Some(meta) = &reply.meta {
            tracing::debug!(
                engine = meta.engine.as_deref().unwrap_or("-"),
                model = meta.model.as_deref().unwrap_or("-"),
                elapsed_ms = meta.elapsed_ms.unwrap_or_default(),
                "reply meta"
            );
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(CommandRequest { texto: "hola" }).unwrap();
        assert_eq!(body, json!({ "texto": "hola" }));
    }

    #[test]
    fn test_reply_reads_respuesta() {
        let reply = Reply::from_value(&json!({ "respuesta": "hola" })).unwrap();
        assert_eq!(reply.text, "hola");
        assert!(reply.meta.is_none());
    }

    #[test]
    fn test_reply_fallback_when_missing() {
        assert_eq!(Reply::from_value(&json!({})).unwrap().text, NO_RESPONSE_MSG);
        assert_eq!(
            Reply::from_value(&json!({ "respuesta": "" })).unwrap().text,
            NO_RESPONSE_MSG
        );
        assert_eq!(
            Reply::from_value(&json!({ "respuesta": null })).unwrap().text,
            NO_RESPONSE_MSG
        );
        assert_eq!(Reply::from_value(&json!([1, 2])).unwrap().text, NO_RESPONSE_MSG);
    }

    #[test]
    fn test_reply_scalar_respuesta() {
        assert_eq!(Reply::from_value(&json!({ "respuesta": 5 })).unwrap().text, "5");
        assert_eq!(Reply::from_value(&json!({ "respuesta": 2.5 })).unwrap().text, "2.5");
        assert_eq!(Reply::from_value(&json!({ "respuesta": true })).unwrap().text, "true");
        for falsy in [json!(0), json!(false), json!({ "a": 1 }), json!(["x"])] {
            assert_eq!(
                Reply::from_value(&json!({ "respuesta": falsy })).unwrap().text,
                NO_RESPONSE_MSG
            );
        }
    }

    #[test]
    fn test_reply_meta_is_lenient() {
        let reply = Reply::from_value(&json!({
            "respuesta": "La hora es 10:15",
            "meta": { "engine": "rules", "elapsed_ms": 3, "extra": true }
        }))
        .unwrap();
        let meta = reply.meta.unwrap();
        assert_eq!(meta.engine.as_deref(), Some("rules"));
        assert_eq!(meta.elapsed_ms, Some(3));
        assert_eq!(meta.model, None);

        let reply = Reply::from_value(&json!({ "respuesta": "x", "meta": "bogus" })).unwrap();
        assert!(reply.meta.is_none());
    }

    #[test]
    fn test_malformed_bodies() {
        assert!(matches!(
            Reply::from_slice(b"<html>502</html>"),
            Err(DispatchError::Malformed(_))
        ));
        assert!(matches!(Reply::from_slice(b"null"), Err(DispatchError::Malformed(_))));
        assert!(matches!(Reply::from_slice(b""), Err(DispatchError::Malformed(_))));
    }

    #[test]
    fn test_health_report_defaults() {
        let report: HealthReport = serde_json::from_value(json!({
            "ok": true,
            "model": "google/gemma-2-2b-it",
            "timeout": 12
        }))
        .unwrap();
        assert!(report.ok);
        assert_eq!(report.hf_enabled, None);
        assert_eq!(report.timeout, Some(12));
    }
}
