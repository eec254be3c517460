//! Prompt input handling - typed lines and slash commands

pub const HELP: &str = "\
Escribe un comando y presiona Enter.
  /voz    - Dictar un comando por voz (alias: /voice)
  /ayuda  - Mostrar esta ayuda (alias: /help)
  /salir  - Salir (alias: /quit, /exit)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptInput {
    /// Text to send as a command (may still be blank)
    Submit(String),
    Dictate,
    Help,
    Quit,
    Unknown(String),
}

impl PromptInput {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();

        let Some(cmd) = trimmed.strip_prefix('/') else {
            return PromptInput::Submit(trimmed.to_string());
        };

        match cmd.to_lowercase().as_str() {
            "voz" | "voice" => PromptInput::Dictate,
            "ayuda" | "help" | "?" => PromptInput::Help,
            "salir" | "quit" | "exit" => PromptInput::Quit,
            _ => PromptInput::Unknown(trimmed.to_string()),
        }
    }
}
