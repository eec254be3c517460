use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, ClearType};
use crossterm::{cursor, queue};
use std::io::{self, Write};

use crate::command::Modality;
use crate::view::{ResponseStyle, ResponseView};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    ClearResponse,
    Response(String, ResponseStyle),
    Alert(String),
    Loading(Modality, bool),
    Notice(String),
    Tick,
}

/// Cloneable handle; the dispatcher and the prompt loop both write through it
#[derive(Clone)]
pub struct Ui {
    tx: flume::Sender<UiEvent>,
}

impl Ui {
    pub fn new() -> (Self, flume::Receiver<UiEvent>) {
        let (tx, rx) = flume::unbounded();
        (Self { tx }, rx)
    }

    pub fn notice(&self, text: impl Into<String>) {
        let _ = self.tx.send(UiEvent::Notice(text.into()));
    }
}

impl ResponseView for Ui {
    fn clear_response(&self) {
        let _ = self.tx.send(UiEvent::ClearResponse);
    }

    fn show_response(&self, text: &str, style: ResponseStyle) {
        let _ = self.tx.send(UiEvent::Response(text.to_string(), style));
    }

    fn alert(&self, message: &str) {
        let _ = self.tx.send(UiEvent::Alert(message.to_string()));
    }

    fn set_loading(&self, modality: Modality, loading: bool) {
        let _ = self.tx.send(UiEvent::Loading(modality, loading));
    }
}

pub struct Renderer<W: Write> {
    out: W,
    text_loading: bool,
    voice_loading: bool,
    frame: usize,
}

impl Renderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            text_loading: false,
            voice_loading: false,
            frame: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.text_loading || self.voice_loading
    }

    pub fn handle(&mut self, event: UiEvent) -> io::Result<()> {
        match event {
            UiEvent::ClearResponse => {
                self.clear_line()?;
            }
            UiEvent::Response(text, ResponseStyle::Info) => {
                self.print_line(Color::Cyan, &text)?;
            }
            UiEvent::Response(text, ResponseStyle::Error) => {
                self.print_line(Color::Red, &format!("✖ {}", text))?;
            }
            UiEvent::Alert(message) => {
                self.print_line(Color::Yellow, &format!("⚠ {}", message))?;
            }
            UiEvent::Notice(text) => {
                self.print_line(Color::DarkGrey, &text)?;
            }
            UiEvent::Loading(modality, on) => {
                match modality {
                    Modality::Text => self.text_loading = on,
                    Modality::Voice => self.voice_loading = on,
                }
                if self.is_loading() {
                    self.render_spinner()?;
                } else {
                    self.clear_line()?;
                }
            }
            UiEvent::Tick => {
                if !self.is_loading() {
                    return Ok(());
                }
                self.frame += 1;
                self.render_spinner()?;
            }
        }
        self.out.flush()
    }

    fn clear_line(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine)
        )
    }

    fn print_line(&mut self, color: Color, text: &str) -> io::Result<()> {
        self.clear_line()?;
        queue!(
            self.out,
            SetForegroundColor(color),
            Print(text),
            ResetColor,
            Print("\r\n")
        )?;
        // Keep the spinner visible below the message while still loading
        if self.is_loading() {
            self.render_spinner()?;
        }
        Ok(())
    }

    fn render_spinner(&mut self) -> io::Result<()> {
        let spinner = SPINNER[self.frame % SPINNER.len()];
        let label = if self.voice_loading && !self.text_loading {
            "Escuchando..."
        } else {
            "Procesando..."
        };
        self.clear_line()?;
        queue!(
            self.out,
            SetForegroundColor(Color::Yellow),
            Print(format!("{} {}", spinner, label)),
            ResetColor
        )
    }
}
