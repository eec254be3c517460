//! Presentation seam - where dispatch results and indicators go

use crate::command::Modality;

/// Visual register of the response region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStyle {
    Info,
    Error,
}

/// The surface a dispatcher drives. Implementations own no logic.
pub trait ResponseView: Send + Sync {
    /// Hide the response region and reset it to the informational style
    fn clear_response(&self);

    /// Show text in the response region
    fn show_response(&self, text: &str, style: ResponseStyle);

    /// Blocking-style notification outside the response region
    fn alert(&self, message: &str);

    /// Toggle the loading indicator of one modality
    fn set_loading(&self, modality: Modality, loading: bool);
}

/// Clears a modality's indicator when dropped, so every exit path
/// (including a dropped future) hides it exactly once.
pub struct LoadingGuard<'a> {
    view: &'a dyn ResponseView,
    modality: Modality,
}

impl<'a> LoadingGuard<'a> {
    pub fn show(view: &'a dyn ResponseView, modality: Modality) -> Self {
        view.set_loading(modality, true);
        Self { view, modality }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.view.set_loading(self.modality, false);
    }
}
