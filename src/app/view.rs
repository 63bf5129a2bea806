use ratatui::Frame;

use crate::app::{App, Model};

impl App {
    /// Render the full frame for the current model.
    pub(super) fn view(model: &mut Model, frame: &mut Frame) {
        crate::ui::render(model, frame);
    }
}
