// Labelled text-entry widget. Editing itself is delegated to `tui_textarea`;
// this wrapper only owns the label, focus styling and value extraction.

use crossterm::event::KeyEvent;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders};
use tui_textarea::TextArea;

pub struct Field {
    label: &'static str,
    placeholder: &'static str,
    masked: bool,
    focused: bool,
    area: TextArea<'static>,
}

impl Field {
    pub fn new(label: &'static str, placeholder: &'static str) -> Self {
        let mut field = Field {
            label,
            placeholder,
            masked: false,
            focused: false,
            area: TextArea::default(),
        };
        field.rebuild();
        field
    }

    /// Show bullets instead of the typed characters.
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self.area.set_mask_char('•');
        self
    }

    pub fn value(&self) -> String {
        self.area.lines().join("\n")
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.restyle();
    }

    pub fn clear(&mut self) {
        self.rebuild();
    }

    /// Forward a key for default editing. Returns whether the text changed.
    pub fn input(&mut self, key: KeyEvent) -> bool {
        self.area.input(key)
    }

    pub fn widget(&self) -> &TextArea<'static> {
        &self.area
    }

    fn rebuild(&mut self) {
        let mut area = TextArea::default();
        area.set_placeholder_text(self.placeholder);
        if self.masked {
            area.set_mask_char('•');
        }
        self.area = area;
        self.restyle();
    }

    fn restyle(&mut self) {
        let border = if self.focused {
            Style::default().fg(Color::Magenta)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        self.area.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(self.label),
        );
        self.area.set_cursor_line_style(Style::default());
        let cursor = if self.focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        self.area.set_cursor_style(cursor);
    }
}
