use genchat_core::{ChatSession, Exchange, Persona, SubmitOutcome};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tracing::{debug, warn};

use crate::config::Config;
use crate::theme::Theme;

/// Frames of the loading spinner.
pub const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub session: ChatSession,
    pub endpoint: String,
    pub theme: Theme,
    /// Whether theme changes are written back to the config file.
    pub persist_theme: bool,

    // Draft cursor, in characters
    pub cursor: usize,

    // Transcript view
    pub chat_scroll: u16,
    pub chat_height: u16, // Inner height of the transcript pane
    pub chat_width: u16,  // Inner width, for wrap calculations
    pub chat_lines: u16,  // Wrapped line count of the last render
    pub chat_area: Option<Rect>,
    seen_revision: Option<u64>,

    pub animation_frame: usize,

    pub show_persona_picker: bool,
    pub persona_picker_state: ListState,
}

impl App {
    pub fn new(session: ChatSession, theme: Theme, endpoint: String) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            session,
            endpoint,
            theme,
            persist_theme: true,

            cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_lines: 0,
            chat_area: None,
            seen_revision: None,

            animation_frame: 0,

            show_persona_picker: false,
            persona_picker_state: ListState::default(),
        }
    }

    pub fn draft(&self) -> &str {
        self.session.draft()
    }

    // Draft editing. Every edit goes through the session so it owns the text.
    pub fn insert_char(&mut self, c: char) {
        let mut draft = self.session.draft().to_string();
        let byte_pos = char_to_byte_index(&draft, self.cursor);
        draft.insert(byte_pos, c);
        self.session.set_draft(draft);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, text: &str) {
        // Single-line input: pasted newlines become spaces
        let text: String = text
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        let mut draft = self.session.draft().to_string();
        let byte_pos = char_to_byte_index(&draft, self.cursor);
        draft.insert_str(byte_pos, &text);
        self.session.set_draft(draft);
        self.cursor += text.chars().count();
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let mut draft = self.session.draft().to_string();
            let byte_pos = char_to_byte_index(&draft, self.cursor);
            draft.remove(byte_pos);
            self.session.set_draft(draft);
        }
    }

    pub fn delete(&mut self) {
        let char_count = self.session.draft().chars().count();
        if self.cursor < char_count {
            let mut draft = self.session.draft().to_string();
            let byte_pos = char_to_byte_index(&draft, self.cursor);
            draft.remove(byte_pos);
            self.session.set_draft(draft);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.session.draft().chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.session.draft().chars().count();
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        let outcome = self.session.submit();
        if outcome == SubmitOutcome::Dispatched {
            self.cursor = 0;
        }
        outcome
    }

    pub fn on_settled(&mut self, exchange: &Exchange) {
        debug!(
            transcript_len = self.session.transcript().len(),
            question_chars = exchange.question.chars().count(),
            "exchange appended"
        );
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % SPINNER.len();
        }
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER[self.animation_frame % SPINNER.len()]
    }

    // Transcript scrolling
    fn max_scroll(&self) -> u16 {
        self.chat_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.chat_height / 2).max(1));
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.chat_height / 2).max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
    }

    /// Called by the renderer with the freshly measured transcript size.
    ///
    /// Jumps to the bottom whenever the session revision moved since the last
    /// frame, otherwise only clamps the manual scroll position.
    pub fn sync_chat_view(&mut self, total_lines: u16, height: u16, width: u16) {
        self.chat_lines = total_lines;
        self.chat_height = height;
        self.chat_width = width;

        let revision = self.session.revision();
        if self.seen_revision != Some(revision) {
            self.seen_revision = Some(revision);
            self.scroll_to_bottom();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_scroll());
        }
    }

    // Persona picker
    pub fn open_persona_picker(&mut self) {
        self.persona_picker_state
            .select(Some(self.session.persona().index()));
        self.show_persona_picker = true;
    }

    pub fn close_persona_picker(&mut self) {
        self.show_persona_picker = false;
    }

    pub fn persona_picker_nav_down(&mut self) {
        let len = Persona::ALL.len();
        let i = self.persona_picker_state.selected().unwrap_or(0);
        self.persona_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn persona_picker_nav_up(&mut self) {
        let i = self.persona_picker_state.selected().unwrap_or(0);
        self.persona_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn confirm_persona(&mut self) {
        if let Some(persona) = self
            .persona_picker_state
            .selected()
            .and_then(|i| Persona::ALL.get(i))
        {
            self.session.select_persona(*persona);
        }
        self.show_persona_picker = false;
    }

    pub fn cycle_persona(&mut self) {
        let next = (self.session.persona().index() + 1) % Persona::ALL.len();
        self.session.select_persona(Persona::ALL[next]);
    }

    pub fn cycle_theme(&mut self) {
        self.theme = self.theme.next();
        if self.persist_theme {
            if let Err(e) = Config::save_theme(self.theme) {
                warn!(error = %e, "could not save theme");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use genchat_core::{GenerationService, RequestFailure};
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl GenerationService for Echo {
        async fn generate(&self, question: &str, _: Persona) -> Result<String, RequestFailure> {
            Ok(format!("echo: {}", question))
        }
    }

    fn app() -> App {
        let mut app = App::new(
            ChatSession::new(Arc::new(Echo)),
            Theme::Dark,
            "http://test".to_string(),
        );
        app.persist_theme = false;
        app
    }

    #[test]
    fn editing_handles_multibyte_text() {
        let mut app = app();
        for c in "héllo".chars() {
            app.insert_char(c);
        }
        app.cursor_left();
        app.cursor_left();
        app.backspace();
        assert_eq!(app.draft(), "hélo");
        app.cursor_home();
        app.delete();
        assert_eq!(app.draft(), "élo");
        app.cursor_end();
        assert_eq!(app.cursor, 3);
    }

    #[test]
    fn paste_flattens_newlines() {
        let mut app = app();
        app.insert_str("two\nlines");
        assert_eq!(app.draft(), "two lines");
        assert_eq!(app.cursor, 9);
    }

    #[tokio::test]
    async fn submit_resets_cursor_only_when_dispatched() {
        let mut app = app();
        app.insert_str("   ");
        assert_eq!(app.submit(), SubmitOutcome::EmptyDraft);
        assert_eq!(app.cursor, 3);

        app.insert_str("hi");
        assert_eq!(app.submit(), SubmitOutcome::Dispatched);
        assert_eq!(app.cursor, 0);
        assert_eq!(app.draft(), "");
    }

    #[tokio::test]
    async fn view_follows_new_activity_but_keeps_manual_scroll() {
        let mut app = app();
        app.sync_chat_view(50, 10, 40);
        assert_eq!(app.chat_scroll, 40);

        app.scroll_up(15);
        app.sync_chat_view(50, 10, 40);
        assert_eq!(app.chat_scroll, 25);

        app.insert_str("question");
        app.submit();
        app.sync_chat_view(54, 10, 40);
        assert_eq!(app.chat_scroll, 44);
    }

    #[test]
    fn scrolling_is_clamped() {
        let mut app = app();
        app.sync_chat_view(30, 10, 40);
        app.scroll_down(100);
        assert_eq!(app.chat_scroll, 20);
        app.scroll_to_top();
        app.scroll_up(5);
        assert_eq!(app.chat_scroll, 0);
    }

    #[test]
    fn picker_selects_persona() {
        let mut app = app();
        app.open_persona_picker();
        assert_eq!(app.persona_picker_state.selected(), Some(0));
        app.persona_picker_nav_down();
        app.persona_picker_nav_down();
        app.persona_picker_nav_down();
        app.confirm_persona();
        assert_eq!(app.session.persona(), Persona::Friend);
        assert!(!app.show_persona_picker);
    }

    #[test]
    fn theme_cycles() {
        let mut app = app();
        app.cycle_theme();
        assert_eq!(app.theme, Theme::Green);
    }
}
