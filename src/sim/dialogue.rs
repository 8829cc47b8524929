//! Typewriter dialogue
//!
//! Idle -> Typing -> AwaitingAdvance -> (Typing ...) -> Idle. Characters are
//! revealed one per `char_ms` of logical time. An advance while typing
//! completes the line instead of moving on; an advance while waiting moves to
//! the next line or closes the dialogue.

use serde::{Deserialize, Serialize};

use crate::level::DialogueTiming;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueStyle {
    #[default]
    Normal,
    /// Red text for the threatening voice
    Threat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    #[default]
    Idle,
    Typing,
    AwaitingAdvance,
}

/// Result of an advance signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// No dialogue open
    Ignored,
    /// The current line was completed at once
    Skipped,
    /// Moved on to the next line
    NextLine,
    /// Last line dismissed; the dialogue closed
    Finished,
}

/// What the renderer needs to draw the dialogue box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DialogueView<'a> {
    pub text: &'a str,
    /// "click to continue" hint
    pub hint_visible: bool,
    pub style: DialogueStyle,
}

#[derive(Debug, Clone, Default)]
pub struct DialogueMachine {
    lines: Vec<String>,
    line: usize,
    /// Characters (not bytes) of the current line shown so far
    revealed: usize,
    line_chars: usize,
    state: DialogueState,
    style: DialogueStyle,
    until_next_ms: f32,
    char_ms: f32,
    line_delay_ms: f32,
    session_id: u64,
}

impl DialogueMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a dialogue over `lines`; returns its session id
    pub fn start(
        &mut self,
        lines: Vec<String>,
        style: DialogueStyle,
        timing: DialogueTiming,
    ) -> u64 {
        self.session_id += 1;
        self.lines = lines;
        self.line = 0;
        self.style = style;
        self.char_ms = timing.char_ms.max(1) as f32;
        self.line_delay_ms = timing.line_delay_ms as f32;
        if self.lines.is_empty() {
            self.close();
        } else {
            self.begin_line(0.0);
        }
        self.session_id
    }

    fn begin_line(&mut self, delay_ms: f32) {
        self.revealed = 0;
        self.line_chars = self.lines[self.line].chars().count();
        self.state = DialogueState::Typing;
        self.until_next_ms = delay_ms;
        log::debug!("Dialogue line {}/{}", self.line + 1, self.lines.len());
        self.update(0.0);
    }

    fn close(&mut self) {
        self.lines.clear();
        self.line = 0;
        self.revealed = 0;
        self.line_chars = 0;
        self.state = DialogueState::Idle;
    }

    /// Advance the per-character timer
    pub fn update(&mut self, dt_ms: f32) {
        if self.state != DialogueState::Typing {
            return;
        }
        self.until_next_ms -= dt_ms;
        while self.until_next_ms <= 0.0 && self.revealed < self.line_chars {
            self.revealed += 1;
            self.until_next_ms += self.char_ms;
        }
        if self.revealed >= self.line_chars {
            self.state = DialogueState::AwaitingAdvance;
        }
    }

    /// Handle the external advance signal
    pub fn advance(&mut self) -> Advance {
        match self.state {
            DialogueState::Idle => Advance::Ignored,
            DialogueState::Typing => {
                // Cancels the pending reveal timer
                self.revealed = self.line_chars;
                self.state = DialogueState::AwaitingAdvance;
                Advance::Skipped
            }
            DialogueState::AwaitingAdvance => {
                self.line += 1;
                if self.line < self.lines.len() {
                    self.begin_line(self.line_delay_ms);
                    Advance::NextLine
                } else {
                    self.close();
                    Advance::Finished
                }
            }
        }
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != DialogueState::Idle
    }

    /// Whether dialogue `session_id` is still open
    pub fn is_running(&self, session_id: u64) -> bool {
        self.is_active() && self.session_id == session_id
    }

    pub fn line_index(&self) -> usize {
        self.line
    }

    pub fn style(&self) -> DialogueStyle {
        self.style
    }

    /// Text revealed so far on the current line
    pub fn visible_text(&self) -> &str {
        let Some(line) = self.lines.get(self.line) else {
            return "";
        };
        let end = line
            .char_indices()
            .nth(self.revealed)
            .map_or(line.len(), |(i, _)| i);
        &line[..end]
    }

    pub fn view(&self) -> Option<DialogueView<'_>> {
        if !self.is_active() {
            return None;
        }
        Some(DialogueView {
            text: self.visible_text(),
            hint_visible: self.state == DialogueState::AwaitingAdvance,
            style: self.style,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn timing() -> DialogueTiming {
        DialogueTiming {
            char_ms: 50,
            line_delay_ms: 0,
        }
    }

    #[test]
    fn test_typewriter_reveals_one_char_per_tick() {
        let mut d = DialogueMachine::new();
        d.start(lines(&["Hello"]), DialogueStyle::Normal, timing());
        // First character appears immediately
        assert_eq!(d.visible_text(), "H");
        d.update(49.0);
        assert_eq!(d.visible_text(), "H");
        d.update(1.0);
        assert_eq!(d.visible_text(), "He");
        d.update(150.0);
        assert_eq!(d.visible_text(), "Hello");
        assert_eq!(d.state(), DialogueState::AwaitingAdvance);
    }

    #[test]
    fn test_skip_reveals_full_line_without_advancing() {
        let mut d = DialogueMachine::new();
        d.start(lines(&["First line", "Second"]), DialogueStyle::Normal, timing());
        d.update(100.0);
        assert_eq!(d.advance(), Advance::Skipped);
        assert_eq!(d.visible_text(), "First line");
        assert_eq!(d.line_index(), 0);
        assert_eq!(d.state(), DialogueState::AwaitingAdvance);

        // Timer no longer reveals anything past the line
        d.update(1000.0);
        assert_eq!(d.visible_text(), "First line");

        assert_eq!(d.advance(), Advance::NextLine);
        assert_eq!(d.line_index(), 1);
        assert_eq!(d.visible_text(), "S");
    }

    #[test]
    fn test_multibyte_text_is_revealed_by_character() {
        let mut d = DialogueMachine::new();
        d.start(lines(&["Mãe?"]), DialogueStyle::Normal, timing());
        d.update(50.0);
        assert_eq!(d.visible_text(), "Mã");
        d.advance();
        assert_eq!(d.visible_text(), "Mãe?");
    }

    #[test]
    fn test_finish_closes_session() {
        let mut d = DialogueMachine::new();
        let id = d.start(lines(&["...", "Hm."]), DialogueStyle::Threat, timing());
        assert!(d.is_running(id));
        assert_eq!(d.view().map(|v| v.style), Some(DialogueStyle::Threat));
        d.advance(); // skip
        d.advance(); // next line
        d.advance(); // skip
        assert_eq!(d.advance(), Advance::Finished);
        assert!(!d.is_running(id));
        assert!(d.view().is_none());
        assert_eq!(d.advance(), Advance::Ignored);
    }

    #[test]
    fn test_line_delay_before_next_line() {
        let mut d = DialogueMachine::new();
        d.start(
            lines(&["a", "bc"]),
            DialogueStyle::Normal,
            DialogueTiming {
                char_ms: 50,
                line_delay_ms: 200,
            },
        );
        assert_eq!(d.state(), DialogueState::AwaitingAdvance);
        d.advance();
        assert_eq!(d.visible_text(), "");
        assert_eq!(d.view().map(|v| v.hint_visible), Some(false));
        d.update(199.0);
        assert_eq!(d.visible_text(), "");
        d.update(1.0);
        assert_eq!(d.visible_text(), "b");
    }

    #[test]
    fn test_new_session_gets_new_id() {
        let mut d = DialogueMachine::new();
        let a = d.start(lines(&["x"]), DialogueStyle::Normal, timing());
        d.advance();
        let b = d.start(lines(&["y"]), DialogueStyle::Normal, timing());
        assert_ne!(a, b);
        assert!(!d.is_running(a));
        assert!(d.is_running(b));
    }
}
