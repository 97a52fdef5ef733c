use anyhow::Result;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::Print,
    terminal::{self, ClearType},
};
use std::io::{self, Write};

use crate::history::History;
use crate::readline::completer::HistoryCompleter;

/// Control flow for key event handling
enum ControlFlow {
    Continue,
    Submit,
    Cancel,
}

/// One Tab-driven completion cycle: the prefix captured when the cycle
/// started and the index of the candidate currently shown.
struct CompletionCycle {
    prefix: String,
    index: usize,
}

/// Calculate the visible width of a string, excluding ANSI escape sequences.
///
/// ANSI codes like `\x1b[1m` (colors, bold, etc.) don't take up space on the
/// terminal but are counted by `.chars().count()`. This strips them to get
/// the actual display width.
fn visible_width(s: &str) -> usize {
    let mut count = 0;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            if chars.as_str().starts_with('[') {
                // CSI sequence: skip until the command letter
                chars.next();
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() {
                        break;
                    }
                }
            } else {
                chars.next();
            }
        } else {
            count += 1;
        }
    }

    count
}

/// Single-line editor with history navigation and Tab completion cycling.
pub struct LineEditor {
    buffer: String,
    cursor: usize,
    history_pos: Option<usize>,
    saved_buffer: Option<String>,
    completer: Option<HistoryCompleter>,
    completion: Option<CompletionCycle>,
}

impl LineEditor {
    pub fn new(completer: Option<HistoryCompleter>) -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            history_pos: None,
            saved_buffer: None,
            completer,
            completion: None,
        }
    }

    /// Read one line. Returns `None` when the user cancelled with an
    /// interrupt or end-of-input.
    pub fn read_line(&mut self, prompt: &str, history: &History) -> Result<Option<String>> {
        if crossterm::tty::IsTty::is_tty(&std::io::stdin()) {
            terminal::enable_raw_mode()?;
            let result = self.read_line_raw(prompt, history);
            let _ = terminal::disable_raw_mode();
            result
        } else {
            // Non-interactive mode (pipes, tests): plain buffered reading
            self.read_line_simple(prompt)
        }
    }

    fn read_line_simple(&mut self, prompt: &str) -> Result<Option<String>> {
        use std::io::BufRead;

        print!("{}", prompt);
        io::stdout().flush()?;

        let stdin = io::stdin();
        let mut line = String::new();
        let n = stdin.lock().read_line(&mut line)?;

        if n == 0 {
            return Ok(None);
        }

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }

        Ok(Some(line))
    }

    fn read_line_raw(&mut self, prompt: &str, history: &History) -> Result<Option<String>> {
        self.buffer.clear();
        self.cursor = 0;
        self.history_pos = None;
        self.saved_buffer = None;
        self.completion = None;

        self.render(prompt)?;

        loop {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind != KeyEventKind::Press {
                    continue;
                }
                match self.handle_key(key_event, history) {
                    ControlFlow::Continue => {
                        self.render(prompt)?;
                    }
                    ControlFlow::Submit => {
                        print!("\r\n");
                        io::stdout().flush()?;
                        return Ok(Some(self.buffer.clone()));
                    }
                    ControlFlow::Cancel => {
                        print!("\r\n");
                        io::stdout().flush()?;
                        return Ok(None);
                    }
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent, history: &History) -> ControlFlow {
        // Any key other than Tab ends the current completion cycle.
        if key.code != KeyCode::Tab {
            self.completion = None;
        }

        match (key.code, key.modifiers) {
            // Enter - submit line
            (KeyCode::Enter, _) => ControlFlow::Submit,

            // Ctrl-C - cancel the read, whatever is in the buffer
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => ControlFlow::Cancel,

            // Ctrl-D - end-of-input if empty, else delete char at cursor
            (KeyCode::Char('d'), KeyModifiers::CONTROL) => {
                if self.buffer.is_empty() {
                    ControlFlow::Cancel
                } else {
                    if self.cursor < self.buffer.len() {
                        self.buffer.remove(self.cursor);
                    }
                    ControlFlow::Continue
                }
            }

            // Ctrl-A - move to start of line
            (KeyCode::Char('a'), KeyModifiers::CONTROL) | (KeyCode::Home, _) => {
                self.cursor = 0;
                ControlFlow::Continue
            }

            // Ctrl-E - move to end of line
            (KeyCode::Char('e'), KeyModifiers::CONTROL) | (KeyCode::End, _) => {
                self.cursor = self.buffer.len();
                ControlFlow::Continue
            }

            // Ctrl-U - clear line before cursor
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                self.buffer.drain(..self.cursor);
                self.cursor = 0;
                ControlFlow::Continue
            }

            // Ctrl-K - clear line after cursor
            (KeyCode::Char('k'), KeyModifiers::CONTROL) => {
                self.buffer.truncate(self.cursor);
                ControlFlow::Continue
            }

            // Ctrl-W - delete word before cursor
            (KeyCode::Char('w'), KeyModifiers::CONTROL) => {
                if self.cursor > 0 {
                    let head = &self.buffer[..self.cursor];
                    let trimmed = head.trim_end();
                    let cut = trimmed
                        .char_indices()
                        .rev()
                        .find(|(_, c)| c.is_whitespace())
                        .map(|(i, c)| i + c.len_utf8())
                        .unwrap_or(0);
                    self.buffer.drain(cut..self.cursor);
                    self.cursor = cut;
                }
                ControlFlow::Continue
            }

            // Arrow Up - previous history entry
            (KeyCode::Up, _) => {
                self.history_prev(history);
                ControlFlow::Continue
            }

            // Arrow Down - next history entry
            (KeyCode::Down, _) => {
                self.history_next(history);
                ControlFlow::Continue
            }

            (KeyCode::Left, _) => {
                self.move_cursor_left();
                ControlFlow::Continue
            }

            (KeyCode::Right, _) => {
                self.move_cursor_right();
                ControlFlow::Continue
            }

            // Backspace - delete char before cursor
            (KeyCode::Backspace, _) => {
                if self.cursor > 0 {
                    self.move_cursor_left();
                    self.buffer.remove(self.cursor);
                }
                ControlFlow::Continue
            }

            // Delete - delete char at cursor
            (KeyCode::Delete, _) => {
                if self.cursor < self.buffer.len() {
                    self.buffer.remove(self.cursor);
                }
                ControlFlow::Continue
            }

            // Tab - cycle through history completions
            (KeyCode::Tab, _) => {
                if self.completer.is_some() {
                    self.cycle_completion(history);
                } else {
                    self.buffer.insert(self.cursor, '\t');
                    self.cursor += 1;
                }
                ControlFlow::Continue
            }

            // Regular character - insert at cursor
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                self.buffer.insert(self.cursor, c);
                self.cursor += c.len_utf8();
                ControlFlow::Continue
            }

            // Ignore other key combinations
            _ => ControlFlow::Continue,
        }
    }

    /// Advance the active completion cycle, or start one from the current
    /// buffer contents.
    fn cycle_completion(&mut self, history: &History) {
        let cycle = match self.completion.take() {
            Some(mut cycle) => {
                cycle.index += 1;
                cycle
            }
            None => CompletionCycle {
                prefix: self.buffer.clone(),
                index: 0,
            },
        };

        let candidate = match self.completer.as_mut() {
            Some(completer) => completer.complete(&cycle.prefix, cycle.index, history),
            None => None,
        };

        match candidate {
            Some(candidate) => {
                self.buffer = candidate;
                self.cursor = self.buffer.len();
                self.completion = Some(cycle);
            }
            None => {
                // Candidates exhausted (or nothing matched): restore the
                // typed prefix; the next Tab starts a fresh cycle.
                self.buffer = cycle.prefix;
                self.cursor = self.buffer.len();
            }
        }
    }

    fn move_cursor_left(&mut self) {
        if self.cursor > 0 {
            let mut pos = self.cursor - 1;
            while !self.buffer.is_char_boundary(pos) {
                pos -= 1;
            }
            self.cursor = pos;
        }
    }

    fn move_cursor_right(&mut self) {
        if let Some(c) = self.buffer[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    fn history_prev(&mut self, history: &History) {
        if history.is_empty() {
            return;
        }

        // Save current buffer on first history navigation
        if self.history_pos.is_none() {
            self.saved_buffer = Some(self.buffer.clone());
        }

        let new_pos = match self.history_pos {
            None => history.len() - 1,
            Some(pos) if pos > 0 => pos - 1,
            Some(_) => return, // Already at oldest
        };

        self.history_pos = Some(new_pos);
        if let Some(entry) = history.get(new_pos) {
            self.buffer = entry.clone();
            self.cursor = self.buffer.len();
        }
    }

    fn history_next(&mut self, history: &History) {
        match self.history_pos {
            None => (), // Not in history navigation
            Some(pos) if pos < history.len() - 1 => {
                let new_pos = pos + 1;
                self.history_pos = Some(new_pos);
                if let Some(entry) = history.get(new_pos) {
                    self.buffer = entry.clone();
                    self.cursor = self.buffer.len();
                }
            }
            Some(_) => {
                // Reached newest, restore saved buffer
                self.history_pos = None;
                if let Some(saved) = self.saved_buffer.take() {
                    self.buffer = saved;
                    self.cursor = self.buffer.len();
                }
            }
        }
    }

    fn render(&self, prompt: &str) -> Result<()> {
        let mut stdout = io::stdout();

        queue!(
            stdout,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
        )?;

        queue!(stdout, Print(prompt))?;
        queue!(stdout, Print(&self.buffer))?;

        // Cursor position in visible columns, skipping ANSI codes in the prompt
        let cursor_col = visible_width(prompt) + self.buffer[..self.cursor].chars().count();
        queue!(stdout, cursor::MoveToColumn(cursor_col as u16))?;

        stdout.flush()?;
        Ok(())
    }
}

impl Drop for LineEditor {
    fn drop(&mut self) {
        // Ensure raw mode is disabled
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_editor() -> LineEditor {
        LineEditor::new(Some(HistoryCompleter::new()))
    }

    fn create_test_history() -> History {
        let mut history = History::in_memory();
        history.add("red".to_string());
        history.add("green".to_string());
        history.add("blue".to_string());
        history
    }

    fn press(editor: &mut LineEditor, history: &History, code: KeyCode) -> ControlFlow {
        editor.handle_key(KeyEvent::new(code, KeyModifiers::NONE), history)
    }

    fn press_ctrl(editor: &mut LineEditor, history: &History, c: char) -> ControlFlow {
        editor.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL), history)
    }

    #[test]
    fn test_editor_initialization() {
        let editor = create_test_editor();
        assert_eq!(editor.buffer, "");
        assert_eq!(editor.cursor, 0);
        assert_eq!(editor.history_pos, None);
        assert_eq!(editor.saved_buffer, None);
    }

    #[test]
    fn test_cursor_movement() {
        let mut editor = create_test_editor();
        editor.buffer = "hello".to_string();
        editor.cursor = 5;

        editor.move_cursor_left();
        assert_eq!(editor.cursor, 4);

        editor.move_cursor_right();
        assert_eq!(editor.cursor, 5);

        // Should not go beyond buffer length
        editor.move_cursor_right();
        assert_eq!(editor.cursor, 5);

        editor.cursor = 0;
        editor.move_cursor_left();
        assert_eq!(editor.cursor, 0);
    }

    #[test]
    fn test_cursor_movement_with_unicode() {
        let mut editor = create_test_editor();
        editor.buffer = "héllo".to_string();
        editor.cursor = editor.buffer.len();

        for _ in 0..5 {
            editor.move_cursor_left();
        }
        assert_eq!(editor.cursor, 0);

        editor.move_cursor_right();
        assert_eq!(editor.cursor, 1); // 'h'
        editor.move_cursor_right();
        assert_eq!(editor.cursor, 3); // past the two-byte 'é'
    }

    #[test]
    fn test_history_prev_navigation() {
        let mut editor = create_test_editor();
        let history = create_test_history();

        editor.history_prev(&history);
        assert_eq!(editor.buffer, "blue");
        assert_eq!(editor.history_pos, Some(2));
        assert_eq!(editor.cursor, 4);

        editor.history_prev(&history);
        assert_eq!(editor.buffer, "green");

        editor.history_prev(&history);
        assert_eq!(editor.buffer, "red");
        assert_eq!(editor.history_pos, Some(0));

        // Should not go below 0
        editor.history_prev(&history);
        assert_eq!(editor.buffer, "red");
        assert_eq!(editor.history_pos, Some(0));
    }

    #[test]
    fn test_history_next_restores_saved_buffer() {
        let mut editor = create_test_editor();
        let history = create_test_history();

        editor.buffer = "unfinished answer".to_string();
        editor.cursor = editor.buffer.len();

        editor.history_prev(&history);
        assert_eq!(editor.saved_buffer, Some("unfinished answer".to_string()));
        assert_eq!(editor.buffer, "blue");

        editor.history_next(&history);
        assert_eq!(editor.buffer, "unfinished answer");
        assert_eq!(editor.history_pos, None);
    }

    #[test]
    fn test_history_with_empty_history() {
        let mut editor = create_test_editor();
        let history = History::in_memory();

        editor.history_prev(&history);
        assert_eq!(editor.buffer, "");
        assert_eq!(editor.history_pos, None);

        editor.history_next(&history);
        assert_eq!(editor.buffer, "");
        assert_eq!(editor.history_pos, None);
    }

    #[test]
    fn test_handle_key_enter_submits() {
        let mut editor = create_test_editor();
        let history = History::in_memory();

        editor.buffer = "an answer".to_string();

        match press(&mut editor, &history, KeyCode::Enter) {
            ControlFlow::Submit => (),
            _ => panic!("Expected Submit"),
        }
    }

    #[test]
    fn test_ctrl_c_cancels_even_with_text() {
        let mut editor = create_test_editor();
        let history = History::in_memory();

        editor.buffer = "half an answer".to_string();
        editor.cursor = 5;

        match press_ctrl(&mut editor, &history, 'c') {
            ControlFlow::Cancel => (),
            _ => panic!("Expected Cancel"),
        }
    }

    #[test]
    fn test_ctrl_d_on_empty_cancels() {
        let mut editor = create_test_editor();
        let history = History::in_memory();

        match press_ctrl(&mut editor, &history, 'd') {
            ControlFlow::Cancel => (),
            _ => panic!("Expected Cancel"),
        }
    }

    #[test]
    fn test_ctrl_d_deletes_at_cursor() {
        let mut editor = create_test_editor();
        let history = History::in_memory();

        editor.buffer = "hello".to_string();
        editor.cursor = 2;

        match press_ctrl(&mut editor, &history, 'd') {
            ControlFlow::Continue => (),
            _ => panic!("Expected Continue"),
        }
        assert_eq!(editor.buffer, "helo");
        assert_eq!(editor.cursor, 2);
    }

    #[test]
    fn test_ctrl_a_and_ctrl_e() {
        let mut editor = create_test_editor();
        let history = History::in_memory();

        editor.buffer = "hello".to_string();
        editor.cursor = 3;

        press_ctrl(&mut editor, &history, 'a');
        assert_eq!(editor.cursor, 0);

        press_ctrl(&mut editor, &history, 'e');
        assert_eq!(editor.cursor, 5);
    }

    #[test]
    fn test_ctrl_u_clears_before_cursor() {
        let mut editor = create_test_editor();
        let history = History::in_memory();

        editor.buffer = "hello world".to_string();
        editor.cursor = 6;

        press_ctrl(&mut editor, &history, 'u');
        assert_eq!(editor.buffer, "world");
        assert_eq!(editor.cursor, 0);
    }

    #[test]
    fn test_ctrl_k_clears_after_cursor() {
        let mut editor = create_test_editor();
        let history = History::in_memory();

        editor.buffer = "hello world".to_string();
        editor.cursor = 5;

        press_ctrl(&mut editor, &history, 'k');
        assert_eq!(editor.buffer, "hello");
        assert_eq!(editor.cursor, 5);
    }

    #[test]
    fn test_ctrl_w_deletes_word() {
        let mut editor = create_test_editor();
        let history = History::in_memory();

        editor.buffer = "one two three".to_string();
        editor.cursor = 13;

        press_ctrl(&mut editor, &history, 'w');
        assert_eq!(editor.buffer, "one two ");
        assert_eq!(editor.cursor, 8);

        editor.buffer = "one two   ".to_string();
        editor.cursor = 10;

        press_ctrl(&mut editor, &history, 'w');
        assert_eq!(editor.buffer, "one ");
        assert_eq!(editor.cursor, 4);
    }

    #[test]
    fn test_backspace_and_delete() {
        let mut editor = create_test_editor();
        let history = History::in_memory();

        editor.buffer = "hello".to_string();
        editor.cursor = 5;

        press(&mut editor, &history, KeyCode::Backspace);
        assert_eq!(editor.buffer, "hell");
        assert_eq!(editor.cursor, 4);

        editor.cursor = 0;
        press(&mut editor, &history, KeyCode::Delete);
        assert_eq!(editor.buffer, "ell");
        assert_eq!(editor.cursor, 0);

        // Backspace at the start is a no-op
        press(&mut editor, &history, KeyCode::Backspace);
        assert_eq!(editor.buffer, "ell");
    }

    #[test]
    fn test_char_insert() {
        let mut editor = create_test_editor();
        let history = History::in_memory();

        editor.buffer = "hllo".to_string();
        editor.cursor = 1;

        press(&mut editor, &history, KeyCode::Char('e'));
        assert_eq!(editor.buffer, "hello");
        assert_eq!(editor.cursor, 2);
    }

    #[test]
    fn test_tab_cycles_through_candidates() {
        let mut editor = create_test_editor();
        let mut history = History::in_memory();
        history.add("apple".to_string());
        history.add("apt".to_string());

        editor.buffer = "ap".to_string();
        editor.cursor = 2;

        // Shortest candidate first
        press(&mut editor, &history, KeyCode::Tab);
        assert_eq!(editor.buffer, "apt");
        assert_eq!(editor.cursor, 3);

        press(&mut editor, &history, KeyCode::Tab);
        assert_eq!(editor.buffer, "apple");

        // Exhausted: restore the typed prefix
        press(&mut editor, &history, KeyCode::Tab);
        assert_eq!(editor.buffer, "ap");

        // And the next Tab starts over
        press(&mut editor, &history, KeyCode::Tab);
        assert_eq!(editor.buffer, "apt");
    }

    #[test]
    fn test_tab_on_empty_buffer_offers_nothing() {
        let mut editor = create_test_editor();
        let mut history = History::in_memory();
        history.add("apple".to_string());

        press(&mut editor, &history, KeyCode::Tab);
        assert_eq!(editor.buffer, "");
    }

    #[test]
    fn test_typing_resets_completion_cycle() {
        let mut editor = create_test_editor();
        let mut history = History::in_memory();
        history.add("apt".to_string());
        history.add("april".to_string());

        editor.buffer = "ap".to_string();
        editor.cursor = 2;

        press(&mut editor, &history, KeyCode::Tab);
        assert_eq!(editor.buffer, "apt");

        // Typing ends the cycle; the next Tab completes the new prefix
        press(&mut editor, &history, KeyCode::Char('i'));
        assert_eq!(editor.buffer, "apti");
        assert!(editor.completion.is_none());
    }

    #[test]
    fn test_tab_without_completer_inserts_tab() {
        let mut editor = LineEditor::new(None);
        let history = History::in_memory();

        editor.buffer = "x".to_string();
        editor.cursor = 1;

        press(&mut editor, &history, KeyCode::Tab);
        assert_eq!(editor.buffer, "x\t");
        assert_eq!(editor.cursor, 2);
    }

    #[test]
    fn test_visible_width_plain_text() {
        assert_eq!(visible_width("> "), 2);
        assert_eq!(visible_width("hello"), 5);
        assert_eq!(visible_width(""), 0);
    }

    #[test]
    fn test_visible_width_with_ansi_codes() {
        assert_eq!(visible_width("\x1b[1m> \x1b[0m"), 2);
        assert_eq!(visible_width("\x1b[32m\x1b[1mhello\x1b[0m"), 5);
        assert_eq!(visible_width("\x1b[1;36m\x1b[0m"), 0);
    }
}
