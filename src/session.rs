use anyhow::Result;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use std::io::{self, Write};
use tracing::debug;

use crate::history::History;
use crate::readline::LineEditor;

/// Scoped alternate-screen mode.
///
/// Entered on construction and restored on drop, so every exit path,
/// including errors inside the read, returns the terminal to the prior view.
/// Inert when stdout is not a terminal.
struct AlternateScreen {
    active: bool,
}

impl AlternateScreen {
    fn enter() -> Result<Self> {
        if io::stdout().is_tty() {
            execute!(io::stdout(), EnterAlternateScreen)?;
            Ok(Self { active: true })
        } else {
            Ok(Self { active: false })
        }
    }
}

impl Drop for AlternateScreen {
    fn drop(&mut self) {
        if self.active {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

/// One bounded interactive input session: show the message, read one line,
/// persist the history, restore the screen.
pub struct Session {
    history: History,
    editor: LineEditor,
    message: Option<String>,
    prompt: String,
}

impl Session {
    pub fn new(
        history: History,
        editor: LineEditor,
        message: Option<String>,
        prompt: String,
    ) -> Self {
        Self {
            history,
            editor,
            message,
            prompt,
        }
    }

    /// Run the session to completion. Returns the submitted line, or `None`
    /// when the user cancelled with an interrupt or end-of-input.
    pub fn run(mut self) -> Result<Option<String>> {
        let _screen = AlternateScreen::enter()?;

        if let Some(message) = &self.message {
            println!("{}", message);
            io::stdout().flush()?;
        }

        let response = self.editor.read_line(&self.prompt, &self.history)?;

        if let Some(line) = &response {
            self.history.add(line.clone());
        }
        // History must be durable before the alternate screen restores the
        // prior view.
        self.history.save()?;
        debug!(entries = self.history.len(), "history saved");

        Ok(response)
    }
}
