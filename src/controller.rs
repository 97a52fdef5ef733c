use anyhow::{Context, Result};
use tracing::debug;

use crate::answer::Answer;
use crate::cli::AskArgs;
use crate::config::{styled, Config};
use crate::history::History;
use crate::readline::{HistoryCompleter, LineEditor};
use crate::session::Session;

/// Top-level orchestration: build one session from the parsed invocation and
/// the configuration, run it, and package the result.
pub struct PromptController {
    args: AskArgs,
    config: Config,
}

impl PromptController {
    pub fn new(args: AskArgs, config: Config) -> Self {
        Self { args, config }
    }

    pub fn run(self) -> Result<Answer> {
        let AskArgs {
            input_type,
            message,
            name,
            items,
        } = self.args;

        let history = match name.as_deref() {
            Some(name) => History::open(name)
                .with_context(|| format!("opening history for prompt {:?}", name))?,
            None => History::in_memory(),
        };
        debug!(
            ?input_type,
            entries = history.len(),
            named = name.is_some(),
            "history ready"
        );

        // Completion is only offered when a name scopes the history.
        let completer =
            (name.is_some() && self.config.enable_completion).then(HistoryCompleter::new);
        let editor = LineEditor::new(completer);

        let prompt = styled(&self.config.prompt, self.config.colors.prompt_ansi());
        let message = message.map(|m| styled(&m, self.config.colors.message_ansi()));

        let response = Session::new(history, editor, message, prompt).run()?;

        Ok(Answer { items, response })
    }
}
