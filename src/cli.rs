use clap::{Parser, ValueEnum};

/// Ask the user for input
#[derive(Debug, Parser)]
#[command(name = "ask", about = "Ask the user for input", version)]
pub struct AskArgs {
    /// Type of input. Defaults to asking for a line of text.
    #[arg(short = 't', long = "type", value_enum, default_value = "line")]
    pub input_type: InputType,

    /// The message to display to the user before the prompt.
    #[arg(short, long)]
    pub message: Option<String>,

    /// The name for this question. Used to store history of previous answers
    /// which can be used for completions and via the history bindings.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Passed through untouched into the answer's `items` payload.
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputType {
    /// A single line of text.
    Line,
}
