use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_prompt")]
    pub prompt: String,

    #[serde(default = "default_true")]
    pub enable_completion: bool,

    #[serde(default)]
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColorConfig {
    /// Style applied to the optional message shown above the prompt.
    #[serde(default = "default_bold")]
    pub message: String,

    /// Style applied to the prompt marker itself.
    #[serde(default = "default_none")]
    pub prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            enable_completion: true,
            colors: ColorConfig::default(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            message: default_bold(),
            prompt: default_none(),
        }
    }
}

impl Config {
    /// Load configuration from `<config dir>/ask/config.toml`, falling back
    /// to defaults when the file is absent or unreadable.
    pub fn load() -> Self {
        let config_path = dirs::config_dir().map(|d| d.join("ask").join("config.toml"));

        if let Some(path) = config_path {
            if let Ok(content) = std::fs::read_to_string(&path) {
                match toml::from_str::<Config>(&content) {
                    Ok(config) => return config,
                    Err(e) => warn!(path = %path.display(), "ignoring malformed config: {}", e),
                }
            }
        }

        Self::default()
    }

    #[cfg(test)]
    fn from_toml(content: &str) -> Option<Self> {
        toml::from_str(content).ok()
    }
}

impl ColorConfig {
    /// Convert a style name to its ANSI code. Unknown names style nothing.
    pub fn to_ansi(name: &str) -> &'static str {
        match name {
            "bold" => "\x1b[1m",
            "black" => "\x1b[30m",
            "red" => "\x1b[31m",
            "green" => "\x1b[32m",
            "yellow" => "\x1b[33m",
            "blue" => "\x1b[34m",
            "magenta" => "\x1b[35m",
            "cyan" => "\x1b[36m",
            "white" => "\x1b[37m",
            "gray" | "grey" => "\x1b[90m",
            _ => "",
        }
    }

    pub fn message_ansi(&self) -> &'static str {
        Self::to_ansi(&self.message)
    }

    pub fn prompt_ansi(&self) -> &'static str {
        Self::to_ansi(&self.prompt)
    }
}

// Default functions for serde
fn default_prompt() -> String {
    "> ".to_string()
}

fn default_true() -> bool {
    true
}

fn default_bold() -> String {
    "bold".to_string()
}

fn default_none() -> String {
    "none".to_string()
}

/// Apply `style` around `text`, or return it untouched for unstyled names.
pub fn styled(text: &str, ansi: &str) -> String {
    if ansi.is_empty() {
        text.to_string()
    } else {
        format!("{}{}\x1b[0m", ansi, text)
    }
}
