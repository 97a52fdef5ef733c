use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Ordered answer history for one named prompt.
///
/// Entries are kept oldest-first. A history opened with a name is backed by
/// `<cache root>/ask/<name>`; one created in memory never touches the
/// filesystem.
pub struct History {
    lines: Vec<String>,
    file_path: Option<PathBuf>,
}

impl History {
    /// History with no backing file. Load and save are no-ops.
    pub fn in_memory() -> Self {
        Self {
            lines: Vec::new(),
            file_path: None,
        }
    }

    /// Open the history for `name` under the process cache root, creating the
    /// `ask` directory if needed and loading any previously persisted answers.
    pub fn open(name: &str) -> std::io::Result<Self> {
        let cache_root = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        Self::open_in(&cache_root, name)
    }

    /// Open the history for `name` under an explicit cache root.
    pub fn open_in(cache_root: &Path, name: &str) -> std::io::Result<Self> {
        let dir = cache_root.join("ask");
        // Tolerates a pre-existing directory; anything else propagates.
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(name);
        let mut history = Self {
            lines: Vec::new(),
            file_path: Some(path.clone()),
        };
        history.load_from_file(&path)?;
        Ok(history)
    }

    /// Append a submitted answer. Empty lines are not recorded; duplicates
    /// are kept as-is.
    pub fn add(&mut self, line: String) {
        if line.is_empty() {
            return;
        }
        self.lines.push(line);
    }

    /// Get entry by index (0 = oldest, len-1 = newest).
    pub fn get(&self, index: usize) -> Option<&String> {
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// All entries, oldest first.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Load entries from the backing file. An absent file is an empty
    /// history, not an error.
    fn load_from_file(&mut self, path: &Path) -> std::io::Result<()> {
        if !path.exists() {
            return Ok(());
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);

        for line in reader.lines() {
            let entry = line?;
            if !entry.is_empty() {
                self.lines.push(entry);
            }
        }

        Ok(())
    }

    /// Rewrite the backing file with the full in-memory list, one entry per
    /// line. A no-op for an in-memory history.
    pub fn save(&self) -> std::io::Result<()> {
        if let Some(ref path) = self.file_path {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;

            for line in &self.lines {
                writeln!(file, "{}", line)?;
            }

            file.flush()?;
        }
        Ok(())
    }
}
