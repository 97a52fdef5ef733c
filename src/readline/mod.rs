pub mod completer;
pub mod editor;

pub use completer::HistoryCompleter;
pub use editor::LineEditor;
