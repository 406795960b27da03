pub const FILE_COMMAND: &str = "FILE";
pub const FILE_PREFIX: &str = "FILE ";

/// The `FILE "<name>" <TYPE>` line of a cue sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDirective {
    pub filename: String,
    /// Everything after the filename delimiter, kept verbatim (usually `WAVE`).
    pub file_type: String,
    /// Whether the filename was written in double quotes.
    pub quoted: bool,
    pub line_ending: String,
}

impl FileDirective {
    pub fn with_filename(&self, filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..self.clone()
        }
    }
}
