//! The unit of work flowing through a pipeline.

/// Name of a logical output bucket (status code, pattern index, "skipped").
pub type DestinationKey = String;

/// One input record: its text without the line terminator, plus its 0-based
/// position in the input (after any header line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    seq: u64,
    text: String,
}

impl Line {
    pub fn new(seq: u64, text: impl Into<String>) -> Self {
        Self {
            seq,
            text: text.into(),
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// 1-based line number, for messages.
    pub fn number(&self) -> u64 {
        self.seq + 1
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl AsRef<str> for Line {
    fn as_ref(&self) -> &str {
        &self.text
    }
}
