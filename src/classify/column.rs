//! CSV column lookup, resolved once before a run starts.

use crate::error::ConfigError;

/// Which CSV column to read: a 0-based index or a header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    Index(usize),
    Name(String),
}

impl ColumnSelector {
    /// Digits select an index; anything else names a header column.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s.parse::<usize>() {
            Ok(index) => ColumnSelector::Index(index),
            Err(_) => ColumnSelector::Name(s.to_string()),
        }
    }

    /// Turn the selector into an index, looking names up in `header`.
    pub fn resolve(&self, header: Option<&str>) -> Result<usize, ConfigError> {
        match self {
            ColumnSelector::Index(index) => Ok(*index),
            ColumnSelector::Name(name) => {
                let header = header.ok_or(ConfigError::MissingHeader)?;
                parse_record(header)
                    .and_then(|fields| fields.iter().position(|f| f == name.as_str()))
                    .ok_or_else(|| ConfigError::ColumnNotFound(name.clone()))
            }
        }
    }
}

impl std::fmt::Display for ColumnSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnSelector::Index(i) => write!(f, "{i}"),
            ColumnSelector::Name(n) => write!(f, "{n}"),
        }
    }
}

fn parse_record(line: &str) -> Option<csv::StringRecord> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()?
        .ok()
}

/// Field `index` of a single CSV line, or `None` if the line is malformed or
/// too short.
pub fn extract_field(line: &str, index: usize) -> Option<String> {
    parse_record(line)?.get(index).map(str::to_owned)
}
