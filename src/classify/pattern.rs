//! Regex match/extract classification.

use std::path::Path;

use async_trait::async_trait;
use regex::Regex;

use super::{Classifier, Outcome};
use crate::error::{BoxError, ConfigError};
use crate::line::Line;

/// Capture group whose text replaces the line when it participates in a match.
pub const DEFAULT_OUTPUT_GROUP: &str = "output";

/// A pattern paired with the destination it routes to.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub key: String,
    pub regex: Regex,
}

impl PatternRule {
    pub fn new(key: impl Into<String>, pattern: &str, index: usize) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            index,
            pattern: pattern.to_string(),
            source: Box::new(e),
        })?;
        Ok(Self {
            key: key.into(),
            regex,
        })
    }
}

/// Routes a line to the first rule whose regex matches it.
///
/// The written text is the configured named group when the rule defines it
/// and it took part in the match, otherwise the whole line. Lines matching no
/// rule are skipped.
#[derive(Debug, Clone)]
pub struct RegexClassifier {
    rules: Vec<PatternRule>,
    group: Option<String>,
}

impl Default for RegexClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexClassifier {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            group: Some(DEFAULT_OUTPUT_GROUP.to_string()),
        }
    }

    /// One rule per pattern, keyed by the pattern's 0-based index.
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classifier = Self::new();
        for (index, pattern) in patterns.into_iter().enumerate() {
            classifier = classifier.with_rule(index.to_string(), pattern.as_ref())?;
        }
        if classifier.rules.is_empty() {
            return Err(ConfigError::NoPatterns);
        }
        Ok(classifier)
    }

    /// Append a rule routing matches to `key`.
    pub fn with_rule(mut self, key: impl Into<String>, pattern: &str) -> Result<Self, ConfigError> {
        let index = self.rules.len();
        self.rules.push(PatternRule::new(key, pattern, index)?);
        Ok(self)
    }

    /// Name of the capture group supplying the output text; `None` always
    /// writes the whole line.
    pub fn with_group(mut self, group: Option<String>) -> Self {
        self.group = group;
        self
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Destination key and output text for `text`, if any rule matches.
    pub fn route<'t>(&self, text: &'t str) -> Option<(&str, &'t str)> {
        for rule in &self.rules {
            let Some(caps) = rule.regex.captures(text) else {
                continue;
            };
            let output = self
                .group
                .as_deref()
                .and_then(|name| caps.name(name))
                .map(|m| m.as_str())
                .unwrap_or(text);
            return Some((rule.key.as_str(), output));
        }
        None
    }
}

#[async_trait]
impl Classifier for RegexClassifier {
    async fn classify(&self, line: &Line) -> Result<Outcome, BoxError> {
        Ok(match self.route(line.text()) {
            Some((key, output)) => Outcome::route(key, output),
            None => Outcome::Skip,
        })
    }
}

/// A file holding one regex per line.
///
/// Blank lines and lines starting with `#` are ignored.
#[derive(Debug, Clone, Copy)]
pub struct PatternFile;

impl PatternFile {
    pub fn parse(contents: &str) -> Vec<String> {
        contents
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
            .map(str::to_owned)
            .collect()
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Vec<String>, ConfigError> {
        let path = path.as_ref();
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Unreadable {
                    path: path.display().to_string(),
                    source,
                })?;
        Ok(Self::parse(&contents))
    }

    /// Load the file and compile it into a classifier.
    pub async fn classifier(path: impl AsRef<Path>) -> Result<RegexClassifier, ConfigError> {
        RegexClassifier::from_patterns(Self::load(path).await?)
    }
}
