//! File-based configuration describing a complete pipeline run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use super::PipelineOptions;
use crate::classify::Classifier;
use crate::error::ConfigError;
use crate::results::ResultsDir;

/// Configuration for an entire pipeline run.
///
/// ```yaml
/// input: urls.csv
/// results_dir: results
/// concurrency: 200
/// classifier:
///   kind: status
///   column: url
///   prefix: https://example.com
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Input file path, or "-" for stdin
    pub input: String,
    /// Directory receiving one file per destination
    #[serde(default = "default_results_dir")]
    pub results_dir: String,
    /// Output file extension; defaults per classifier kind
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub input_capacity: Option<usize>,
    #[serde(default)]
    pub writer_capacity: Option<usize>,
    #[serde(default)]
    pub progress_interval: Option<u64>,
    /// First line is a header copied into every output; defaults per
    /// classifier kind
    #[serde(default)]
    pub header: Option<bool>,
    /// Destination for skipped lines; defaults per classifier kind
    #[serde(default)]
    pub skip_key: Option<String>,
    /// Drop skipped lines instead of writing them anywhere
    #[serde(default)]
    pub drop_skipped: bool,
    /// Delete files left by a previous run
    #[serde(default = "default_true")]
    pub clear_results: bool,
    pub classifier: ClassifierConfig,
}

/// Classifier selection: `kind: regex` or `kind: status`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierConfig {
    Regex {
        /// Inline patterns, keyed by index
        #[serde(default)]
        patterns: Vec<String>,
        /// File with one pattern per line, appended after inline patterns
        #[serde(default)]
        pattern_file: Option<String>,
        /// Capture group supplying the output text
        #[serde(default)]
        group: Option<String>,
    },
    Status {
        /// 0-based index or header name of the URL column
        #[serde(default = "default_column")]
        column: String,
        /// Prepended to root-relative URLs
        #[serde(default)]
        prefix: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

fn default_results_dir() -> String {
    "results".into()
}

fn default_column() -> String {
    "0".into()
}

fn default_true() -> bool {
    true
}

/// Serialization format of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat(ext)),
        }
    }
}

impl PipelineConfig {
    /// Parse a config from text in the given format.
    pub fn parse(text: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        match format {
            #[cfg(feature = "yaml")]
            ConfigFormat::Yaml => {
                serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(Box::new(e)))
            }
            #[cfg(feature = "json")]
            ConfigFormat::Json => {
                serde_json::from_str(text).map_err(|e| ConfigError::Parse(Box::new(e)))
            }
            #[cfg(feature = "toml")]
            ConfigFormat::Toml => toml::from_str(text).map_err(|e| ConfigError::Parse(Box::new(e))),
            #[allow(unreachable_patterns)]
            _ => Err(ConfigError::NotEnabled(match format {
                ConfigFormat::Yaml => "yaml",
                ConfigFormat::Json => "json",
                ConfigFormat::Toml => "toml",
            })),
        }
    }

    /// Read and parse a config file, choosing the format by extension.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Unreadable {
                path: path.display().to_string(),
                source,
            })?;
        Self::parse(&text, format)
    }

    fn is_status(&self) -> bool {
        matches!(self.classifier, ClassifierConfig::Status { .. })
    }

    /// Runtime options, falling back to the defaults of the classifier kind.
    pub fn options(&self) -> PipelineOptions {
        let defaults = PipelineOptions::default();
        let skip_key = if self.drop_skipped {
            None
        } else {
            Some(self.skip_key.clone().unwrap_or_else(|| {
                if self.is_status() {
                    "skipped".to_string()
                } else {
                    crate::worker::DEFAULT_SKIP_KEY.to_string()
                }
            }))
        };

        PipelineOptions {
            input_capacity: self.input_capacity.unwrap_or(defaults.input_capacity),
            writer_capacity: self.writer_capacity.unwrap_or(defaults.writer_capacity),
            concurrency: self.concurrency.unwrap_or(defaults.concurrency),
            progress_interval: self.progress_interval.unwrap_or(defaults.progress_interval),
            has_header: self.header.unwrap_or(self.is_status()),
            skip_key,
            clear_results: self.clear_results,
        }
    }

    pub fn results(&self) -> ResultsDir {
        let extension = self
            .extension
            .clone()
            .unwrap_or_else(|| if self.is_status() { "csv" } else { "txt" }.to_string());
        ResultsDir::new(PathBuf::from(&self.results_dir)).with_extension(extension)
    }
}

impl ClassifierConfig {
    /// Build the configured classifier. `header` is the input's header line,
    /// needed to resolve a column given by name.
    pub async fn build(&self, header: Option<&str>) -> Result<Arc<dyn Classifier>, ConfigError> {
        match self {
            ClassifierConfig::Regex {
                patterns,
                pattern_file,
                group,
            } => Self::build_regex(patterns, pattern_file.as_deref(), group.clone()).await,
            ClassifierConfig::Status {
                column,
                prefix,
                timeout_secs,
            } => Self::build_status(column, prefix.clone(), *timeout_secs, header),
        }
    }

    #[cfg(feature = "regex")]
    async fn build_regex(
        patterns: &[String],
        pattern_file: Option<&str>,
        group: Option<String>,
    ) -> Result<Arc<dyn Classifier>, ConfigError> {
        use crate::classify::{DEFAULT_OUTPUT_GROUP, PatternFile, RegexClassifier};

        let mut all = patterns.to_vec();
        if let Some(path) = pattern_file {
            all.extend(PatternFile::load(path).await?);
        }
        let classifier = RegexClassifier::from_patterns(&all)?
            .with_group(Some(group.unwrap_or_else(|| DEFAULT_OUTPUT_GROUP.to_string())));
        Ok(Arc::new(classifier))
    }

    #[cfg(not(feature = "regex"))]
    async fn build_regex(
        _patterns: &[String],
        _pattern_file: Option<&str>,
        _group: Option<String>,
    ) -> Result<Arc<dyn Classifier>, ConfigError> {
        Err(ConfigError::NotEnabled("regex"))
    }

    #[cfg(feature = "http")]
    fn build_status(
        column: &str,
        prefix: Option<String>,
        timeout_secs: Option<u64>,
        header: Option<&str>,
    ) -> Result<Arc<dyn Classifier>, ConfigError> {
        use crate::classify::{ColumnSelector, HttpStatusProbe, StatusClassifier};

        let index = ColumnSelector::parse(column).resolve(header)?;
        let probe = match timeout_secs {
            Some(secs) => HttpStatusProbe::with_timeout(std::time::Duration::from_secs(secs))
                .map_err(|e| ConfigError::InvalidArgument(e.to_string()))?,
            None => HttpStatusProbe::new(),
        };
        Ok(Arc::new(
            StatusClassifier::new(probe, index).with_prefix(prefix),
        ))
    }

    #[cfg(not(feature = "http"))]
    fn build_status(
        _column: &str,
        _prefix: Option<String>,
        _timeout_secs: Option<u64>,
        _header: Option<&str>,
    ) -> Result<Arc<dyn Classifier>, ConfigError> {
        Err(ConfigError::NotEnabled("http"))
    }
}
