//! Command-line helpers shared by the lineroute binaries.
//!
//! Arguments are positional:
//!
//! ```text
//! lineroute_regex  <input> <patterns-file> [results-dir]
//! lineroute_status [file.csv] [column] [url-prefix]
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::ConfigError;

/// Results directory used when none is given.
pub const DEFAULT_RESULTS_DIR: &str = "results";

/// Initialize structured logging, honouring `RUST_LOG` when set.
pub fn init_tracing(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}

fn arg(args: &[String], index: usize) -> Option<&str> {
    args.get(index)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Arguments of the regex extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexArgs {
    pub input: String,
    pub patterns: String,
    pub results_dir: String,
}

impl RegexArgs {
    /// Parse positional arguments (program name excluded).
    pub fn parse(args: &[String]) -> Result<Self, ConfigError> {
        if args.len() > 3 {
            return Err(ConfigError::InvalidArgument("too many arguments".into()));
        }
        let input = arg(args, 0)
            .ok_or_else(|| ConfigError::InvalidArgument("missing <input> argument".into()))?;
        let patterns = arg(args, 1).ok_or_else(|| {
            ConfigError::InvalidArgument("missing <patterns-file> argument".into())
        })?;
        let results_dir = arg(args, 2).unwrap_or(DEFAULT_RESULTS_DIR);

        Ok(Self {
            input: input.to_string(),
            patterns: patterns.to_string(),
            results_dir: results_dir.to_string(),
        })
    }
}

/// Arguments of the CSV status router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusArgs {
    pub file: String,
    /// Column index or header name
    pub column: String,
    pub prefix: Option<String>,
}

impl StatusArgs {
    pub const DEFAULT_FILE: &'static str = "urls.csv";
    pub const DEFAULT_COLUMN: &'static str = "0";

    /// Parse positional arguments (program name excluded).
    pub fn parse(args: &[String]) -> Result<Self, ConfigError> {
        if args.len() > 3 {
            return Err(ConfigError::InvalidArgument("too many arguments".into()));
        }
        let file = arg(args, 0).unwrap_or(Self::DEFAULT_FILE);
        if !file.to_ascii_lowercase().ends_with(".csv") {
            return Err(ConfigError::InvalidArgument(format!(
                "'{file}' must be a .csv file name"
            )));
        }
        let column = arg(args, 1).unwrap_or(Self::DEFAULT_COLUMN);
        let prefix = arg(args, 2).map(str::to_owned);

        Ok(Self {
            file: file.to_string(),
            column: column.to_string(),
            prefix,
        })
    }
}
