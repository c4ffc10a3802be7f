//! Results directory holding one flat file per destination.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::io::{AsyncFileOutput, AsyncOutputTarget};

/// Directory of per-destination output files named `<key>.<extension>`.
#[derive(Debug, Clone)]
pub struct ResultsDir {
    path: PathBuf,
    extension: String,
}

impl ResultsDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            extension: "txt".into(),
        }
    }

    /// Set the output file extension (without the leading dot).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Path of the file backing `key`.
    ///
    /// Distinct keys always map to distinct file names: `%`, characters that
    /// cannot appear in a file name, and control characters are written as
    /// `%XX` escapes. The names `.` and `..` have their dots escaped and the
    /// empty key becomes a lone `%`, which no escaped key can produce.
    pub fn file_for(&self, key: &str) -> PathBuf {
        let name = file_stem(key);
        if self.extension.is_empty() {
            self.path.join(name)
        } else {
            self.path.join(format!("{name}.{}", self.extension))
        }
    }

    /// Output target for `key`. Nothing touches the disk until it is opened.
    pub fn target_for(&self, key: &str) -> Arc<dyn AsyncOutputTarget> {
        Arc::new(AsyncFileOutput::new(self.file_for(key)))
    }

    /// Create the directory if needed and delete every file a previous run
    /// left in it. Returns the number of files removed.
    pub async fn prepare(&self) -> std::io::Result<usize> {
        tokio::fs::create_dir_all(&self.path).await?;

        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }

        debug!(dir = %self.path.display(), removed, "results directory prepared");
        Ok(removed)
    }
}

fn file_stem(key: &str) -> String {
    match key {
        "" => return "%".to_string(),
        "." | ".." => return key.replace('.', "%2E"),
        _ => {}
    }

    let mut name = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '%' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => {
                name.push_str(&format!("%{:02X}", c as u32));
            }
            c if c.is_control() => {
                let mut utf8 = [0u8; 4];
                for byte in c.encode_utf8(&mut utf8).bytes() {
                    name.push_str(&format!("%{byte:02X}"));
                }
            }
            c => name.push(c),
        }
    }
    name
}
