use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BenchError, Result};

/// Persists raw agent event streams, one `.jsonl` file per invocation
#[derive(Debug, Clone)]
pub struct TranscriptWriter {
    pub base_dir: PathBuf,
}

impl TranscriptWriter {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        if !base_dir.exists() {
            fs::create_dir_all(&base_dir)
                .map_err(|e| BenchError::failed(&format!("create {}", base_dir.display()), e))?;
        }
        Ok(Self { base_dir })
    }

    /// Path a transcript with this label is written to
    pub fn path_for(&self, label: &str) -> PathBuf {
        self.base_dir.join(format!("{}.jsonl", sanitize_label(label)))
    }

    pub fn write_raw(&self, label: &str, content: &str) -> Result<PathBuf> {
        let path = self.path_for(label);
        fs::write(&path, content)
            .map_err(|e| BenchError::failed(&format!("write {}", path.display()), e))?;
        Ok(path)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// Reduce a label to a safe file stem
pub fn sanitize_label(label: &str) -> String {
    let stem: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_matches('.');
    if stem.is_empty() {
        "transcript".to_string()
    } else {
        stem.to_string()
    }
}
