//! Journal source reading a Day One JSON export.
//!
//! The path may be the export file itself or a directory; for a directory the
//! first `*.json` file by name is used.

use crate::ingest::normalize::JournalEntry;
use crate::ingest::source::{JournalSource, SourceError, SourceResult};
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct DayOneExport {
    entries: Option<Vec<JournalEntry>>,
}

#[derive(Debug, Clone)]
pub struct DayOneExportSource {
    path: PathBuf,
}

impl DayOneExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolves the export file to read.
    pub fn export_file(&self) -> SourceResult<PathBuf> {
        if !self.path.is_dir() {
            return Ok(self.path.clone());
        }

        let listing = std::fs::read_dir(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let mut candidates = Vec::new();
        for item in listing {
            let item = item.map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
            let path = item.path();
            if is_json(&path) && path.is_file() {
                candidates.push(path);
            }
        }
        candidates.sort();
        candidates.into_iter().next().ok_or_else(|| {
            SourceError::NotFound(format!("no JSON files in {}", self.path.display()))
        })
    }
}

impl JournalSource for DayOneExportSource {
    fn load_entries(&self) -> SourceResult<Vec<JournalEntry>> {
        let file = self.export_file()?;
        let text = std::fs::read_to_string(&file).map_err(|source| SourceError::Io {
            path: file.clone(),
            source,
        })?;
        let export: DayOneExport =
            serde_json::from_str(&text).map_err(|source| SourceError::Parse {
                path: file.clone(),
                source,
            })?;
        let entries = export.entries.ok_or_else(|| {
            SourceError::NotFound(format!("no entries in {}", file.display()))
        })?;

        info!(
            "event=journal_load module=ingest status=ok entries={}",
            entries.len()
        );
        Ok(entries)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::DayOneExportSource;
    use crate::ingest::source::{JournalSource, SourceError};
    use tempfile::tempdir;

    const EXPORT: &str = r#"{
        "metadata": {"version": "1.0"},
        "entries": [
            {
                "uuid": "A1",
                "creationDate": "2024-03-02T07:15:00Z",
                "text": "Long run by the river",
                "tags": ["Run"],
                "location": {"placeName": "Riverside"},
                "sentiment": {"polarity": 0.6, "subjectivity": 0.4, "emotion": "joy"}
            },
            {"uuid": "A2", "creationDate": "2024-03-03T21:00:00Z", "text": "Tired"}
        ]
    }"#;

    #[test]
    fn directory_uses_first_json_by_name() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), r#"{"entries": []}"#).unwrap();
        std::fs::write(dir.path().join("a.json"), EXPORT).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let entries = DayOneExportSource::new(dir.path()).load_entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].uuid.as_deref(), Some("A1"));
        let sentiment = entries[0].sentiment.as_ref().unwrap();
        assert_eq!(sentiment.emotion.as_deref(), Some("joy"));
        assert!(entries[1].sentiment.is_none());
    }

    #[test]
    fn export_without_entries_is_not_found() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("journal.json");
        std::fs::write(&file, r#"{"metadata": {}}"#).unwrap();
        let err = DayOneExportSource::new(&file).load_entries().unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[test]
    fn empty_directory_is_not_found() {
        let dir = tempdir().unwrap();
        let err = DayOneExportSource::new(dir.path()).load_entries().unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }
}
