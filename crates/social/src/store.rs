//! Draft store - one JSONL file per category, topic and day.
//!
//! File names look like `digest_rust-async_2026-10-19.jsonl`, so sorting by
//! name sorts each topic chronologically.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::candidate::{DraftRecord, PostCandidate};
use crate::errors::StoreError;

/// Extension of draft files.
pub const DRAFT_EXTENSION: &str = "jsonl";

/// Reads and writes draft batches under a single directory.
#[derive(Debug, Clone)]
pub struct DraftStore {
    dir: PathBuf,
}

impl DraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Save a batch dated today (local time).
    pub fn save(
        &self,
        category: &str,
        topic: &str,
        candidates: &[PostCandidate],
    ) -> Result<PathBuf, StoreError> {
        self.save_dated(category, topic, Local::now().date_naive(), candidates)
    }

    /// Save a batch for an explicit date, replacing any file for that day.
    pub fn save_dated(
        &self,
        category: &str,
        topic: &str,
        date: NaiveDate,
        candidates: &[PostCandidate],
    ) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut content = String::new();
        for candidate in candidates {
            let line = serde_json::to_string(&DraftRecord::from(candidate))?;
            content.push_str(&line);
            content.push('\n');
        }

        let path = self.dir.join(file_name(category, topic, date));
        std::fs::write(&path, content).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!(path = %path.display(), count = candidates.len(), "Saved drafts");
        Ok(path)
    }

    /// Draft files, optionally only those of `category`, sorted by name.
    ///
    /// A missing directory has no drafts yet.
    pub fn list(&self, category: Option<&str>) -> Result<Vec<PathBuf>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let prefix = category.map(|c| format!("{}_", normalize_segment(c)));
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(DRAFT_EXTENSION)
            {
                continue;
            }
            let matches = match (&prefix, path.file_name().and_then(|n| n.to_str())) {
                (Some(prefix), Some(name)) => name.starts_with(prefix.as_str()),
                (None, Some(_)) => true,
                (_, None) => false,
            };
            if matches {
                paths.push(path);
            }
        }

        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths)
    }

    /// Read a batch back in file order; a missing file is an empty batch.
    pub fn load(path: &Path) -> Result<Vec<PostCandidate>, StoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str::<DraftRecord>(line)
                    .map(PostCandidate::from)
                    .map_err(|e| StoreError::Corrupt {
                        path: path.to_path_buf(),
                        line: i + 1,
                        reason: e.to_string(),
                    })
            })
            .collect()
    }
}

/// `<category>_<topic>_<YYYY-MM-DD>.jsonl`, both names normalized.
pub fn file_name(category: &str, topic: &str, date: NaiveDate) -> String {
    format!(
        "{}_{}_{}.{DRAFT_EXTENSION}",
        normalize_segment(category),
        normalize_segment(topic),
        date.format("%Y-%m-%d")
    )
}

/// Lowercase, with each run of non-alphanumeric characters turned into `-`.
///
/// The result never contains `_`, `/` or `.`, so it stays a single file name
/// segment.
pub fn normalize_segment(value: &str) -> String {
    let mut normalized = String::with_capacity(value.len());
    for c in value.trim().chars() {
        if c.is_alphanumeric() {
            normalized.extend(c.to_lowercase());
        } else if !normalized.is_empty() && !normalized.ends_with('-') {
            normalized.push('-');
        }
    }
    let normalized = normalized.trim_end_matches('-');
    if normalized.is_empty() {
        "untitled".to_string()
    } else {
        normalized.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn ranked(id: &str, text: &str, score: f64) -> PostCandidate {
        let mut candidate = PostCandidate::with_id(id, text);
        candidate.set_ranking(score, format!("reason for {id}"));
        candidate
    }

    #[test]
    fn test_normalize_segment() {
        assert_eq!(normalize_segment("Rust Async!"), "rust-async");
        assert_eq!(normalize_segment("  C++ / WebAssembly  "), "c-webassembly");
        assert_eq!(normalize_segment("Café Münster"), "café-münster");
        assert_eq!(normalize_segment("???"), "untitled");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            file_name("digest", "AI agents", date()),
            "digest_ai-agents_2026-10-19.jsonl"
        );
    }

    #[test]
    fn test_category_cannot_leave_store_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("drafts");
        let store = DraftStore::new(&dir);

        let escaped = store
            .save_dated("../outside", "rust", date(), &[PostCandidate::with_id("t1", "x")])
            .unwrap();
        assert_eq!(escaped.parent(), Some(dir.as_path()));
        assert_eq!(
            escaped.file_name().unwrap().to_string_lossy(),
            "outside_rust_2026-10-19.jsonl"
        );

        let path = store.save_dated("my_cat", "rust", date(), &[]).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "my-cat_rust_2026-10-19.jsonl"
        );
        assert_eq!(store.list(Some("my_cat")).unwrap(), vec![path]);
        assert!(store.list(Some("my")).unwrap().is_empty());
    }

    #[test]
    fn test_save_writes_one_record_per_line() {
        let tmp = TempDir::new().unwrap();
        let store = DraftStore::new(tmp.path().join("nested/drafts"));
        let path = store
            .save_dated(
                "digest",
                "rust",
                date(),
                &[ranked("t1", "x", 0.9), PostCandidate::with_id("t2", "y")],
            )
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], "t1");
        assert_eq!(lines[0]["score"], 0.9);
        assert!(lines[1]["score"].is_null());
        assert!(lines[1]["reason"].is_null());
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let tmp = TempDir::new().unwrap();
        let store = DraftStore::new(tmp.path());
        let batch = vec![
            ranked("t1", "first \"quoted\"\nline", 0.9),
            ranked("t2", "second", 0.4),
            PostCandidate::with_id("t3", "unranked"),
        ];
        let path = store.save_dated("digest", "rust", date(), &batch).unwrap();

        assert_eq!(DraftStore::load(&path).unwrap(), batch);
    }

    #[test]
    fn test_save_twice_overwrites() {
        let tmp = TempDir::new().unwrap();
        let store = DraftStore::new(tmp.path());
        store
            .save_dated("digest", "rust", date(), &[ranked("old", "old", 0.1)])
            .unwrap();
        let path = store
            .save_dated("digest", "rust", date(), &[ranked("new", "new", 0.2)])
            .unwrap();

        let loaded = DraftStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id(), "new");
        assert_eq!(store.list(None).unwrap().len(), 1);
    }

    #[test]
    fn test_list_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        let store = DraftStore::new(tmp.path());
        let later = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        store.save_dated("digest", "rust", later, &[]).unwrap();
        store.save_dated("digest", "rust", date(), &[]).unwrap();
        store.save_dated("thread", "rust", date(), &[]).unwrap();
        std::fs::write(tmp.path().join("digest_notes.txt"), "ignored").unwrap();

        let names: Vec<String> = store
            .list(Some("digest"))
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["digest_rust_2026-10-19.jsonl", "digest_rust_2026-10-20.jsonl"]
        );
        assert_eq!(store.list(None).unwrap().len(), 3);
    }

    #[test]
    fn test_missing_dir_and_file_are_empty() {
        let tmp = TempDir::new().unwrap();
        let store = DraftStore::new(tmp.path().join("absent"));
        assert!(store.list(None).unwrap().is_empty());
        assert!(DraftStore::load(&tmp.path().join("absent.jsonl"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_corrupt_line_reports_position() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("digest_x_2026-10-19.jsonl");
        std::fs::write(&path, "{\"id\":\"a\",\"text\":\"ok\"}\n\nnot json\n").unwrap();

        match DraftStore::load(&path).unwrap_err() {
            StoreError::Corrupt { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
