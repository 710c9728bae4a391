//! Export source backed by the directory the mail layer saves attachments to.
//!
//! Each qualifying file stands for one message: id = file stem, subject =
//! file name, date = modification date. Newest files come first.

use chrono::{DateTime, Local, NaiveDate};
use relay_core::{RelayError, Result};
use relay_ingest::{
    decode, lookup_header, Attachment, CanonicalField, ExportSource, MessageDescriptor,
    TextEncoding,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

use crate::config::SourceSection;

#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    extensions: Vec<String>,
    name_marker: String,
    max_age: Option<Duration>,
}

#[derive(Debug, Clone)]
struct Candidate {
    path: PathBuf,
    modified: SystemTime,
}

impl Candidate {
    fn message_id(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn date(&self) -> NaiveDate {
        DateTime::<Local>::from(self.modified).date_naive()
    }
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>, section: &SourceSection) -> Self {
        Self {
            dir: dir.into(),
            extensions: section
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            name_marker: section.name_marker.clone(),
            max_age: section
                .max_age_days
                .map(|days| Duration::from_secs(days * 24 * 60 * 60)),
        }
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|e| self.extensions.iter().any(|x| *x == e))
    }

    fn fresh_enough(&self, modified: SystemTime) -> bool {
        match self.max_age {
            None => true,
            Some(max) => SystemTime::now()
                .duration_since(modified)
                .map(|age| age <= max)
                .unwrap_or(true),
        }
    }

    /// Exports only: a name carrying the marker, or a first line with an
    /// amount or merchant header.
    fn looks_like_export(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !self.name_marker.is_empty() && name.contains(&self.name_marker) {
            return true;
        }
        let Ok(bytes) = fs::read(path) else {
            return false;
        };
        let Ok(text) = decode(&bytes, TextEncoding::Auto) else {
            return false;
        };
        let Some(first) = text.lines().find(|l| !l.trim().is_empty()) else {
            return false;
        };
        first
            .split([',', ';', '\t', '|'])
            .map(|h| h.trim().trim_matches('"'))
            .flat_map(lookup_header)
            .any(|(field, _)| matches!(field, CanonicalField::Amount | CanonicalField::Merchant))
    }

    fn candidates(&self) -> Result<Vec<Candidate>> {
        if !self.dir.is_dir() {
            return Err(RelayError::NotFound(format!(
                "export directory {} does not exist",
                self.dir.display()
            )));
        }

        let mut out = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || !self.has_extension(&path) {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            if !self.fresh_enough(modified) {
                continue;
            }
            if !self.looks_like_export(&path) {
                debug!(path = %path.display(), "not an expense export");
                continue;
            }
            out.push(Candidate { path, modified });
        }
        // newest first; name breaks ties so listing order is stable
        out.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
        Ok(out)
    }
}

impl ExportSource for DirectorySource {
    fn list(&self, limit: usize) -> Result<Vec<MessageDescriptor>> {
        Ok(self
            .candidates()?
            .into_iter()
            .take(limit)
            .map(|c| MessageDescriptor {
                message_id: c.message_id(),
                subject: c.file_name(),
                date: Some(c.date()),
                attachments: vec![c.file_name()],
            })
            .collect())
    }

    fn fetch(&self, message_id: Option<&str>) -> Result<Attachment> {
        let candidates = self.candidates()?;
        let found = match message_id {
            None => candidates.into_iter().next(),
            Some(id) => candidates.into_iter().find(|c| c.message_id() == id),
        };
        let Some(c) = found else {
            return Err(match message_id {
                Some(id) => RelayError::NotFound(format!("no export named '{id}' in {}", self.dir.display())),
                None => RelayError::NotFound(format!("no expense export found in {}", self.dir.display())),
            });
        };
        let bytes = fs::read(&c.path)?;
        Ok(Attachment {
            source_id: c.message_id(),
            name: c.file_name(),
            received: Some(c.date()),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn write_at(dir: &Path, name: &str, body: &str, age_secs: u64) {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    fn source(dir: &Path) -> DirectorySource {
        DirectorySource::new(dir, &SourceSection::default())
    }

    #[test]
    fn test_newest_export_first_and_non_exports_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write_at(tmp.path(), "january.csv", "Merchant,Amount\nCafe,1\n", 3600);
        write_at(tmp.path(), "february.csv", "Date;Total\n2024-02-01;2\n", 60);
        write_at(tmp.path(), "contacts.csv", "Name,Email\nA,a@b\n", 10);
        write_at(tmp.path(), "notes.txt", "Merchant,Amount\n", 5);

        let src = source(tmp.path());
        let listed = src.list(10).unwrap();
        let ids: Vec<_> = listed.iter().map(|d| d.message_id.as_str()).collect();
        assert_eq!(ids, vec!["february", "january"]);
        assert_eq!(listed[0].attachments, vec!["february.csv".to_string()]);

        let latest = src.fetch(None).unwrap();
        assert_eq!(latest.source_id, "february");
        assert!(latest.received.is_some());

        let jan = src.fetch(Some("january")).unwrap();
        assert_eq!(jan.bytes, b"Merchant,Amount\nCafe,1\n");
    }

    #[test]
    fn test_name_marker_bypasses_sniffing() {
        let tmp = tempfile::tempdir().unwrap();
        write_at(tmp.path(), "Expensify_Export_01.csv", "\n", 10);
        let listed = source(tmp.path()).list(10).unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn test_max_age_filters_old_files() {
        let tmp = tempfile::tempdir().unwrap();
        write_at(tmp.path(), "old.csv", "Amount\n1\n", 3 * 24 * 3600);
        let section = SourceSection {
            max_age_days: Some(1),
            ..SourceSection::default()
        };
        let src = DirectorySource::new(tmp.path(), &section);
        assert!(src.list(10).unwrap().is_empty());
        assert!(matches!(src.fetch(None), Err(RelayError::NotFound(_))));
    }

    #[test]
    fn test_missing_directory_and_unknown_id() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = source(&tmp.path().join("nope"));
        assert!(matches!(missing.list(5), Err(RelayError::NotFound(_))));

        write_at(tmp.path(), "a.csv", "Amount\n1\n", 1);
        assert!(matches!(
            source(tmp.path()).fetch(Some("b")),
            Err(RelayError::NotFound(_))
        ));
    }
}
