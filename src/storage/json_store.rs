//! JSON-based report storage.
//!
//! Stores each scan report as a separate JSON file named by its `ScanId`.
//! Supports listing, prefix lookup and deletion.

use crate::error::{StorageError, StorageResult};
use crate::scanner::ScanReport;
use crate::types::ScanId;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// JSON file-based report storage.
pub struct ReportStore {
    reports_dir: PathBuf,
}

impl ReportStore {
    /// Open the store, creating the directory if needed.
    pub fn open(reports_dir: impl AsRef<Path>) -> StorageResult<Self> {
        let reports_dir = reports_dir.as_ref().to_path_buf();
        fs::create_dir_all(&reports_dir)
            .map_err(|e| StorageError::DirectoryError(e.to_string()))?;

        Ok(Self { reports_dir })
    }

    /// Save a report, replacing any earlier file with the same id.
    pub fn save(&self, report: &ScanReport) -> StorageResult<PathBuf> {
        let file = self.report_file(&report.id);
        let content = serde_json::to_string_pretty(report)?;

        fs::write(&file, content).map_err(|e| StorageError::SaveFailed(e.to_string()))?;
        debug!(id = %report.id, path = %file.display(), "saved report");
        Ok(file)
    }

    /// Load a report by id.
    pub fn load(&self, id: &ScanId) -> StorageResult<ScanReport> {
        let file = self.report_file(id);

        if !file.exists() {
            return Err(StorageError::ReportNotFound(id.to_string()));
        }

        let content =
            fs::read_to_string(&file).map_err(|e| StorageError::LoadFailed(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| StorageError::LoadFailed(e.to_string()))
    }

    /// Find a report by id prefix, as shown by `history`.
    pub fn find_by_prefix(&self, prefix: &str) -> StorageResult<ScanReport> {
        let matches: Vec<_> = self
            .list_ids()?
            .into_iter()
            .filter(|id| id.matches_prefix(prefix))
            .collect();

        match matches.as_slice() {
            [] => Err(StorageError::ReportNotFound(prefix.to_string())),
            [id] => self.load(id),
            _ => Err(StorageError::AmbiguousPrefix {
                prefix: prefix.to_string(),
                matches: matches.len(),
            }),
        }
    }

    /// Ids of every stored report, in no particular order.
    pub fn list_ids(&self) -> StorageResult<Vec<ScanId>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.reports_dir)
            .map_err(|e| StorageError::DirectoryError(e.to_string()))?
        {
            let entry = entry.map_err(|e| StorageError::DirectoryError(e.to_string()))?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem() {
                    if let Ok(id) = stem.to_string_lossy().parse::<ScanId>() {
                        ids.push(id);
                    }
                }
            }
        }

        Ok(ids)
    }

    /// All reports, most recent first. Unreadable files are skipped.
    pub fn list(&self) -> StorageResult<Vec<ScanReport>> {
        let mut reports = Vec::new();

        for id in self.list_ids()? {
            match self.load(&id) {
                Ok(report) => reports.push(report),
                Err(e) => warn!(id = %id, error = %e, "skipping unreadable report"),
            }
        }

        reports.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(reports)
    }

    /// The `count` most recent reports.
    pub fn list_recent(&self, count: usize) -> StorageResult<Vec<ScanReport>> {
        let mut reports = self.list()?;
        reports.truncate(count);
        Ok(reports)
    }

    /// Delete a report.
    pub fn delete(&self, id: &ScanId) -> StorageResult<()> {
        let file = self.report_file(id);

        if !file.exists() {
            return Err(StorageError::ReportNotFound(id.to_string()));
        }

        fs::remove_file(&file).map_err(|e| StorageError::SaveFailed(e.to_string()))
    }

    fn report_file(&self, id: &ScanId) -> PathBuf {
        self.reports_dir.join(format!("{}.json", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{FailureReason, ReportAggregator, ScanOutcome, ScanTarget};
    use crate::types::Port;

    fn report() -> ScanReport {
        let aggregator = ReportAggregator::new();
        aggregator.record(
            0,
            ScanOutcome::success(&ScanTarget::new("10.0.0.1", "lab"), Port::SSH, "root", Vec::new()),
        );
        aggregator.record(
            1,
            ScanOutcome::failure(&ScanTarget::new("10.0.0.2", "lab"), FailureReason::Timeout),
        );
        aggregator.finalize()
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::open(dir.path().join("reports")).unwrap();
        let report = report();

        store.save(&report).unwrap();
        let loaded = store.load(&report.id).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.outcomes, report.outcomes);
    }

    #[test]
    fn test_find_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::open(dir.path()).unwrap();
        let report = report();
        store.save(&report).unwrap();

        let found = store.find_by_prefix(&report.id.short()).unwrap();
        assert_eq!(found.id, report.id);

        assert!(matches!(
            store.find_by_prefix("zzzz"),
            Err(StorageError::ReportNotFound(_))
        ));
    }

    #[test]
    fn test_ambiguous_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::open(dir.path()).unwrap();
        store.save(&report()).unwrap();
        store.save(&report()).unwrap();

        assert!(matches!(
            store.find_by_prefix(""),
            Err(StorageError::AmbiguousPrefix { matches: 2, .. })
        ));
    }

    #[test]
    fn test_list_newest_first_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::open(dir.path()).unwrap();
        let older = report();
        let newer = report();
        store.save(&older).unwrap();
        store.save(&newer).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].started_at >= listed[1].started_at);
        assert_eq!(store.list_recent(1).unwrap().len(), 1);

        store.delete(&older.id).unwrap();
        assert_eq!(store.list_ids().unwrap(), vec![newer.id]);
        assert!(store.delete(&older.id).is_err());
    }
}
