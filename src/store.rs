use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::AppError;
use crate::record::AnnotationRecord;

// Repository over a single JSON file. The whole map is read once and
// rewritten wholesale, like the local-storage object it replaces.
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> HashMap<String, AnnotationRecord> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::trace!("No metadata store at {:?}, starting empty", self.path);
                return HashMap::new();
            }
            Err(e) => {
                log::warn!("Error reading metadata store {:?}: {}", self.path, e);
                return HashMap::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Error parsing metadata store {:?}: {}", self.path, e);
                HashMap::new()
            }
        }
    }

    pub fn save(&self, records: &HashMap<String, AnnotationRecord>) -> Result<(), AppError> {
        let serialized = serde_json::to_string_pretty(records)?;
        std::fs::write(&self.path, serialized)?;
        log::debug!("Saved {} records to {:?}", records.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::generate_file_id;
    use chrono::{NaiveDate, Utc};

    fn temp_store() -> MetadataStore {
        let path = std::env::temp_dir().join(format!("annotation-store-{}.json", generate_file_id()));
        MetadataStore::new(path)
    }

    fn sample_record(id: &str) -> AnnotationRecord {
        AnnotationRecord {
            id: id.to_string(),
            file_name: "alpha.html".to_string(),
            original_name: "notes.html".to_string(),
            created: Utc::now(),
            expiry: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            slug: "alpha".to_string(),
            description: "a record".to_string(),
            public_url: "https://annotationhub.com/annotations/alpha/".to_string(),
            file_size: "1.5 KB".to_string(),
            custom_image: false,
            preview_title: "Alpha".to_string(),
            preview_description: "a record".to_string(),
        }
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let store = temp_store();
        assert!(store.load().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = temp_store();
        let mut records = HashMap::new();
        records.insert("id1".to_string(), sample_record("id1"));
        store.save(&records).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        let record = &loaded["id1"];
        assert_eq!(record.slug, "alpha");
        assert_eq!(record.file_size, "1.5 KB");
        assert!(!record.custom_image);

        std::fs::remove_file(&store.path).unwrap();
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let store = temp_store();
        std::fs::write(&store.path, "definitely not json").unwrap();
        assert!(store.load().is_empty());
        std::fs::remove_file(&store.path).unwrap();
    }
}
