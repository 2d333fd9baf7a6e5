use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use std::collections::HashSet;

use crate::log_record::LogRecord;
use crate::log_store::{LogStore, StoreError, StoreResult};

/// Separates the partition value from the sequence number in index keys.
const INDEX_KEY_SEPARATOR: u8 = 0;

/// A sled-backed implementation of LogStore.
///
/// Records live in one tree named after the table. The secondary index is a
/// second tree whose keys are `partition_key ++ 0x00 ++ sequence` with a
/// big-endian sequence from `Db::generate_id`, so a reverse prefix scan
/// yields the partition newest-first.
pub struct SledLogStore {
    db: Db,
    records: Tree,
    index: Tree,
    index_name: String,
}

impl SledLogStore {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: &str, table_name: &str, index_name: &str) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::with_db(db, table_name, index_name)
    }

    pub fn with_db(db: Db, table_name: &str, index_name: &str) -> StoreResult<Self> {
        let records = db.open_tree(table_name)?;
        let index = db.open_tree(index_name)?;
        tracing::debug!(table = table_name, index = index_name, "opened sled log store");

        Ok(Self {
            db,
            records,
            index,
            index_name: index_name.to_string(),
        })
    }

    fn index_prefix(partition_key: &str) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(partition_key.len() + 1);
        prefix.extend_from_slice(partition_key.as_bytes());
        prefix.push(INDEX_KEY_SEPARATOR);
        prefix
    }

    fn index_key(partition_key: &str, sequence: u64) -> Vec<u8> {
        let mut key = Self::index_prefix(partition_key);
        key.extend_from_slice(&sequence.to_be_bytes());
        key
    }
}

impl LogStore for SledLogStore {
    fn put(&self, record: &LogRecord) -> StoreResult<()> {
        let value = serde_json::to_vec(record)?;
        let index_key = Self::index_key(&record.partition_key, self.db.generate_id()?);

        (&self.records, &self.index)
            .transaction(|(records, index)| {
                records.insert(record.id.as_bytes(), value.as_slice())?;
                index.insert(index_key.as_slice(), record.id.as_bytes())?;
                Ok::<(), ConflictableTransactionError<()>>(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(()) => StoreError::Transaction(format!("put {}", record.id)),
                TransactionError::Storage(err) => StoreError::Database(err),
            })?;

        self.db.flush()?;
        Ok(())
    }

    fn query_recent(
        &self,
        index_name: &str,
        partition_key: &str,
        limit: usize,
    ) -> StoreResult<Vec<LogRecord>> {
        if index_name != self.index_name {
            return Err(StoreError::UnknownIndex(index_name.to_string()));
        }

        let mut results = Vec::new();
        let mut seen = HashSet::new();
        for entry in self.index.scan_prefix(Self::index_prefix(partition_key)).rev() {
            if results.len() == limit {
                break;
            }
            let (_, id) = entry?;
            // An overwritten id keeps its older index entry; the newest one wins.
            if !seen.insert(id.clone()) {
                continue;
            }
            match self.records.get(&id)? {
                Some(bytes) => results.push(serde_json::from_slice(&bytes)?),
                None => tracing::warn!(
                    id = %String::from_utf8_lossy(&id),
                    "index entry without a record"
                ),
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_record::Severity;

    fn temp_store() -> SledLogStore {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .expect("temporary sled db");
        SledLogStore::with_db(db, "logs", "by_partition").expect("store")
    }

    #[test]
    fn put_then_query_returns_record() {
        let store = temp_store();
        let record = LogRecord::new(Severity::Error, "disk full", "p");
        store.put(&record).unwrap();

        let found = store.query_recent("by_partition", "p", 100).unwrap();
        assert_eq!(found, vec![record]);
    }

    #[test]
    fn query_is_newest_first_and_capped() {
        let store = temp_store();
        let written: Vec<LogRecord> = (0..5)
            .map(|i| {
                let record = LogRecord::new(Severity::Info, format!("m{i}"), "p");
                store.put(&record).unwrap();
                record
            })
            .collect();

        let found = store.query_recent("by_partition", "p", 3).unwrap();
        let messages: Vec<&str> = found.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["m4", "m3", "m2"]);
        assert_eq!(found[0].id, written[4].id);
    }

    #[test]
    fn query_only_sees_its_partition() {
        let store = temp_store();
        store.put(&LogRecord::new(Severity::Info, "mine", "p")).unwrap();
        store.put(&LogRecord::new(Severity::Info, "other", "p2")).unwrap();

        let found = store.query_recent("by_partition", "p", 100).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "mine");
    }

    #[test]
    fn unknown_index_is_a_store_error() {
        let store = temp_store();
        let err = store.query_recent("missing", "p", 100).unwrap_err();
        assert!(matches!(err, StoreError::UnknownIndex(ref name) if name == "missing"));
    }

    #[test]
    fn empty_partition_yields_empty_vec() {
        let store = temp_store();
        assert!(store.query_recent("by_partition", "p", 100).unwrap().is_empty());
    }

    #[test]
    fn put_writes_record_and_index_together() {
        let store = temp_store();
        store.put(&LogRecord::new(Severity::Info, "a", "p")).unwrap();
        store.put(&LogRecord::new(Severity::Info, "b", "p")).unwrap();

        assert_eq!(store.records.len(), 2);
        assert_eq!(store.index.len(), 2);
        for entry in store.index.iter() {
            let (_, id) = entry.unwrap();
            assert!(store.records.contains_key(&id).unwrap());
        }
    }

    #[test]
    fn orphaned_index_entry_is_skipped() {
        let store = temp_store();
        let kept = LogRecord::new(Severity::Info, "kept", "p");
        let orphan = LogRecord::new(Severity::Error, "orphan", "p");
        store.put(&kept).unwrap();
        store.put(&orphan).unwrap();

        store.records.remove(orphan.id.as_bytes()).unwrap();

        let found = store.query_recent("by_partition", "p", 100).unwrap();
        assert_eq!(found, vec![kept]);
    }

    #[test]
    fn overwrite_by_same_id_leaves_one_record() {
        let store = temp_store();
        let first = LogRecord::new(Severity::Info, "first", "p");
        let second = LogRecord {
            message: "second".to_string(),
            ..first.clone()
        };
        store.put(&first).unwrap();
        store.put(&second).unwrap();

        assert_eq!(store.records.len(), 1);
        let found = store.query_recent("by_partition", "p", 100).unwrap();
        assert_eq!(found, vec![second]);
    }

    #[test]
    fn second_open_of_same_directory_is_refused() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().to_str().unwrap();

        let _first = SledLogStore::open(path, "logs", "by_partition").unwrap();
        let second = SledLogStore::open(path, "logs", "by_partition");
        assert!(matches!(second, Err(StoreError::Database(_))));
    }
}
