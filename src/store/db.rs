//! RocksDB wrapper used as the storage substrate for the resource store.

use rocksdb::{ColumnFamilyDescriptor, Options, DB};
use std::path::Path;
use std::sync::Arc;

use super::batch::BatchBuilder;
use super::column_families::all_column_families;
use super::iterator::PrefixIterator;
use crate::error::{Result, StoreError};

/// Embedded RocksDB storage wrapper. Cheap to clone (holds an `Arc<DB>`).
#[derive(Clone)]
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_level_compaction_dynamic_level_bytes(true);
        opts.set_max_background_jobs(4);

        let cf_descriptors = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;
        Ok(Self { db: Arc::new(db) })
    }

    #[cfg(test)]
    pub fn open_temp() -> (Self, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Self::open(dir.path()).expect("open temp db");
        (storage, dir)
    }

    pub fn cf_handle(&self, cf_name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(cf_name)
            .ok_or_else(|| StoreError::Internal(format!("column family not found: {cf_name}")))
    }

    pub fn get(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf_handle(cf_name)?;
        Ok(self.db.get_cf(cf, key)?)
    }

    pub fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.cf_handle(cf_name)?;
        Ok(self.db.put_cf(cf, key, value)?)
    }

    pub fn delete(&self, cf_name: &str, key: &[u8]) -> Result<()> {
        let cf = self.cf_handle(cf_name)?;
        Ok(self.db.delete_cf(cf, key)?)
    }

    pub fn batch(&self) -> BatchBuilder {
        BatchBuilder::new()
    }

    pub fn write_batch(&self, batch: BatchBuilder) -> Result<()> {
        Ok(self.db.write(batch.into_inner())?)
    }

    pub fn iter_prefix(&self, cf_name: &str, prefix: &[u8]) -> Result<PrefixIterator<'_>> {
        let cf = self.cf_handle(cf_name)?;
        let iter = self.db.raw_iterator_cf(cf);
        Ok(PrefixIterator::new(iter, prefix.to_vec()))
    }
}
