//! The resource-store facade: wires together the schema registry, document
//! shredder, table layout, search compiler, and listener engine over a
//! single RocksDB-backed [`Storage`]. One struct holds storage plus the
//! schema registry and exposes the whole CRUD-plus-search surface.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::error::{Result, StoreError};
use crate::id::get_new_id;
use crate::layout::ensure_layout;
use crate::listeners::{select_for_create, select_for_update_or_delete};
use crate::schema::prototype;
use crate::schema::SchemaRegistry;
use crate::search::{compiler, parser};
use crate::shredder::iter_lists;
use crate::store::column_families::{CF_AUX, CF_CHANGES, CF_FILES, CF_LAYOUT, CF_RESOURCES};
use crate::store::db::Storage;
use crate::store::keys::{
    encode_aux_key, encode_aux_resource_prefix, encode_aux_subpath_prefix, encode_change_key,
    encode_file_key, encode_resource_key, encode_resource_prefix,
};
use crate::types::{Change, ChangeType, Listener, Resource, ResourceTypeSchema};

/// The built-in type name listeners are stored under.
pub const LISTENER_TYPE: &str = "listener";

#[derive(serde::Serialize, serde::Deserialize)]
struct StoredRecord {
    revision: String,
    data: Value,
    #[serde(default)]
    subpaths: HashMap<String, Value>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct StoredFile {
    content_type: String,
    blob: Vec<u8>,
}

pub struct Database {
    storage: Storage,
    schemas: SchemaRegistry,
    write_lock: Mutex<()>,
}

impl Database {
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let storage = Storage::open(path)?;
        let db = Self {
            storage,
            schemas: SchemaRegistry::new(),
            write_lock: Mutex::new(()),
        };
        db.schemas.register(builtin_listener_schema());
        Ok(db)
    }

    #[cfg(test)]
    pub fn open_temp() -> (Self, tempfile::TempDir) {
        let (storage, dir) = Storage::open_temp();
        let db = Self {
            storage,
            schemas: SchemaRegistry::new(),
            write_lock: Mutex::new(()),
        };
        db.schemas.register(builtin_listener_schema());
        (db, dir)
    }

    pub fn register_schema(&self, schema: ResourceTypeSchema) {
        self.schemas.register(schema);
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    fn next_sequence(&self, resource_type: &str) -> Result<u64> {
        let key = format!("{resource_type}\0__seq__");
        let current = match self.storage.get(CF_LAYOUT, key.as_bytes())? {
            Some(bytes) => std::str::from_utf8(&bytes)
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0),
            None => 0,
        };
        let next = current + 1;
        self.storage
            .put(CF_LAYOUT, key.as_bytes(), next.to_string().as_bytes())?;
        Ok(next)
    }

    fn load_record(&self, resource_type: &str, id: &str) -> Result<StoredRecord> {
        let key = encode_resource_key(resource_type, id);
        let bytes = self.storage.get(CF_RESOURCES, &key)?.ok_or_else(|| {
            StoreError::ResourceNotFound {
                resource_type: resource_type.to_string(),
                id: id.to_string(),
            }
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn rebuild_aux(&self, resource_type: &str, id: &str, subpath: &str, data: &Value) -> Result<()> {
        let aux_cf = self.storage.cf_handle(CF_AUX)?;
        let mut batch = self.storage.batch();
        for (old_key, _) in self
            .storage
            .iter_prefix(CF_AUX, &encode_aux_subpath_prefix(resource_type, id, subpath))?
        {
            batch.delete(aux_cf, &old_key);
        }
        for (path, items) in iter_lists(data) {
            let path_str = path.join(".");
            for (i, item) in items.iter().enumerate() {
                let key = encode_aux_key(resource_type, id, subpath, &path_str, i);
                batch.put(aux_cf, &key, &serde_json::to_vec(item)?);
            }
        }
        self.storage.write_batch(batch)?;
        Ok(())
    }

    fn append_change(
        &self,
        resource_type: &str,
        resource_id: &str,
        resource_revision: Option<&str>,
        change_type: ChangeType,
        data: &Value,
    ) -> Result<Change> {
        let all = self.all_listeners(resource_type)?;
        let listeners = match change_type {
            ChangeType::Created => select_for_create(&all, resource_type),
            ChangeType::Updated | ChangeType::Deleted => {
                select_for_update_or_delete(&all, resource_type, resource_id)
            }
        };
        let sequence = self.next_sequence(resource_type)?;
        let change = Change {
            id: format!("{resource_type}-change-{sequence}"),
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            resource_revision: resource_revision.map(|s| s.to_string()),
            change_type,
            timestamp: chrono::Utc::now(),
            listeners,
            data: data.clone(),
        };
        let key = encode_change_key(resource_type, sequence);
        self.storage
            .put(CF_CHANGES, &key, &serde_json::to_vec(&change)?)?;
        Ok(change)
    }

    /// Creates a new resource of `resource_type`, returning its assigned id
    /// and revision.
    #[instrument(skip(self, data))]
    pub fn create(&self, resource_type: &str, data: Value) -> Result<Resource> {
        let schema = self.schemas.get(resource_type)?;
        let data = prototype::validate(&schema.prototype, &data)?;

        let _guard = self.write_lock.lock().expect("write lock poisoned");
        if ensure_layout(&self.storage, resource_type)? {
            info!(resource_type, "registered new resource type layout");
        }

        let id = get_new_id(resource_type);
        let revision = get_new_id(resource_type);
        let record = StoredRecord {
            revision: revision.clone(),
            data: data.clone(),
            subpaths: HashMap::new(),
        };

        self.storage.put(
            CF_RESOURCES,
            &encode_resource_key(resource_type, &id),
            &serde_json::to_vec(&record)?,
        )?;
        self.rebuild_aux(resource_type, &id, "", &data)?;
        self.append_change(resource_type, &id, Some(&revision), ChangeType::Created, &data)?;

        debug!(resource_type, id, "created resource");
        Ok(Resource { id, revision, data })
    }

    pub fn get(&self, resource_type: &str, id: &str) -> Result<Resource> {
        let record = self.load_record(resource_type, id)?;
        Ok(Resource {
            id: id.to_string(),
            revision: record.revision,
            data: record.data,
        })
    }

    pub fn list(&self, resource_type: &str) -> Result<Vec<String>> {
        if !self.schemas.has(resource_type) {
            return Err(StoreError::ResourceTypeNotFound(resource_type.to_string()));
        }
        let prefix = encode_resource_prefix(resource_type);
        Ok(self
            .storage
            .iter_prefix(CF_RESOURCES, &prefix)?
            .filter_map(|(key, _)| {
                std::str::from_utf8(&key[prefix.len()..])
                    .ok()
                    .map(|s| s.to_string())
            })
            .collect())
    }

    /// Updates a resource, conditioned on `expected_revision` matching the
    /// stored revision.
    #[instrument(skip(self, data))]
    pub fn put(
        &self,
        resource_type: &str,
        id: &str,
        data: Value,
        expected_revision: &str,
    ) -> Result<Resource> {
        let schema = self.schemas.get(resource_type)?;
        let data = prototype::validate(&schema.prototype, &data)?;

        let _guard = self.write_lock.lock().expect("write lock poisoned");
        let current = self.load_record(resource_type, id)?;
        if current.revision != expected_revision {
            return Err(StoreError::WrongRevision {
                id: id.to_string(),
                current: current.revision,
                update: expected_revision.to_string(),
            });
        }

        let new_revision = get_new_id(resource_type);
        let record = StoredRecord {
            revision: new_revision.clone(),
            data: data.clone(),
            subpaths: current.subpaths,
        };
        self.storage.put(
            CF_RESOURCES,
            &encode_resource_key(resource_type, id),
            &serde_json::to_vec(&record)?,
        )?;
        self.rebuild_aux(resource_type, id, "", &data)?;
        self.append_change(resource_type, id, Some(&new_revision), ChangeType::Updated, &data)?;

        Ok(Resource {
            id: id.to_string(),
            revision: new_revision,
            data,
        })
    }

    #[instrument(skip(self))]
    pub fn delete(&self, resource_type: &str, id: &str, expected_revision: &str) -> Result<()> {
        let _guard = self.write_lock.lock().expect("write lock poisoned");
        let current = self.load_record(resource_type, id)?;
        if current.revision != expected_revision {
            return Err(StoreError::WrongRevision {
                id: id.to_string(),
                current: current.revision,
                update: expected_revision.to_string(),
            });
        }

        self.storage
            .delete(CF_RESOURCES, &encode_resource_key(resource_type, id))?;
        let aux_cf = self.storage.cf_handle(CF_AUX)?;
        let mut batch = self.storage.batch();
        for (key, _) in self
            .storage
            .iter_prefix(CF_AUX, &encode_aux_resource_prefix(resource_type, id))?
        {
            batch.delete(aux_cf, &key);
        }
        self.storage.write_batch(batch)?;

        self.append_change(
            resource_type,
            id,
            None,
            ChangeType::Deleted,
            &current.data,
        )?;
        Ok(())
    }

    pub fn get_subpath(&self, resource_type: &str, id: &str, subpath: &str) -> Result<Value> {
        let record = self.load_record(resource_type, id)?;
        record
            .subpaths
            .get(subpath)
            .cloned()
            .ok_or_else(|| StoreError::ResourceNotFound {
                resource_type: format!("{resource_type}/{subpath}"),
                id: id.to_string(),
            })
    }

    pub fn put_subpath(
        &self,
        resource_type: &str,
        id: &str,
        subpath: &str,
        data: Value,
        expected_revision: &str,
    ) -> Result<Resource> {
        let schema = self.schemas.get(resource_type)?;
        let subschema = schema.subpaths.get(subpath).ok_or_else(|| {
            StoreError::ResourceTypeNotFound(format!("{resource_type}/{subpath}"))
        })?;
        let data = prototype::validate(&subschema.prototype, &data)?;

        let _guard = self.write_lock.lock().expect("write lock poisoned");
        let mut current = self.load_record(resource_type, id)?;
        if current.revision != expected_revision {
            return Err(StoreError::WrongRevision {
                id: id.to_string(),
                current: current.revision,
                update: expected_revision.to_string(),
            });
        }
        current.subpaths.insert(subpath.to_string(), data.clone());
        let new_revision = get_new_id(resource_type);
        let record = StoredRecord {
            revision: new_revision.clone(),
            data: current.data.clone(),
            subpaths: current.subpaths,
        };
        self.storage.put(
            CF_RESOURCES,
            &encode_resource_key(resource_type, id),
            &serde_json::to_vec(&record)?,
        )?;
        self.rebuild_aux(resource_type, id, subpath, &data)?;
        self.append_change(
            resource_type,
            id,
            Some(&new_revision),
            ChangeType::Updated,
            &record.data,
        )?;

        Ok(Resource {
            id: id.to_string(),
            revision: new_revision,
            data: record.data,
        })
    }

    /// Fetches a file sub-path's bytes, content-type, and the owning
    /// resource's current revision.
    pub fn get_file(&self, resource_type: &str, id: &str, subpath: &str) -> Result<(Vec<u8>, String, String)> {
        let record = self.load_record(resource_type, id)?;
        let key = encode_file_key(resource_type, id, subpath);
        let stored = self
            .storage
            .get(CF_FILES, &key)?
            .ok_or_else(|| StoreError::ResourceNotFound {
                resource_type: format!("{resource_type}/{subpath}"),
                id: id.to_string(),
            })?;
        let file: StoredFile = serde_json::from_slice(&stored)?;
        Ok((file.blob, file.content_type, record.revision))
    }

    /// Writes a file sub-path, conditioned on `expected_revision` matching
    /// the owning resource's current revision. Bumps that revision, since
    /// revision covers the whole resource including its file sub-paths.
    pub fn put_file(
        &self,
        resource_type: &str,
        id: &str,
        subpath: &str,
        content_type: &str,
        blob: &[u8],
        expected_revision: &str,
    ) -> Result<Resource> {
        let _guard = self.write_lock.lock().expect("write lock poisoned");
        let current = self.load_record(resource_type, id)?;
        if current.revision != expected_revision {
            return Err(StoreError::WrongRevision {
                id: id.to_string(),
                current: current.revision,
                update: expected_revision.to_string(),
            });
        }

        let file = StoredFile {
            content_type: content_type.to_string(),
            blob: blob.to_vec(),
        };
        self.storage.put(
            CF_FILES,
            &encode_file_key(resource_type, id, subpath),
            &serde_json::to_vec(&file)?,
        )?;

        let new_revision = get_new_id(resource_type);
        let record = StoredRecord {
            revision: new_revision.clone(),
            data: current.data.clone(),
            subpaths: current.subpaths,
        };
        self.storage.put(
            CF_RESOURCES,
            &encode_resource_key(resource_type, id),
            &serde_json::to_vec(&record)?,
        )?;
        self.append_change(
            resource_type,
            id,
            Some(&new_revision),
            ChangeType::Updated,
            &record.data,
        )?;

        Ok(Resource {
            id: id.to_string(),
            revision: new_revision,
            data: record.data,
        })
    }

    /// Runs a path-encoded search over every resource of `resource_type`.
    pub fn search(&self, resource_type: &str, search_path: &str) -> Result<Vec<Value>> {
        if !self.schemas.has(resource_type) {
            return Err(StoreError::ResourceTypeNotFound(resource_type.to_string()));
        }
        let query = parser::parse(search_path)?;
        let prefix = encode_resource_prefix(resource_type);
        let mut rows = Vec::new();
        for (key, value) in self.storage.iter_prefix(CF_RESOURCES, &prefix)? {
            let id = std::str::from_utf8(&key[prefix.len()..])
                .map_err(|e| StoreError::Internal(e.to_string()))?;
            let record: StoredRecord = serde_json::from_slice(&value)?;
            if compiler::matches(&record.data, &query) {
                let projected = compiler::project(&record.data, id, &record.revision, &query);
                rows.push((record.data, projected));
            }
        }
        Ok(compiler::sort_and_page(rows, &query))
    }

    fn all_listeners(&self, resource_type: &str) -> Result<Vec<Listener>> {
        let prefix = encode_resource_prefix(LISTENER_TYPE);
        let mut out = Vec::new();
        for (key, value) in self.storage.iter_prefix(CF_RESOURCES, &prefix)? {
            let id = std::str::from_utf8(&key[prefix.len()..])
                .map_err(|e| StoreError::Internal(e.to_string()))?
                .to_string();
            let record: StoredRecord = serde_json::from_slice(&value)?;
            let listener = listener_from_record(id, record)?;
            if listener.listen_on_type == resource_type {
                out.push(listener);
            }
        }
        Ok(out)
    }

    pub fn list_listeners(&self, resource_type: &str) -> Result<Vec<String>> {
        Ok(self
            .all_listeners(resource_type)?
            .into_iter()
            .map(|l| l.id)
            .collect())
    }

    pub fn create_listener(&self, resource_type: &str, data: Value) -> Result<Listener> {
        let mut data = data;
        data["listen_on_type"] = Value::String(resource_type.to_string());
        let resource = self.create(LISTENER_TYPE, data)?;
        listener_from_record(
            resource.id,
            StoredRecord {
                revision: resource.revision,
                data: resource.data,
                subpaths: HashMap::new(),
            },
        )
    }

    pub fn get_listener(&self, resource_type: &str, listener_id: &str) -> Result<Listener> {
        let resource = self.get(LISTENER_TYPE, listener_id)?;
        let listener = listener_from_record(
            resource.id,
            StoredRecord {
                revision: resource.revision,
                data: resource.data,
                subpaths: HashMap::new(),
            },
        )?;
        if listener.listen_on_type != resource_type {
            return Err(StoreError::ResourceNotFound {
                resource_type: resource_type.to_string(),
                id: listener_id.to_string(),
            });
        }
        Ok(listener)
    }

    pub fn put_listener(
        &self,
        resource_type: &str,
        listener_id: &str,
        mut data: Value,
        expected_revision: &str,
    ) -> Result<Listener> {
        self.get_listener(resource_type, listener_id)?;
        data["listen_on_type"] = Value::String(resource_type.to_string());
        let resource = self.put(LISTENER_TYPE, listener_id, data, expected_revision)?;
        listener_from_record(
            resource.id,
            StoredRecord {
                revision: resource.revision,
                data: resource.data,
                subpaths: HashMap::new(),
            },
        )
    }

    pub fn delete_listener(
        &self,
        resource_type: &str,
        listener_id: &str,
        expected_revision: &str,
    ) -> Result<()> {
        self.get_listener(resource_type, listener_id)?;
        self.delete(LISTENER_TYPE, listener_id, expected_revision)
    }

    /// Lists the change ids still pending acknowledgement for `listener_id`.
    pub fn list_notifications(&self, resource_type: &str, listener_id: &str) -> Result<Vec<String>> {
        self.get_listener(resource_type, listener_id)?;
        let prefix = encode_resource_prefix(resource_type);
        let mut out = Vec::new();
        for (_, value) in self.storage.iter_prefix(CF_CHANGES, &prefix)? {
            let change: Change = serde_json::from_slice(&value)?;
            if change.listeners.iter().any(|id| id == listener_id) {
                out.push(change.id);
            }
        }
        Ok(out)
    }

    pub fn get_notification(
        &self,
        resource_type: &str,
        listener_id: &str,
        notification_id: &str,
    ) -> Result<Change> {
        self.get_listener(resource_type, listener_id)?;
        let change = self
            .find_change(resource_type, notification_id)?
            .ok_or_else(|| StoreError::ResourceNotFound {
                resource_type: format!("{resource_type}/listeners/{listener_id}/notifications"),
                id: notification_id.to_string(),
            })?;
        if !change.listeners.iter().any(|id| id == listener_id) {
            return Err(StoreError::ResourceNotFound {
                resource_type: format!("{resource_type}/listeners/{listener_id}/notifications"),
                id: notification_id.to_string(),
            });
        }
        Ok(change)
    }

    /// Acknowledges a notification: removes `listener_id` from the change's
    /// listener set. The change row itself is never deleted.
    pub fn delete_notification(
        &self,
        resource_type: &str,
        listener_id: &str,
        notification_id: &str,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().expect("write lock poisoned");
        let mut change = self.get_notification(resource_type, listener_id, notification_id)?;
        change.listeners.retain(|id| id != listener_id);
        let key = self
            .find_change_key(resource_type, notification_id)?
            .ok_or_else(|| StoreError::Internal("change disappeared mid-update".to_string()))?;
        self.storage
            .put(CF_CHANGES, &key, &serde_json::to_vec(&change)?)?;
        Ok(())
    }

    fn find_change(&self, resource_type: &str, change_id: &str) -> Result<Option<Change>> {
        let prefix = encode_resource_prefix(resource_type);
        for (_, value) in self.storage.iter_prefix(CF_CHANGES, &prefix)? {
            let change: Change = serde_json::from_slice(&value)?;
            if change.id == change_id {
                return Ok(Some(change));
            }
        }
        Ok(None)
    }

    fn find_change_key(&self, resource_type: &str, change_id: &str) -> Result<Option<Vec<u8>>> {
        let prefix = encode_resource_prefix(resource_type);
        for (key, value) in self.storage.iter_prefix(CF_CHANGES, &prefix)? {
            let change: Change = serde_json::from_slice(&value)?;
            if change.id == change_id {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }
}

fn listener_from_record(id: String, record: StoredRecord) -> Result<Listener> {
    #[derive(serde::Deserialize)]
    struct ListenerFields {
        listen_on_type: String,
        #[serde(default)]
        notify_of_new: Option<bool>,
        #[serde(default)]
        notify_on_all: bool,
        #[serde(default)]
        listen_on: Vec<String>,
    }
    let fields: ListenerFields = serde_json::from_value(record.data)?;
    Ok(Listener {
        id,
        revision: record.revision,
        listen_on_type: fields.listen_on_type,
        notify_of_new: fields.notify_of_new,
        notify_on_all: fields.notify_on_all,
        listen_on: fields.listen_on,
    })
}

fn builtin_listener_schema() -> ResourceTypeSchema {
    ResourceTypeSchema {
        resource_type: LISTENER_TYPE.to_string(),
        path: "/listeners".to_string(),
        prototype: serde_json::json!({
            "listen_on_type": "",
            "notify_of_new": false,
            "notify_on_all": false,
            "listen_on": [""],
        }),
        subpaths: HashMap::new(),
        files: vec![],
    }
}
