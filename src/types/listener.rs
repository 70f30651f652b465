//! Listener and change-log data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A listener is itself a resource, of the built-in type `"listener"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listener {
    pub id: String,
    pub revision: String,

    /// Resource type this listener watches, e.g. `"person"`.
    pub listen_on_type: String,

    /// Fan out on every newly created resource of `listen_on_type`.
    #[serde(default)]
    pub notify_of_new: Option<bool>,

    /// Fan out on every create/update/delete of `listen_on_type`, subject to
    /// the `notify_of_new` override on create (see the listener engine).
    #[serde(default)]
    pub notify_on_all: bool,

    /// Explicit set of resource ids this listener also watches for
    /// update/delete, regardless of `notify_on_all`.
    #[serde(default)]
    pub listen_on: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
}

/// An append-only change-log record. `listeners` starts as the set of
/// listener ids selected by the fan-out rule at commit time, and only ever
/// shrinks as listeners acknowledge the notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
    pub id: String,
    pub resource_type: String,
    pub resource_id: String,
    /// `None` for deletions — the revision a deleted resource held is no
    /// longer meaningful once it's gone.
    pub resource_revision: Option<String>,
    pub change_type: ChangeType,
    pub timestamp: DateTime<Utc>,
    pub listeners: Vec<String>,
    pub data: Value,
}
