use chrono::Utc;
use serde_json::Value;

use crate::{
    constants::LOCAL_EDUCATION_KEY,
    entities::education::{EducationPayload, EducationRecord, RecordId},
    storage::key_value::KeyValueStorage,
};

/// Best-effort education list kept in key-value storage as one JSON array.
///
/// Read failures look like an empty list and write failures are logged and
/// dropped, so nothing here can fail a save. Read-modify-write is not atomic
/// across processes sharing the same storage.
#[derive(Debug, Clone)]
pub struct LocalEducationStore<S>
where
    S: KeyValueStorage,
{
    storage: S,
    key: String,
}

impl<S> LocalEducationStore<S>
where
    S: KeyValueStorage,
{
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, LOCAL_EDUCATION_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        LocalEducationStore { storage, key: key.into() }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// All cached records, newest first.
    pub fn read_all(&self) -> Vec<EducationRecord> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Local education cache unreadable: {}", e);
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Local education cache is corrupt, treating as empty: {}", e);
            Vec::new()
        })
    }

    fn write_all(&self, records: &[EducationRecord]) {
        let raw = match serde_json::to_string(records) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Could not encode local education cache: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.key, &raw) {
            tracing::warn!("Local education cache not saved: {}", e);
        }
    }

    pub fn find_by_id(&self, id: &RecordId) -> Option<EducationRecord> {
        self.read_all().into_iter().find(|r| r.has_id(id))
    }

    /// Prepends a record built from `payload`. Without an explicit id one is
    /// generated from the current time in milliseconds.
    pub fn insert(&self, payload: &EducationPayload, id: Option<RecordId>) -> EducationRecord {
        let mut records = self.read_all();
        let id = id.unwrap_or_else(|| generate_id(&records));

        let mut record = merge(EducationRecord::default(), payload);
        record.id = Some(id);
        record.created_at = Some(Utc::now());

        records.insert(0, record.clone());
        self.write_all(&records);
        tracing::info!(id = ?record.id, "Education record created in local cache");
        record
    }

    /// Overlays `payload` on the record with `id`, or inserts it under `id`
    /// when no such record exists.
    pub fn upsert(&self, id: &RecordId, payload: &EducationPayload) -> EducationRecord {
        let mut records = self.read_all();
        let Some(index) = records.iter().position(|r| r.has_id(id)) else {
            return self.insert(payload, Some(id.clone()));
        };

        let mut updated = merge(records[index].clone(), payload);
        updated.updated_at = Some(Utc::now());
        records[index] = updated.clone();
        self.write_all(&records);
        tracing::info!(%id, "Education record updated in local cache");
        updated
    }
}

fn generate_id(records: &[EducationRecord]) -> RecordId {
    let mut millis = Utc::now().timestamp_millis();
    loop {
        let candidate = RecordId::Text(millis.to_string());
        if !records.iter().any(|r| r.has_id(&candidate)) {
            return candidate;
        }
        millis += 1;
    }
}

/// `{ ...existing, ...payload }` on the JSON level, so keys unknown to either
/// side survive.
fn merge(existing: EducationRecord, payload: &EducationPayload) -> EducationRecord {
    let base = serde_json::to_value(&existing).ok();
    let overlay = serde_json::to_value(payload).ok();

    match (base, overlay) {
        (Some(Value::Object(mut base)), Some(Value::Object(overlay))) => {
            base.extend(overlay);
            serde_json::from_value(Value::Object(base)).unwrap_or(existing)
        }
        _ => existing,
    }
}
