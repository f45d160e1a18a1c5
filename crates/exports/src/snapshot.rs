use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;

use bazaar_core::{TenantId, UserId};

/// One flat record: ordered `(field, value)` pairs.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SnapshotRecord {
    pub fields: Vec<(String, JsonValue)>,
}

impl SnapshotRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Flatten any serializable value into a record.
    ///
    /// Top-level object keys become fields. Nested objects and arrays are kept
    /// as JSON values; scalars that are not objects become a single `value`
    /// field.
    pub fn from_serializable<T: Serialize>(item: &T) -> Result<Self, serde_json::Error> {
        let value = serde_json::to_value(item)?;
        let fields = match value {
            JsonValue::Object(map) => map.into_iter().collect(),
            other => vec![("value".to_string(), other)],
        };
        Ok(Self { fields })
    }
}

/// A named group of records (e.g. "orders").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotSection {
    pub name: String,
    pub records: Vec<SnapshotRecord>,
}

impl SnapshotSection {
    pub fn new(name: impl Into<String>, records: Vec<SnapshotRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    pub fn from_items<T: Serialize>(name: impl Into<String>, items: &[T]) -> Result<Self, serde_json::Error> {
        let records = items
            .iter()
            .map(SnapshotRecord::from_serializable)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(name, records))
    }
}

/// Everything the marketplace holds about one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDataSnapshot {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<SnapshotSection>,
}

impl UserDataSnapshot {
    pub fn new(tenant_id: TenantId, user_id: UserId, generated_at: DateTime<Utc>) -> Self {
        Self {
            tenant_id,
            user_id,
            generated_at,
            sections: Vec::new(),
        }
    }

    pub fn with_section(mut self, section: SnapshotSection) -> Self {
        self.sections.push(section);
        self
    }

    pub fn section(&self, name: &str) -> Option<&SnapshotSection> {
        self.sections.iter().find(|s| s.name == name)
    }
}
