use serde_json::{Map, Value as JsonValue, json};

use super::RenderError;
use crate::snapshot::UserDataSnapshot;

/// `{ tenant_id, user_id, generated_at, data: { section: [ {field: value} ] } }`
pub fn render(snapshot: &UserDataSnapshot) -> Result<Vec<u8>, RenderError> {
    let mut data = Map::new();
    for section in &snapshot.sections {
        let records: Vec<JsonValue> = section
            .records
            .iter()
            .map(|r| JsonValue::Object(r.fields.iter().cloned().collect()))
            .collect();
        data.insert(section.name.clone(), JsonValue::Array(records));
    }

    let doc = json!({
        "tenant_id": snapshot.tenant_id,
        "user_id": snapshot.user_id,
        "generated_at": snapshot.generated_at,
        "data": data,
    });
    Ok(serde_json::to_vec_pretty(&doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{SnapshotRecord, SnapshotSection};
    use bazaar_core::{TenantId, UserId};
    use chrono::Utc;

    #[test]
    fn sections_become_keyed_arrays() {
        let user = UserId::new();
        let snap = UserDataSnapshot::new(TenantId::new(), user, Utc::now()).with_section(
            SnapshotSection::new(
                "profile",
                vec![SnapshotRecord::new().field("email", "a@example.com")],
            ),
        );
        let bytes = render(&snap).unwrap();
        let v: JsonValue = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["user_id"], JsonValue::String(user.to_string()));
        assert_eq!(v["data"]["profile"][0]["email"], "a@example.com");
    }
}
