//! Create/update/noop classification (§4.G.2): server-owned fields never
//! participate in the diff, so a round trip through the API never shows a
//! spurious update.

use super::Action;
use crate::state::RemoteObject;

const SERVER_OWNED_FIELDS: &[&str] = &["id", "created_at", "updated_at", "parent_id", "labels"];

pub fn classify(desired_fields: &serde_json::Map<String, serde_json::Value>, remote: Option<&RemoteObject>) -> (Action, serde_json::Map<String, serde_json::Value>) {
    match remote {
        None => (Action::Create, user_controllable(desired_fields)),
        Some(obj) => {
            let mut diff = serde_json::Map::new();
            for (k, v) in user_controllable(desired_fields) {
                if obj.fields.get(&k) != Some(&v) {
                    diff.insert(k, v);
                }
            }
            if diff.is_empty() {
                (Action::Noop, diff)
            } else {
                (Action::Update, diff)
            }
        }
    }
}

fn user_controllable(fields: &serde_json::Map<String, serde_json::Value>) -> serde_json::Map<String, serde_json::Value> {
    fields
        .iter()
        .filter(|(k, _)| !SERVER_OWNED_FIELDS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_when_no_remote_object() {
        let mut fields = serde_json::Map::new();
        fields.insert("name".to_string(), serde_json::Value::String("svc".to_string()));
        let (action, diff) = classify(&fields, None);
        assert_eq!(action, Action::Create);
        assert_eq!(diff.get("name").unwrap(), "svc");
    }

    #[test]
    fn noop_when_fields_match() {
        let mut fields = serde_json::Map::new();
        fields.insert("name".to_string(), serde_json::Value::String("svc".to_string()));
        fields.insert("id".to_string(), serde_json::Value::String("ignored".to_string()));
        let mut remote_fields = serde_json::Map::new();
        remote_fields.insert("name".to_string(), serde_json::Value::String("svc".to_string()));
        remote_fields.insert("id".to_string(), serde_json::Value::String("real-id".to_string()));
        let remote = RemoteObject {
            id: "real-id".to_string(),
            ref_: Some("svc1".to_string()),
            labels: Default::default(),
            fields: remote_fields,
        };
        let (action, _) = classify(&fields, Some(&remote));
        assert_eq!(action, Action::Noop);
    }

    #[test]
    fn update_when_a_field_differs() {
        let mut fields = serde_json::Map::new();
        fields.insert("name".to_string(), serde_json::Value::String("new-name".to_string()));
        let mut remote_fields = serde_json::Map::new();
        remote_fields.insert("name".to_string(), serde_json::Value::String("old-name".to_string()));
        let remote = RemoteObject {
            id: "real-id".to_string(),
            ref_: Some("svc1".to_string()),
            labels: Default::default(),
            fields: remote_fields,
        };
        let (action, diff) = classify(&fields, Some(&remote));
        assert_eq!(action, Action::Update);
        assert_eq!(diff.get("name").unwrap(), "new-name");
    }
}
