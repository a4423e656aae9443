//! In-memory fake state client used by planner/executor tests instead of a
//! real Konnect endpoint (§4.F).

use std::collections::BTreeMap;
use std::sync::Mutex;

use kongctl_definitions::ResourceType;

use crate::error::execution;
use crate::state::{Create, Delete, Fetch, List, RemoteObject, Update};
use crate::Result;

#[derive(Default)]
pub struct MemoryStateClient {
    objects: Mutex<BTreeMap<(ResourceType, String), RemoteObject>>,
    next_id: Mutex<u64>,
}

impl MemoryStateClient {
    pub fn new() -> Self {
        MemoryStateClient {
            objects: Mutex::new(BTreeMap::new()),
            next_id: Mutex::new(1),
        }
    }

    /// Test helper: seeds the fake with an already-existing remote object.
    pub fn seed(&self, kind: ResourceType, object: RemoteObject) {
        self.objects.lock().expect("memory state poisoned").insert((kind, object.id.clone()), object);
    }

    fn allocate_id(&self) -> String {
        let mut n = self.next_id.lock().expect("memory state poisoned");
        let id = format!("mem-{}", *n);
        *n += 1;
        id
    }
}

impl List for MemoryStateClient {
    fn list(&self, kind: ResourceType, parent_id: Option<&str>) -> Result<Vec<RemoteObject>> {
        let objects = self.objects.lock().expect("memory state poisoned");
        Ok(objects
            .iter()
            .filter(|((k, _), obj)| {
                *k == kind
                    && parent_id
                        .map(|p| obj.fields.get("parent_id").and_then(|v| v.as_str()) == Some(p))
                        .unwrap_or(true)
            })
            .map(|(_, obj)| obj.clone())
            .collect())
    }
}

impl Fetch for MemoryStateClient {
    fn fetch(&self, kind: ResourceType, id: &str) -> Result<Option<RemoteObject>> {
        let objects = self.objects.lock().expect("memory state poisoned");
        Ok(objects.get(&(kind, id.to_string())).cloned())
    }
}

/// Reads back the `labels` object a create/update call carried, the same
/// way `HttpStateClient::to_remote_object` reads it off a real API response.
fn labels_from_fields(fields: &serde_json::Map<String, serde_json::Value>) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    if let Some(l) = fields.get("labels").and_then(|v| v.as_object()) {
        for (k, v) in l {
            if let Some(s) = v.as_str() {
                labels.insert(k.clone(), s.to_string());
            }
        }
    }
    labels
}

impl Create for MemoryStateClient {
    fn create(&self, kind: ResourceType, parent_id: Option<&str>, mut fields: serde_json::Map<String, serde_json::Value>) -> Result<RemoteObject> {
        let id = self.allocate_id();
        if let Some(p) = parent_id {
            fields.insert("parent_id".to_string(), serde_json::Value::String(p.to_string()));
        }
        fields.insert("id".to_string(), serde_json::Value::String(id.clone()));
        let labels = labels_from_fields(&fields);
        let ref_ = labels.get("ref").cloned();
        let object = RemoteObject { id: id.clone(), ref_, labels, fields };
        self.objects.lock().expect("memory state poisoned").insert((kind, id), object.clone());
        Ok(object)
    }
}

impl Update for MemoryStateClient {
    fn update(&self, kind: ResourceType, id: &str, fields: serde_json::Map<String, serde_json::Value>) -> Result<RemoteObject> {
        let mut objects = self.objects.lock().expect("memory state poisoned");
        let key = (kind, id.to_string());
        let object = objects.get_mut(&key).ok_or_else(|| execution(format!("no such {} '{}' in memory state", kind, id)))?;
        for (k, v) in fields {
            object.fields.insert(k, v);
        }
        let labels = labels_from_fields(&object.fields);
        if let Some(r) = labels.get("ref") {
            object.ref_ = Some(r.clone());
        }
        object.labels = labels;
        Ok(object.clone())
    }
}

impl Delete for MemoryStateClient {
    fn delete(&self, kind: ResourceType, id: &str) -> Result<()> {
        self.objects.lock().expect("memory state poisoned").remove(&(kind, id.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_fetch_round_trips() {
        let client = MemoryStateClient::new();
        let mut fields = serde_json::Map::new();
        fields.insert("name".to_string(), serde_json::Value::String("svc1".to_string()));
        let created = client.create(ResourceType::GatewayService, Some("cp1"), fields).unwrap();
        let fetched = client.fetch(ResourceType::GatewayService, &created.id).unwrap().unwrap();
        assert_eq!(fetched.fields.get("name").unwrap(), "svc1");
        assert_eq!(fetched.fields.get("parent_id").unwrap(), "cp1");
    }

    #[test]
    fn list_filters_by_parent() {
        let client = MemoryStateClient::new();
        let mut f1 = serde_json::Map::new();
        f1.insert("name".to_string(), serde_json::Value::String("a".to_string()));
        client.create(ResourceType::GatewayService, Some("cp1"), f1).unwrap();
        let mut f2 = serde_json::Map::new();
        f2.insert("name".to_string(), serde_json::Value::String("b".to_string()));
        client.create(ResourceType::GatewayService, Some("cp2"), f2).unwrap();

        let under_cp1 = client.list(ResourceType::GatewayService, Some("cp1")).unwrap();
        assert_eq!(under_cp1.len(), 1);
        assert_eq!(under_cp1[0].fields.get("name").unwrap(), "a");
    }

    #[test]
    fn delete_removes_object() {
        let client = MemoryStateClient::new();
        let created = client.create(ResourceType::Portal, None, serde_json::Map::new()).unwrap();
        client.delete(ResourceType::Portal, &created.id).unwrap();
        assert!(client.fetch(ResourceType::Portal, &created.id).unwrap().is_none());
    }
}
