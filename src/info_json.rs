//! Purpose: JSON envelope for `ipsetctl list`.
//! Exports: `info_json`.
//! Invariants: Stable key names; `type` is null when the caller did not name the set type.

use ipsetctl::api::{Info, SetType};
use serde_json::{Map, Value, json};

pub(crate) fn info_json(info: &Info) -> Value {
    let mut map = Map::new();
    map.insert("name".to_string(), json!(info.name));
    map.insert("type".to_string(), json!(info.set_type.map(SetType::as_str)));
    map.insert("revision".to_string(), json!(info.revision));
    map.insert("header".to_string(), json!(info.header));
    map.insert("size_in_memory".to_string(), json!(info.size_in_memory));
    map.insert("references".to_string(), json!(info.references));
    map.insert("entry_count".to_string(), json!(info.entries.len()));
    map.insert("entries".to_string(), json!(info.entries));
    Value::Object(map)
}
