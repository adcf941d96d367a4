use crate::merge::{merge, ConflictHandler};
use crate::namespace::Namespace;
use serde_json::{Map, Value};
use std::ops::{Deref, DerefMut};

/// the reserved top level key holding the scratch record during a transformation.
pub const SCRATCH_KEY: &str = "temp";

/// Output is the record being built by a single transformation.
///
/// It owns a scratch record under `SCRATCH_KEY` for carrying state between rules and the finish
/// hook. The scratch record exists from before `_onStart` until `_onFinish` returns and never
/// makes it into the transformation's result.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    record: Map<String, Value>,
}

impl Output {
    pub(crate) fn new() -> Self {
        let mut record = Map::new();
        record.insert(SCRATCH_KEY.to_string(), Value::Object(Map::new()));
        Output { record }
    }

    pub fn scratch(&self) -> Option<&Map<String, Value>> {
        self.record.get(SCRATCH_KEY).and_then(Value::as_object)
    }

    /// mutable access to the scratch record, recreating it should a rule have replaced it.
    pub fn scratch_mut(&mut self) -> &mut Map<String, Value> {
        let scratch = self
            .record
            .entry(SCRATCH_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        as_record(scratch)
    }

    /// deep merges `value` into the record at the namespace's location.
    pub fn merge_at(&mut self, namespace: &Namespace, value: Value, handler: &dyn ConflictHandler) {
        let (root, fragment) = namespace.fragment(value);
        let existing = self.record.remove(&root);
        let merged = merge(existing, fragment, handler);
        self.record.insert(root, merged);
    }

    /// strips the scratch record and hands back the finished record.
    pub(crate) fn finish(mut self) -> Map<String, Value> {
        self.record.remove(SCRATCH_KEY);
        self.record
    }
}

/// replaces anything that is not a record with an empty one.
fn as_record(value: &mut Value) -> &mut Map<String, Value> {
    match value {
        Value::Object(m) => m,
        other => {
            *other = Value::Object(Map::new());
            as_record(other)
        }
    }
}

impl Deref for Output {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

impl DerefMut for Output {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.record
    }
}
